use strand::{
    Atom, BuiltinResult, Gc, Instruction, Node, Relocate, ThreadState, VMCreateInfo, Vm,
    record_like,
};

fn vm() -> Vm {
    Vm::new(VMCreateInfo::default())
}

fn call(name: &str, inputs: &[usize], outputs: &[usize]) -> Instruction {
    Instruction::call(name, inputs, outputs).unwrap()
}

#[test]
fn interning_is_unique_per_content() {
    let vm = vm();
    for content in ["", "a", "foo", "Foo", "with space", "ünïcödé", "'"] {
        let first = Atom::build(&vm, content);
        let second = Atom::build(&vm, content);
        assert!(first.same_identity(&second), "{content:?}");
        assert!(vm.equals(&first.clone().into(), &second.into()));
    }
    assert!(!vm.equals(&vm.new_atom("foo"), &vm.new_atom("Foo")));
}

#[test]
fn retrying_a_suspended_dot_matches_the_direct_call() {
    let mut vm = vm();
    let foo = vm.new_atom("foo");
    let feature = vm.new_variable();
    let mut result = Node::default();

    let first = record_like::dot(&mut vm, &foo, &feature.into(), &mut result);
    assert_eq!(first.waiting_on(), Some(feature));

    vm.bind(feature, Node::int(5)).unwrap();
    let retried = record_like::dot(&mut vm, &foo, &feature.into(), &mut result);
    let direct = record_like::dot(&mut vm, &foo, &Node::int(5), &mut result);

    let (BuiltinResult::Raise(retried), BuiltinResult::Raise(direct)) = (retried, direct) else {
        panic!("both calls should raise");
    };
    assert!(vm.equals(&retried, &direct));
    assert_eq!(vm.repr(&retried).to_string(), vm.repr(&direct).to_string());
    assert_eq!(
        vm.repr(&direct).to_string(),
        "error(kernel(illegalFieldSelection foo 5) debug:unit)"
    );
}

#[test]
fn the_scheduler_retries_the_same_instruction() {
    let mut vm = vm();
    let foo = vm.new_atom("foo");
    let feature = vm.new_variable();
    let id = vm
        .spawn(
            vec![call("dot", &[0, 1], &[2])],
            vec![foo, feature.into(), Node::unit()],
        )
        .unwrap();

    let report = vm.run_until_idle();
    assert_eq!(report.waiting, vec![id]);

    vm.bind(feature, Node::int(5)).unwrap();
    let report = vm.run_until_idle();
    assert_eq!(report.failed, vec![id]);
    let thread = vm.thread(id).unwrap();
    assert_eq!(thread.pc(), 0);
    let ThreadState::Failed(exception) = thread.state() else {
        panic!("thread should have failed");
    };
    assert_eq!(
        vm.kernel_error_kind(exception).as_deref(),
        Some("illegalFieldSelection")
    );
    // the output register was never written
    assert!(matches!(thread.register(2), Some(Node::Unit(_))));
}

#[test]
fn label_of_an_atom_is_the_atom() {
    let mut vm = vm();
    let bar = vm.new_atom("bar");
    let mut result = Node::default();
    assert!(record_like::label(&mut vm, &bar, &mut result).is_proceed());
    assert!(vm.equals(&result, &bar));
    assert!(result.as_atom().unwrap().same_identity(bar.as_atom().unwrap()));
}

#[test]
fn atoms_are_never_shared_between_instances() {
    let first = vm();
    let second = vm();
    let a = Atom::build(&first, "shared");
    let b = Atom::build(&second, "shared");
    assert_eq!(a.content(), b.content());
    assert!(!a.same_identity(&b));
    assert!(first.try_equals(&a.into(), &b.into()).is_err());
}

#[test]
fn relocation_preserves_the_identity_relation() {
    let vm = vm();
    let atoms: Vec<Atom> = ["x", "y", "x", "z", "y", "x"]
        .iter()
        .map(|content| Atom::build(&vm, content))
        .collect();

    let mut gc = Gc::new(&vm);
    let moved: Vec<Atom> = atoms
        .iter()
        .map(|atom| <Atom as Relocate>::build(&vm, &mut gc, atom))
        .collect();

    for (i, a) in atoms.iter().enumerate() {
        for (j, b) in atoms.iter().enumerate() {
            assert_eq!(
                a.same_identity(b),
                moved[i].same_identity(&moved[j]),
                "pair {i} {j}"
            );
        }
    }
}

#[test]
fn wait_or_picks_whichever_alternative_arrives() {
    let mut vm = vm();
    let left = vm.new_variable();
    let right = vm.new_variable();
    let label = vm.new_atom("alt");
    let alternatives = vm
        .build_tuple(label, vec![left.into(), right.into()])
        .unwrap();
    let id = vm
        .spawn(
            vec![call("waitOr", &[0], &[1]), call("show", &[1], &[])],
            vec![alternatives, Node::unit()],
        )
        .unwrap();
    vm.run_until_idle();
    assert!(matches!(vm.thread(id).unwrap().state(), ThreadState::Waiting(_)));

    vm.bind(right, Node::int(0)).unwrap();
    let report = vm.run_until_idle();
    assert_eq!(report.terminated, vec![id]);
    assert_eq!(vm.output(), "2\n");
}

#[test]
fn suspension_comes_before_failure_for_any_atom() {
    let mut vm = vm();
    for content in ["", "foo", "Bar", "two words", "it's", "ünïcödé", "case"] {
        let atom = vm.new_atom(content);
        let feature = vm.new_variable();
        let mut result = Node::default();
        let outcome = record_like::dot(&mut vm, &atom, &feature.into(), &mut result);
        assert_eq!(outcome.waiting_on(), Some(feature), "{content:?}");

        let value = vm.new_atom(content);
        vm.bind(feature, value).unwrap();
        let outcome = record_like::dot(&mut vm, &atom, &feature.into(), &mut result);
        let exception = outcome.exception().expect("atoms have no fields").clone();
        assert_eq!(
            vm.kernel_error_kind(&exception).as_deref(),
            Some("illegalFieldSelection"),
            "{content:?}"
        );
    }
}

// loop(X) with X bound to the record itself
fn cycle(vm: &mut Vm) -> Node {
    let hole = vm.new_variable();
    let label = vm.new_atom("loop");
    let record = vm.build_tuple(label, vec![hole.into()]).unwrap();
    vm.bind(hole, record.clone()).unwrap();
    record
}

#[test]
fn binding_isomorphic_cyclic_records_terminates() {
    let mut vm = vm();
    let first = cycle(&mut vm);
    let second = cycle(&mut vm);
    let target = vm.new_variable();
    vm.bind(target, first).unwrap();

    let id = vm
        .spawn(
            vec![call("bind", &[0, 1], &[]), call("show", &[0], &[])],
            vec![target.into(), second],
        )
        .unwrap();
    let report = vm.run_until_idle();
    assert_eq!(report.terminated, vec![id]);
    assert!(vm.output().starts_with("loop("));
}
