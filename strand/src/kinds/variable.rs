use std::fmt;

use crate::{
    Behavior, Capabilities, CopyPolicy, Gc, Implementation, Kind, Listener, Node, Relocate,
    Storage, VarCell, VarRef, Vm,
};

impl Implementation for VarRef {
    type Payload<'a> = VarRef;

    const KIND: Kind = Kind::Variable;
    const CAPABILITIES: Capabilities =
        Capabilities::new(CopyPolicy::Transient, Storage::Boxed, Behavior::Variable);

    // the cell lives in the heap; read it with `Heap::variable`
    fn value(&self) -> VarRef {
        *self
    }

    fn equals(&self, _vm: &Vm, right: &Self) -> bool {
        self == right
    }

    fn print_repr(&self, vm: &Vm, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
        match vm.heap().variable(*self) {
            VarCell::Bound(value) => vm.print_node(out, value, depth),
            VarCell::Unbound { .. } => out.write_char('_'),
        }
    }
}

impl Relocate for VarRef {
    type Output = Node;

    /// Bound variables disappear: references to them are replaced by the
    /// relocated value.
    fn build(vm: &Vm, gc: &mut Gc, from: &Self) -> Node {
        match vm.heap().variable(*from) {
            VarCell::Bound(value) => gc.relocate(vm, value),
            VarCell::Unbound { listeners } => {
                if let Some(relocated) = gc.relocated_variable(*from) {
                    return relocated.into();
                }
                let target = gc.heap_mut().allocate_variable();
                gc.remember_variable(*from, target);

                // control variables that were bound meanwhile have nobody left to wake
                let relocated: Vec<Listener> = listeners
                    .iter()
                    .filter_map(|listener| match listener {
                        Listener::Thread(_) => Some(*listener),
                        Listener::Variable(control) => gc
                            .relocate(vm, &(*control).into())
                            .as_variable()
                            .map(Listener::Variable),
                    })
                    .collect();
                *gc.heap_mut().variable_mut(target) = VarCell::Unbound {
                    listeners: relocated,
                };
                target.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VMCreateInfo, VmError};

    #[test]
    fn binding_twice_fails() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let var = vm.new_variable();
        assert!(!vm.is_determined(&var.into()));
        vm.bind(var, Node::int(1)).unwrap();
        assert!(vm.is_determined(&var.into()));
        assert!(matches!(vm.bind(var, Node::int(2)), Err(VmError::AlreadyBound(_))));
    }

    #[test]
    fn chains_of_variables_dereference_to_the_value() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let first = vm.new_variable();
        let second = vm.new_variable();
        vm.bind(first, second.into()).unwrap();
        assert_eq!(vm.deref(&first.into()).as_variable(), Some(second));
        vm.bind(second, Node::int(5)).unwrap();
        assert_eq!(vm.deref(&first.into()).as_int(), Some(5));
        assert_eq!(vm.repr(&first.into()).to_string(), "5");
    }

    #[test]
    fn unbound_variables_print_as_underscore() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let var = vm.new_variable();
        assert_eq!(vm.repr(&var.into()).to_string(), "_");
    }

    #[test]
    fn relocation_short_circuits_bound_variables() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let bound = vm.new_variable();
        let value = vm.new_atom("done");
        vm.bind(bound, value).unwrap();
        let unbound = vm.new_variable();

        let mut gc = Gc::new(&vm);
        let relocated = <VarRef as Relocate>::build(&vm, &mut gc, &bound);
        let content = relocated.as_atom().map(|atom| atom.content().to_owned());
        assert_eq!(content.as_deref(), Some("done"));

        let first = <VarRef as Relocate>::build(&vm, &mut gc, &unbound);
        let second = <VarRef as Relocate>::build(&vm, &mut gc, &unbound);
        assert_eq!(first.as_variable(), second.as_variable());
        assert!(first.as_variable().is_some());
    }

    #[test]
    fn relocation_keeps_pending_control_variables() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let watched = vm.new_variable();
        let pending = vm.new_variable();
        let fired = vm.new_variable();
        vm.heap_mut().add_listener(watched, Listener::Variable(pending));
        vm.heap_mut().add_listener(watched, Listener::Variable(fired));
        vm.bind(fired, Node::unit()).unwrap();

        let mut gc = Gc::new(&vm);
        let moved = <VarRef as Relocate>::build(&vm, &mut gc, &watched)
            .as_variable()
            .unwrap();
        let pending = gc.relocated_variable(pending).unwrap();
        match gc.heap().variable(moved) {
            VarCell::Unbound { listeners } => {
                assert_eq!(listeners, &vec![Listener::Variable(pending)])
            }
            VarCell::Bound(_) => panic!("watched variable is unbound"),
        }
    }
}
