use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use log::{debug, trace, warn};

use crate::{
    BuiltinResult, Instruction, Listener, Node, RootProvider, Thread, ThreadId, ThreadState, Vm,
    VmError, VmResult, get_builtin,
};

#[derive(Debug, Clone, Copy)]
struct WorkItem {
    thread: ThreadId,
}

/// Ready queue and thread table of one VM.
///
/// Threads are cooperative: a thread runs until it suspends, fails,
/// finishes or uses up its quantum.
#[derive(Debug, Default)]
pub struct Scheduler {
    ready: VecDeque<WorkItem>,
    threads: HashMap<ThreadId, Thread, ahash::RandomState>,
    id_gen: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// quanta executed
    pub slices: usize,
    pub terminated: Vec<ThreadId>,
    pub waiting: Vec<ThreadId>,
    pub failed: Vec<ThreadId>,
}

impl Scheduler {
    fn next_id(&mut self) -> ThreadId {
        self.id_gen += 1;
        ThreadId(self.id_gen)
    }

    fn push(&mut self, thread: ThreadId) {
        self.ready.push_back(WorkItem { thread });
    }

    /// Reschedules the listeners of a variable that just got bound.
    pub(crate) fn wake(&mut self, listeners: Vec<ThreadId>) {
        for id in listeners {
            match self.threads.get_mut(&id) {
                Some(thread) if matches!(thread.state, ThreadState::Waiting(_)) => {
                    thread.state = ThreadState::Runnable;
                    self.ready.push_back(WorkItem { thread: id });
                }
                // killed, or already woken through another variable
                _ => trace!("ignoring stale listener {id:?}"),
            }
        }
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.get(&id)
    }
}

impl RootProvider for Scheduler {
    fn visit_roots(&mut self, visitor: &mut dyn FnMut(&mut Node)) {
        for thread in self.threads.values_mut() {
            thread.registers_mut().iter_mut().for_each(&mut *visitor);
            match &mut thread.state {
                ThreadState::Failed(exception) => visitor(exception),
                ThreadState::Waiting(var) => {
                    let mut node: Node = (*var).into();
                    visitor(&mut node);
                    thread.state = match node {
                        Node::Variable(relocated) => ThreadState::Waiting(relocated),
                        // bound without waking the thread, run it again
                        _ => {
                            self.ready.push_back(WorkItem { thread: thread.id() });
                            ThreadState::Runnable
                        }
                    };
                }
                ThreadState::Runnable | ThreadState::Terminated => {}
            }
        }
    }
}

impl Vm {
    /// Starts a thread running `code` over a register file initialized
    /// with `registers`.
    pub fn spawn(&mut self, code: Vec<Instruction>, registers: Vec<Node>) -> VmResult<ThreadId> {
        for instruction in &code {
            let Instruction::Call {
                builtin,
                inputs,
                outputs,
            } = instruction;
            let builtin = get_builtin(*builtin);
            let counts = [
                (builtin.inputs, inputs.len()),
                (builtin.outputs, outputs.len()),
            ];
            for (expected, found) in counts {
                if expected != found {
                    return Err(VmError::ArityMismatch {
                        name: builtin.name,
                        expected,
                        found,
                    });
                }
            }
            let out_of_range = inputs
                .iter()
                .chain(outputs.iter())
                .find(|&&register| register >= registers.len());
            if let Some(&register) = out_of_range {
                return Err(VmError::InvalidRegister {
                    register,
                    available: registers.len(),
                });
            }
        }

        let scheduler = self.scheduler_mut();
        let id = scheduler.next_id();
        let thread = Thread::new(id, Arc::from(code), registers);
        scheduler.threads.insert(id, thread);
        scheduler.push(id);
        debug!("spawned thread {id:?}");
        Ok(id)
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.scheduler().thread(id)
    }

    /// Abandons a thread wherever it is. Listener entries it leaves behind
    /// are skipped when the variable is bound.
    pub fn kill(&mut self, id: ThreadId) -> VmResult<()> {
        match self.scheduler_mut().threads.remove(&id) {
            Some(_) => {
                debug!("killed thread {id:?}");
                Ok(())
            }
            None => Err(VmError::UnknownThread(id)),
        }
    }

    /// Runs one quantum of the next ready thread. Returns `false` when no
    /// thread is ready.
    pub fn run_once(&mut self) -> bool {
        let Some((id, mut thread)) = self.next_runnable() else {
            return false;
        };

        for _ in 0..self.settings().quantum {
            if thread.is_finished() {
                break;
            }
            match thread.step(self) {
                BuiltinResult::Proceed => {}
                BuiltinResult::Suspend(var) => {
                    trace!("thread {id:?} suspends on {var:?}");
                    if self.heap_mut().add_listener(var, Listener::Thread(id)) {
                        thread.state = ThreadState::Waiting(var);
                        break;
                    }
                }
                BuiltinResult::Raise(exception) => {
                    warn!("thread {id:?} failed with {}", self.repr(&exception));
                    thread.state = ThreadState::Failed(exception);
                    break;
                }
            }
        }

        if thread.is_finished() && matches!(thread.state, ThreadState::Runnable) {
            trace!("thread {id:?} terminated");
            thread.state = ThreadState::Terminated;
        }
        let requeue = matches!(thread.state, ThreadState::Runnable);
        let scheduler = self.scheduler_mut();
        scheduler.threads.insert(id, thread);
        if requeue {
            scheduler.push(id);
        }

        if self.heap().needs_collection() {
            self.collect_garbage();
        }
        true
    }

    // the thread leaves the table while it runs so builtins can borrow the VM
    fn next_runnable(&mut self) -> Option<(ThreadId, Thread)> {
        let scheduler = self.scheduler_mut();
        while let Some(WorkItem { thread: id }) = scheduler.ready.pop_front() {
            match scheduler.threads.remove(&id) {
                Some(thread) if matches!(thread.state, ThreadState::Runnable) => {
                    return Some((id, thread));
                }
                Some(thread) => {
                    scheduler.threads.insert(id, thread);
                }
                None => trace!("skipping killed thread {id:?}"),
            }
        }
        None
    }

    /// Runs until no thread is ready. Threads still waiting at that point
    /// are deadlocked unless the host binds their variables.
    pub fn run_until_idle(&mut self) -> RunReport {
        let mut report = RunReport::default();
        while self.run_once() {
            report.slices += 1;
        }

        for (id, thread) in &self.scheduler().threads {
            match thread.state() {
                ThreadState::Terminated => report.terminated.push(*id),
                ThreadState::Waiting(_) => report.waiting.push(*id),
                ThreadState::Failed(_) => report.failed.push(*id),
                ThreadState::Runnable => {}
            }
        }
        report.terminated.sort();
        report.waiting.sort();
        report.failed.sort();
        debug!(
            "idle after {} slices: {} terminated, {} waiting, {} failed",
            report.slices,
            report.terminated.len(),
            report.waiting.len(),
            report.failed.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeapCreateInfo, VMCreateInfo};

    fn call(name: &str, inputs: &[usize], outputs: &[usize]) -> Instruction {
        Instruction::call(name, inputs, outputs).unwrap()
    }

    #[test]
    fn spawn_validates_operands() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let err = vm.spawn(vec![call("dot", &[0], &[1])], vec![Node::unit(); 2]);
        assert!(matches!(
            err,
            Err(VmError::ArityMismatch { name: "dot", expected: 2, found: 1 })
        ));

        let err = vm.spawn(vec![call("label", &[0], &[5])], vec![Node::unit(); 2]);
        assert!(matches!(
            err,
            Err(VmError::InvalidRegister { register: 5, available: 2 })
        ));
    }

    #[test]
    fn a_suspended_thread_resumes_after_binding() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let record_var = vm.new_variable();
        let id = vm
            .spawn(
                vec![call("width", &[0], &[1]), call("show", &[1], &[])],
                vec![record_var.into(), Node::unit()],
            )
            .unwrap();

        let report = vm.run_until_idle();
        assert_eq!(report.waiting, vec![id]);
        assert!(matches!(
            vm.thread(id).unwrap().state(),
            ThreadState::Waiting(v) if *v == record_var
        ));
        assert_eq!(vm.thread(id).unwrap().pc(), 0);

        let label = vm.new_atom("r");
        let record = vm.build_tuple(label, vec![Node::int(1), Node::int(2)]).unwrap();
        vm.bind(record_var, record).unwrap();
        let report = vm.run_until_idle();
        assert_eq!(report.terminated, vec![id]);
        assert_eq!(vm.thread(id).unwrap().register(1).and_then(Node::as_int), Some(2));
        assert_eq!(vm.output(), "2\n");
    }

    #[test]
    fn threads_communicate_through_variables() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let shared = vm.new_variable();
        let consumer = vm
            .spawn(
                vec![call("wait", &[0], &[]), call("show", &[0], &[])],
                vec![shared.into()],
            )
            .unwrap();
        let value = vm.new_atom("ping");
        let producer = vm
            .spawn(vec![call("bind", &[0, 1], &[])], vec![shared.into(), value])
            .unwrap();

        let report = vm.run_until_idle();
        assert_eq!(report.terminated, vec![consumer, producer]);
        assert!(report.waiting.is_empty());
        assert_eq!(vm.output(), "ping\n");
    }

    #[test]
    fn raising_fails_only_the_raising_thread() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let atom = vm.new_atom("foo");
        let failing = vm
            .spawn(vec![call("dot", &[0, 1], &[2])], vec![atom, Node::int(1), Node::unit()])
            .unwrap();
        let fine = vm
            .spawn(vec![call("isDet", &[0], &[0])], vec![Node::int(1)])
            .unwrap();

        let report = vm.run_until_idle();
        assert_eq!(report.failed, vec![failing]);
        assert_eq!(report.terminated, vec![fine]);
        let ThreadState::Failed(exception) = vm.thread(failing).unwrap().state().clone() else {
            panic!("thread should have failed");
        };
        assert_eq!(
            vm.kernel_error_kind(&exception).as_deref(),
            Some("illegalFieldSelection")
        );
    }

    #[test]
    fn killed_threads_are_not_woken() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let var = vm.new_variable();
        let id = vm
            .spawn(vec![call("wait", &[0], &[])], vec![var.into()])
            .unwrap();
        vm.run_until_idle();
        vm.kill(id).unwrap();
        assert!(matches!(vm.kill(id), Err(VmError::UnknownThread(_))));

        vm.bind(var, Node::int(1)).unwrap();
        let report = vm.run_until_idle();
        assert_eq!(report.slices, 0);
        assert!(vm.thread(id).is_none());
    }

    #[test]
    fn quantum_interleaves_threads() {
        let mut vm = Vm::new(VMCreateInfo {
            quantum: Some(1),
            ..Default::default()
        });
        let first = vm.new_atom("a");
        let second = vm.new_atom("b");
        let code = || vec![call("show", &[0], &[]), call("show", &[0], &[])];
        vm.spawn(code(), vec![first]).unwrap();
        vm.spawn(code(), vec![second]).unwrap();
        let report = vm.run_until_idle();
        assert_eq!(vm.output(), "a\nb\na\nb\n");
        assert_eq!(report.terminated.len(), 2);
    }

    #[test]
    fn collection_between_slices_keeps_waiting_threads_intact() {
        let mut vm = Vm::new(VMCreateInfo {
            heap: HeapCreateInfo {
                gc_threshold: Some(1),
                ..Default::default()
            },
            ..Default::default()
        });
        let var = vm.new_variable();
        let slot = vm.add_root(var.into());
        let id = vm
            .spawn(
                vec![call("wait", &[0], &[]), call("show", &[0], &[])],
                vec![var.into()],
            )
            .unwrap();
        vm.run_until_idle();

        // the variable was relocated, read it back through the root
        let var = vm.root(slot).and_then(Node::as_variable).unwrap();
        assert!(matches!(vm.thread(id).unwrap().state(), ThreadState::Waiting(v) if *v == var));
        let label = vm.new_atom("done");
        vm.bind(var, label).unwrap();
        let report = vm.run_until_idle();
        assert_eq!(report.terminated, vec![id]);
        assert_eq!(vm.output(), "done\n");
    }
}
