use std::sync::Arc;

use crate::{
    BuiltinContext, BuiltinIndex, BuiltinResult, Node, VarRef, Vm, VmResult, builtin_index,
    get_builtin,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u64);

#[derive(Debug, Clone)]
pub enum ThreadState {
    Runnable,
    /// parked as a listener on this variable
    Waiting(VarRef),
    Terminated,
    /// an uncaught exception value
    Failed(Node),
}

#[derive(Debug, Clone)]
pub enum Instruction {
    /// Calls a builtin with operands read from `inputs` and writes its
    /// results to `outputs`. Registers are only written on `Proceed`.
    Call {
        builtin: BuiltinIndex,
        inputs: Box<[usize]>,
        outputs: Box<[usize]>,
    },
}

impl Instruction {
    pub fn call(name: &str, inputs: &[usize], outputs: &[usize]) -> VmResult<Self> {
        Ok(Instruction::Call {
            builtin: builtin_index(name)?,
            inputs: inputs.into(),
            outputs: outputs.into(),
        })
    }
}

/// A lightweight language-level thread: a register file and a straight
/// line of instructions.
#[derive(Debug)]
pub struct Thread {
    id: ThreadId,
    pub(crate) state: ThreadState,
    registers: Vec<Node>,
    code: Arc<[Instruction]>,
    pc: usize,
}

impl Thread {
    pub(crate) fn new(id: ThreadId, code: Arc<[Instruction]>, registers: Vec<Node>) -> Self {
        Self {
            id,
            state: ThreadState::Runnable,
            registers,
            code,
            pc: 0,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn state(&self) -> &ThreadState {
        &self.state
    }

    pub fn registers(&self) -> &[Node] {
        &self.registers
    }

    pub fn register(&self, index: usize) -> Option<&Node> {
        self.registers.get(index)
    }

    pub(crate) fn registers_mut(&mut self) -> &mut [Node] {
        &mut self.registers
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn is_finished(&self) -> bool {
        self.pc >= self.code.len()
    }

    /// Runs the instruction at `pc`. On anything but `Proceed` the pc stays
    /// put, so the same instruction is retried once the thread runs again.
    pub(crate) fn step(&mut self, vm: &mut Vm) -> BuiltinResult {
        let Some(Instruction::Call {
            builtin,
            inputs,
            outputs,
        }) = self.code.get(self.pc)
        else {
            return BuiltinResult::Proceed;
        };
        let builtin = get_builtin(*builtin);

        let operands: Vec<Node> = inputs.iter().map(|&r| self.registers[r].clone()).collect();
        let mut results = vec![Node::default(); outputs.len()];
        let mut ctx = BuiltinContext {
            vm,
            thread: self.id,
            inputs: &operands,
            outputs: &mut results,
        };
        let result = (builtin.function)(&mut ctx);

        if result.is_proceed() {
            for (&register, value) in outputs.iter().zip(results) {
                self.registers[register] = value;
            }
            self.pc += 1;
        }
        result
    }
}
