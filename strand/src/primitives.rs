use crate::{BuiltinResult, Node, ThreadId, Vm, VmError, VmResult};

mod dataflow;
mod records;

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuiltinIndex(usize);

pub type BuiltinFunction = fn(&mut BuiltinContext) -> BuiltinResult;

// operands are counted in registers
// e.g. `dot` reads the record and the feature: inputs 2, outputs 1
#[derive(Debug, Copy, Clone)]
pub struct Builtin<'a> {
    pub name: &'a str,
    pub inputs: usize,
    pub outputs: usize,
    pub function: BuiltinFunction,
}

impl<'a> Builtin<'a> {
    pub const fn new(
        name: &'a str,
        inputs: usize,
        outputs: usize,
        function: BuiltinFunction,
    ) -> Self {
        Self {
            name,
            inputs,
            outputs,
            function,
        }
    }
}

/// Everything a builtin may touch. `outputs` is copied into the thread's
/// registers only when the builtin proceeds.
pub struct BuiltinContext<'ex, 'arg> {
    pub vm: &'ex mut Vm,
    pub thread: ThreadId,
    pub inputs: &'arg [Node],
    pub outputs: &'arg mut [Node],
}

pub const BUILTINS: &[Builtin] = &[
    Builtin::new("label", 1, 1, records::label),
    Builtin::new("width", 1, 1, records::width),
    Builtin::new("dot", 2, 1, records::dot),
    Builtin::new("dotNumber", 2, 1, records::dot_number),
    Builtin::new("waitOr", 1, 1, records::wait_or),
    Builtin::new("wait", 1, 0, dataflow::wait),
    Builtin::new("isDet", 1, 1, dataflow::is_det),
    Builtin::new("bind", 2, 0, dataflow::bind),
    Builtin::new("show", 1, 0, dataflow::show),
];

pub fn builtin_index(name: &str) -> VmResult<BuiltinIndex> {
    BUILTINS
        .iter()
        .position(|builtin| builtin.name == name)
        .map(BuiltinIndex)
        .ok_or_else(|| VmError::UnknownBuiltin(name.to_owned()))
}

pub fn get_builtin(id: BuiltinIndex) -> Builtin<'static> {
    debug_assert!(id.0 < BUILTINS.len());
    BUILTINS[id.0]
}
