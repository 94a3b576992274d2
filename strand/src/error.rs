use log::debug;
use thiserror::Error;

use crate::{BuiltinResult, Node, Record, ThreadId, VarRef, Vm, VmId};

/// Misuse of the host API. Failures of the language program itself are
/// exception values carried by [`BuiltinResult::Raise`].
#[derive(Debug, Error)]
pub enum VmError {
    #[error("variable {0:?} is already bound")]
    AlreadyBound(VarRef),
    #[error("value belongs to VM {found:?}, expected VM {expected:?}")]
    ForeignValue { expected: VmId, found: VmId },
    #[error("record label must be a literal, got {0}")]
    InvalidLabel(String),
    #[error("record feature must be a literal or an integer, got {0}")]
    InvalidFeature(String),
    #[error("duplicate record feature {0}")]
    DuplicateFeature(String),
    #[error("no thread with id {0:?}")]
    UnknownThread(ThreadId),
    #[error("unknown builtin `{0}`")]
    UnknownBuiltin(String),
    #[error("builtin `{name}` takes {expected} operands, got {found}")]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("register {register} out of range, thread has {available}")]
    InvalidRegister { register: usize, available: usize },
}

pub type VmResult<T> = Result<T, VmError>;

impl Vm {
    /// Builds `error(kernel(<kind> <args>...) debug:unit)`.
    pub fn kernel_error(&mut self, kind: &str, args: Vec<Node>) -> Node {
        let kernel = self.new_atom("kernel");
        let mut values = Vec::with_capacity(args.len() + 1);
        values.push(self.new_atom(kind));
        values.extend(args);
        let detail = self
            .heap_mut()
            .allocate_record(Record::tuple(kernel, values));

        let error = self.new_atom("error");
        let debug = self.new_atom("debug");
        let record = Record::from_sorted(
            error,
            vec![(Node::int(1), detail.into()), (debug, Node::unit())],
        );
        self.heap_mut().allocate_record(record).into()
    }

    /// The `<kind>` of an exception built by [`Vm::kernel_error`].
    pub fn kernel_error_kind(&self, exception: &Node) -> Option<String> {
        let outer = self.heap().record(self.deref(exception).as_record()?);
        if outer.label().as_atom()?.content() != "error" {
            return None;
        }
        let detail = self.deref(outer.lookup_number(1)?);
        let detail = self.heap().record(detail.as_record()?);
        if detail.label().as_atom()?.content() != "kernel" {
            return None;
        }
        let kind = self.deref(detail.lookup_number(1)?);
        Some(kind.as_atom()?.content().to_owned())
    }
}

/// Raises `typeError` for a value that is not of the `expected` type.
pub fn raise_type_error(vm: &mut Vm, expected: &str, value: Node) -> BuiltinResult {
    debug!(
        "typeError: expected {expected}, got {:?} {:?}",
        value.kind(),
        value.capabilities().flags()
    );
    let expected = vm.new_atom(expected);
    BuiltinResult::Raise(vm.kernel_error("typeError", vec![expected, value]))
}

pub fn raise_illegal_field_selection(vm: &mut Vm, value: Node, feature: Node) -> BuiltinResult {
    BuiltinResult::Raise(vm.kernel_error("illegalFieldSelection", vec![value, feature]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VMCreateInfo;

    #[test]
    fn kernel_errors_are_language_values() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let foo = vm.new_atom("foo");
        let exception = vm.kernel_error("illegalFieldSelection", vec![foo, Node::int(5)]);
        assert_eq!(
            vm.repr(&exception).to_string(),
            "error(kernel(illegalFieldSelection foo 5) debug:unit)"
        );
        assert_eq!(
            vm.kernel_error_kind(&exception).as_deref(),
            Some("illegalFieldSelection")
        );
    }

    #[test]
    fn other_values_have_no_kernel_kind() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let atom = vm.new_atom("error");
        assert_eq!(vm.kernel_error_kind(&atom), None);
        assert_eq!(vm.kernel_error_kind(&Node::int(1)), None);
    }

    #[test]
    fn host_errors_render_readably() {
        let err = VmError::UnknownBuiltin("frobnicate".into());
        assert_eq!(err.to_string(), "unknown builtin `frobnicate`");
    }
}
