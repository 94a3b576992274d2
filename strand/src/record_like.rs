use crate::{BuiltinResult, Node, Vm, raise_type_error};

/// Uniform feature access over records and the literals that act as
/// zero-width records.
///
/// Every operation writes its output into `result` and only touches it
/// when it returns [`BuiltinResult::Proceed`].
pub trait RecordLike {
    fn label(&self, vm: &mut Vm, result: &mut Node) -> BuiltinResult;

    fn width(&self, vm: &mut Vm, result: &mut Node) -> BuiltinResult;

    /// `feature` may be any value, including an unbound variable.
    fn dot(&self, vm: &mut Vm, feature: &Node, result: &mut Node) -> BuiltinResult;

    /// Fast path for a feature that is already a resolved integer. Never
    /// suspends.
    fn dot_number(&self, vm: &mut Vm, feature: i64, result: &mut Node) -> BuiltinResult;

    fn wait_or(&self, vm: &mut Vm, result: &mut Node) -> BuiltinResult;
}

// The receiver is cloned out of the node so the implementation may borrow
// the VM mutably; all record-like payloads are cheap to clone.
fn dispatch(
    vm: &mut Vm,
    value: &Node,
    op: impl FnOnce(&dyn RecordLike, &mut Vm) -> BuiltinResult,
) -> BuiltinResult {
    let receiver = vm.deref(value);
    if let Node::Variable(var) = receiver {
        return BuiltinResult::Suspend(var);
    }
    match receiver.as_record_like() {
        Some(record_like) => op(record_like, vm),
        None => raise_type_error(vm, "Record", receiver.clone()),
    }
}

pub fn label(vm: &mut Vm, value: &Node, result: &mut Node) -> BuiltinResult {
    dispatch(vm, value, |receiver, vm| receiver.label(vm, result))
}

pub fn width(vm: &mut Vm, value: &Node, result: &mut Node) -> BuiltinResult {
    dispatch(vm, value, |receiver, vm| receiver.width(vm, result))
}

pub fn dot(vm: &mut Vm, value: &Node, feature: &Node, result: &mut Node) -> BuiltinResult {
    dispatch(vm, value, |receiver, vm| receiver.dot(vm, feature, result))
}

pub fn dot_number(vm: &mut Vm, value: &Node, feature: i64, result: &mut Node) -> BuiltinResult {
    dispatch(vm, value, |receiver, vm| receiver.dot_number(vm, feature, result))
}

pub fn wait_or(vm: &mut Vm, value: &Node, result: &mut Node) -> BuiltinResult {
    dispatch(vm, value, |receiver, vm| receiver.wait_or(vm, result))
}
