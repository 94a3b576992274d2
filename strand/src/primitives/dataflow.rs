use std::fmt::Write;

use log::debug;

use crate::{BuiltinContext, BuiltinResult, Node, check};

fn wait_for(ctx: &BuiltinContext, node: &Node) -> BuiltinResult {
    match ctx.vm.deref(node) {
        Node::Variable(var) => BuiltinResult::Suspend(var),
        _ => BuiltinResult::Proceed,
    }
}

pub fn wait(ctx: &mut BuiltinContext) -> BuiltinResult {
    wait_for(ctx, &ctx.inputs[0])
}

pub fn is_det(ctx: &mut BuiltinContext) -> BuiltinResult {
    ctx.outputs[0] = Node::boolean(ctx.vm.is_determined(&ctx.inputs[0]));
    BuiltinResult::Proceed
}

/// Binds the first operand. If it is already determined the two values
/// must be equal.
pub fn bind(ctx: &mut BuiltinContext) -> BuiltinResult {
    let (target, value) = (&ctx.inputs[0], &ctx.inputs[1]);
    match ctx.vm.deref(target) {
        Node::Variable(var) => match ctx.vm.bind(var, value.clone()) {
            Ok(()) => BuiltinResult::Proceed,
            Err(err) => unreachable!("deref returned a bound variable: {err}"),
        },
        current => {
            // comparing against an unbound value would have to unify
            check!(wait_for(ctx, value));
            if ctx.vm.equals(&current, value) {
                BuiltinResult::Proceed
            } else {
                BuiltinResult::Raise(ctx.vm.kernel_error("failure", vec![current, value.clone()]))
            }
        }
    }
}

pub fn show(ctx: &mut BuiltinContext) -> BuiltinResult {
    let text = ctx.vm.repr(&ctx.inputs[0]).to_string();
    debug!("thread {:?} shows {text}", ctx.thread);
    let out = ctx.vm.output_mut();
    // writing into a String cannot fail
    let _ = writeln!(out, "{text}");
    BuiltinResult::Proceed
}
