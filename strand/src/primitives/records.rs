use crate::{BuiltinContext, BuiltinResult, Node, raise_type_error, record_like};

pub fn label(ctx: &mut BuiltinContext) -> BuiltinResult {
    record_like::label(ctx.vm, &ctx.inputs[0], &mut ctx.outputs[0])
}

pub fn width(ctx: &mut BuiltinContext) -> BuiltinResult {
    record_like::width(ctx.vm, &ctx.inputs[0], &mut ctx.outputs[0])
}

pub fn dot(ctx: &mut BuiltinContext) -> BuiltinResult {
    record_like::dot(ctx.vm, &ctx.inputs[0], &ctx.inputs[1], &mut ctx.outputs[0])
}

// the record operand is checked first, then the feature
pub fn dot_number(ctx: &mut BuiltinContext) -> BuiltinResult {
    if let Node::Variable(var) = ctx.vm.deref(&ctx.inputs[0]) {
        return BuiltinResult::Suspend(var);
    }
    let feature = match ctx.vm.deref(&ctx.inputs[1]) {
        Node::Variable(var) => return BuiltinResult::Suspend(var),
        Node::SmallInt(int) => int.0,
        other => return raise_type_error(ctx.vm, "Int", other),
    };
    record_like::dot_number(ctx.vm, &ctx.inputs[0], feature, &mut ctx.outputs[0])
}

pub fn wait_or(ctx: &mut BuiltinContext) -> BuiltinResult {
    record_like::wait_or(ctx.vm, &ctx.inputs[0], &mut ctx.outputs[0])
}
