// Literals behave as records of width zero: generic record code can handle
// them without checking the kind first.
macro_rules! literal_record_like {
    ($kind:ty) => {
        impl $crate::RecordLike for $kind {
            fn label(
                &self,
                _vm: &mut $crate::Vm,
                result: &mut $crate::Node,
            ) -> $crate::BuiltinResult {
                *result = self.clone().into();
                $crate::BuiltinResult::Proceed
            }

            fn width(
                &self,
                _vm: &mut $crate::Vm,
                result: &mut $crate::Node,
            ) -> $crate::BuiltinResult {
                *result = $crate::Node::int(0);
                $crate::BuiltinResult::Proceed
            }

            fn dot(
                &self,
                vm: &mut $crate::Vm,
                feature: &$crate::Node,
                _result: &mut $crate::Node,
            ) -> $crate::BuiltinResult {
                $crate::kinds::literal_dot(vm, self.clone().into(), feature)
            }

            fn dot_number(
                &self,
                vm: &mut $crate::Vm,
                feature: i64,
                _result: &mut $crate::Node,
            ) -> $crate::BuiltinResult {
                let feature = $crate::Node::int(feature);
                $crate::raise_illegal_field_selection(vm, self.clone().into(), feature)
            }

            fn wait_or(
                &self,
                _vm: &mut $crate::Vm,
                result: &mut $crate::Node,
            ) -> $crate::BuiltinResult {
                *result = self.clone().into();
                $crate::BuiltinResult::Proceed
            }
        }
    };
}

pub mod atom;
pub mod literals;
pub mod numbers;
pub mod record;
pub mod variable;

use crate::{BuiltinResult, Node, Vm, raise_illegal_field_selection, raise_type_error};

/// A literal has no features, but an unbound feature may still turn out to
/// be anything, so it suspends before it raises.
pub(crate) fn literal_dot(vm: &mut Vm, literal: Node, feature: &Node) -> BuiltinResult {
    let feature = vm.deref(feature);
    if let Node::Variable(var) = feature {
        return BuiltinResult::Suspend(var);
    }
    if !feature.is_feature() {
        return raise_type_error(vm, "Feature", feature);
    }
    raise_illegal_field_selection(vm, literal, feature)
}
