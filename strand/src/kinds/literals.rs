use std::fmt;

use crate::{Behavior, Capabilities, CopyPolicy, Implementation, Kind, Storage, Vm};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Boolean(pub bool);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Unit;

impl Implementation for Boolean {
    type Payload<'a> = bool;

    const KIND: Kind = Kind::Boolean;
    const CAPABILITIES: Capabilities =
        Capabilities::new(CopyPolicy::Copiable, Storage::Inline, Behavior::Value);

    fn value(&self) -> bool {
        self.0
    }

    fn equals(&self, _vm: &Vm, right: &Self) -> bool {
        self.0 == right.0
    }

    fn print_repr(&self, _vm: &Vm, out: &mut dyn fmt::Write, _depth: usize) -> fmt::Result {
        out.write_str(if self.0 { "true" } else { "false" })
    }
}

impl Implementation for Unit {
    type Payload<'a> = ();

    const KIND: Kind = Kind::Unit;
    const CAPABILITIES: Capabilities =
        Capabilities::new(CopyPolicy::Copiable, Storage::Inline, Behavior::Value);

    fn value(&self) {}

    fn equals(&self, _vm: &Vm, _right: &Self) -> bool {
        true
    }

    fn print_repr(&self, _vm: &Vm, out: &mut dyn fmt::Write, _depth: usize) -> fmt::Result {
        out.write_str("unit")
    }
}

literal_record_like!(Boolean);
literal_record_like!(Unit);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, VMCreateInfo, record_like};

    #[test]
    fn booleans_are_zero_width_records_labelled_by_themselves() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let value = Node::boolean(true);
        let mut result = Node::default();
        assert!(record_like::label(&mut vm, &value, &mut result).is_proceed());
        assert!(vm.equals(&result, &value));
        assert!(record_like::width(&mut vm, &value, &mut result).is_proceed());
        assert_eq!(result.as_int(), Some(0));
    }

    #[test]
    fn unit_suspends_then_raises_like_any_literal() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let value = Node::unit();
        let feature = vm.new_variable();
        let mut result = Node::default();
        let outcome = record_like::dot(&mut vm, &value, &feature.into(), &mut result);
        assert_eq!(outcome.waiting_on(), Some(feature));

        let outcome = record_like::dot(&mut vm, &value, &Node::int(1), &mut result);
        assert!(outcome.is_raise());
    }

    #[test]
    fn literals_print_as_keywords() {
        let vm = Vm::new(VMCreateInfo::default());
        assert_eq!(vm.repr(&Node::boolean(false)).to_string(), "false");
        assert_eq!(vm.repr(&Node::unit()).to_string(), "unit");
    }
}
