use std::fmt;

use crate::{Behavior, Capabilities, CopyPolicy, Implementation, Kind, Storage, Vm};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SmallInt(pub i64);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Float(pub f64);

impl Implementation for SmallInt {
    type Payload<'a> = i64;

    const KIND: Kind = Kind::SmallInt;
    const CAPABILITIES: Capabilities =
        Capabilities::new(CopyPolicy::Copiable, Storage::Inline, Behavior::Value);

    fn value(&self) -> i64 {
        self.0
    }

    fn equals(&self, _vm: &Vm, right: &Self) -> bool {
        self.0 == right.0
    }

    fn print_repr(&self, _vm: &Vm, out: &mut dyn fmt::Write, _depth: usize) -> fmt::Result {
        // negative numbers use the language's own minus sign
        if self.0 < 0 {
            write!(out, "~{}", self.0.unsigned_abs())
        } else {
            write!(out, "{}", self.0)
        }
    }
}

impl Implementation for Float {
    type Payload<'a> = f64;

    const KIND: Kind = Kind::Float;
    const CAPABILITIES: Capabilities =
        Capabilities::new(CopyPolicy::Copiable, Storage::Inline, Behavior::Value);

    fn value(&self) -> f64 {
        self.0
    }

    fn equals(&self, _vm: &Vm, right: &Self) -> bool {
        self.0 == right.0
    }

    fn print_repr(&self, _vm: &Vm, out: &mut dyn fmt::Write, _depth: usize) -> fmt::Result {
        if self.0.is_sign_negative() && !self.0.is_nan() {
            write!(out, "~{:?}", -self.0)
        } else {
            write!(out, "{:?}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, VMCreateInfo, record_like};

    #[test]
    fn numbers_print_with_tilde_for_negatives() {
        let vm = Vm::new(VMCreateInfo::default());
        assert_eq!(vm.repr(&Node::int(42)).to_string(), "42");
        assert_eq!(vm.repr(&Node::int(-42)).to_string(), "~42");
        assert_eq!(vm.repr(&Node::int(i64::MIN)).to_string(), "~9223372036854775808");
        assert_eq!(vm.repr(&Node::float(2.0)).to_string(), "2.0");
        assert_eq!(vm.repr(&Node::float(-0.5)).to_string(), "~0.5");
    }

    #[test]
    fn numbers_are_not_record_like() {
        let mut vm = Vm::new(VMCreateInfo::default());
        let mut result = Node::default();
        let outcome = record_like::width(&mut vm, &Node::int(3), &mut result);
        let exception = outcome.exception().expect("width of an integer raises").clone();
        assert_eq!(vm.kernel_error_kind(&exception).as_deref(), Some("typeError"));
    }

    #[test]
    fn equality_compares_payloads() {
        let vm = Vm::new(VMCreateInfo::default());
        assert!(SmallInt(3).equals(&vm, &SmallInt(3)));
        assert!(!Float(1.0).equals(&vm, &Float(1.5)));
        assert!(!vm.equals(&Node::int(1), &Node::float(1.0)));
    }
}
