use std::fmt;

use bitflags::bitflags;

use crate::{Kind, Vm};

/// Whether a payload may be duplicated bitwise or needs kind-specific copying.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CopyPolicy {
    Copiable,
    Transient,
}

/// Where the canonical data of a kind lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Storage {
    /// the payload is the value itself
    Inline,
    /// the payload points at data owned by the atom table or the heap
    Boxed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// equality, hashing and printing derive from the kind's own `equals`
    Value,
    /// compared field by field
    Structural,
    /// a dataflow variable, never compared until bound
    Variable,
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct KindFlags: u8 {
        const COPIABLE = 1 << 0;
        const BOXED = 1 << 1;
        const VALUE_BEHAVIOR = 1 << 2;
        const STRUCTURAL_BEHAVIOR = 1 << 3;
        const VARIABLE_BEHAVIOR = 1 << 4;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub copy: CopyPolicy,
    pub storage: Storage,
    pub behavior: Behavior,
}

impl Capabilities {
    pub const fn new(copy: CopyPolicy, storage: Storage, behavior: Behavior) -> Self {
        Self {
            copy,
            storage,
            behavior,
        }
    }

    pub const fn is_copiable(self) -> bool {
        matches!(self.copy, CopyPolicy::Copiable)
    }

    pub const fn has_value_behavior(self) -> bool {
        matches!(self.behavior, Behavior::Value)
    }

    /// The payload is the whole value: copying it copies the value.
    pub const fn copies_bitwise(self) -> bool {
        self.is_copiable() && matches!(self.storage, Storage::Inline)
    }

    pub fn flags(self) -> KindFlags {
        let mut flags = KindFlags::empty();
        if self.is_copiable() {
            flags.insert(KindFlags::COPIABLE);
        }
        if self.storage == Storage::Boxed {
            flags.insert(KindFlags::BOXED);
        }
        flags.insert(match self.behavior {
            Behavior::Value => KindFlags::VALUE_BEHAVIOR,
            Behavior::Structural => KindFlags::STRUCTURAL_BEHAVIOR,
            Behavior::Variable => KindFlags::VARIABLE_BEHAVIOR,
        });
        flags
    }
}

/// The adapter between one kind's stored payload and the generic protocols.
///
/// Capabilities are associated constants, so they are fixed per kind and
/// never looked up at runtime.
pub trait Implementation {
    type Payload<'a>
    where
        Self: 'a;

    const KIND: Kind;
    const CAPABILITIES: Capabilities;

    fn value(&self) -> Self::Payload<'_>;

    fn equals(&self, vm: &Vm, right: &Self) -> bool;

    /// `depth` bounds how many levels of nested values are printed.
    fn print_repr(&self, vm: &Vm, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result;
}
