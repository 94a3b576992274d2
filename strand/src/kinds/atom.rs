use std::{fmt, sync::Arc};

use crate::{
    AtomImpl, Behavior, Capabilities, CopyPolicy, Gc, Implementation, Kind, Relocate, Storage, Vm,
    VmId,
};

/// An interned symbolic literal.
///
/// Cloning copies the pointer to the canonical [`AtomImpl`]; equality is
/// pointer identity.
#[derive(Clone)]
pub struct Atom(Arc<AtomImpl>);

impl Atom {
    pub(crate) fn from_canonical(value: Arc<AtomImpl>) -> Self {
        Self(value)
    }

    pub fn build(vm: &Vm, content: &str) -> Self {
        vm.atoms().get(content)
    }

    pub fn build_scalars(vm: &Vm, content: &[char]) -> Self {
        vm.atoms().get_scalars(content)
    }

    pub fn content(&self) -> &str {
        self.0.content()
    }

    pub fn owner(&self) -> VmId {
        self.0.owner()
    }

    pub fn same_identity(&self, other: &Atom) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // pointer identity, consistent with `equals`
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.content())
    }
}

impl Implementation for Atom {
    type Payload<'a> = &'a AtomImpl;

    const KIND: Kind = Kind::Atom;
    const CAPABILITIES: Capabilities =
        Capabilities::new(CopyPolicy::Copiable, Storage::Boxed, Behavior::Value);

    fn value(&self) -> &AtomImpl {
        &self.0
    }

    fn equals(&self, vm: &Vm, right: &Self) -> bool {
        debug_assert!(
            self.owner() == vm.id() && right.owner() == vm.id(),
            "comparing atoms of another VM instance"
        );
        self.same_identity(right)
    }

    fn print_repr(&self, _vm: &Vm, out: &mut dyn fmt::Write, _depth: usize) -> fmt::Result {
        crate::format::write_atom(out, self.content())
    }
}

impl Relocate for Atom {
    type Output = Atom;

    // never copy the pointer: identity only holds inside one table
    fn build(_vm: &Vm, gc: &mut Gc, from: &Self) -> Atom {
        gc.atoms().get(from.content())
    }
}

literal_record_like!(Atom);
