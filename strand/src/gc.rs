use std::{collections::HashMap, mem};

use log::debug;

use crate::{Atom, AtomTable, Heap, Node, Record, RecordRef, RootProvider, VarRef, Vm};

/// Produces the post-collection representation of a value.
///
/// Implementations do not deduplicate; the [`Gc`] memo tables guarantee a
/// heap value is relocated at most once per cycle.
pub trait Relocate {
    type Output;

    fn build(vm: &Vm, gc: &mut Gc, from: &Self) -> Self::Output;
}

/// Context of one collection: the table and heap being built, plus the
/// old → new reference maps.
#[derive(Debug)]
pub struct Gc {
    atoms: AtomTable,
    heap: Heap,
    records: HashMap<RecordRef, RecordRef, ahash::RandomState>,
    variables: HashMap<VarRef, VarRef, ahash::RandomState>,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct GcStats {
    pub atoms_before: usize,
    pub atoms_after: usize,
    pub records_before: usize,
    pub records_after: usize,
    pub variables_before: usize,
    pub variables_after: usize,
}

impl Gc {
    pub fn new(vm: &Vm) -> Self {
        Self {
            atoms: AtomTable::new(vm.id()),
            heap: Heap::new(vm.heap().settings().clone()),
            records: HashMap::default(),
            variables: HashMap::default(),
        }
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub(crate) fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn relocate(&mut self, vm: &Vm, node: &Node) -> Node {
        let capabilities = node.capabilities();
        if capabilities.copies_bitwise() {
            return node.clone();
        }
        match node {
            Node::Atom(atom) => <Atom as Relocate>::build(vm, self, atom).into(),
            Node::Record(record) => <RecordRef as Relocate>::build(vm, self, record).into(),
            Node::Variable(var) => <VarRef as Relocate>::build(vm, self, var),
            other => panic!(
                "no relocation for {:?} with {:?}",
                other.kind(),
                capabilities.flags()
            ),
        }
    }

    pub(crate) fn relocated_record(&self, from: RecordRef) -> Option<RecordRef> {
        self.records.get(&from).copied()
    }

    /// Allocates the target slot before the fields are relocated.
    pub(crate) fn reserve_record(&mut self, from: RecordRef) -> RecordRef {
        let target = self.heap.allocate_record(Record::placeholder());
        self.records.insert(from, target);
        target
    }

    pub(crate) fn relocated_variable(&self, from: VarRef) -> Option<VarRef> {
        self.variables.get(&from).copied()
    }

    pub(crate) fn remember_variable(&mut self, from: VarRef, to: VarRef) {
        self.variables.insert(from, to);
    }

    fn finish(mut self) -> (AtomTable, Heap) {
        self.heap.reset_allocation_count();
        (self.atoms, self.heap)
    }
}

impl Vm {
    /// Copies everything reachable from the roots and the threads into a
    /// fresh atom table and heap.
    ///
    /// Values held by the host outside of [`Vm::add_root`] are not updated
    /// and must not be used afterwards.
    pub fn collect_garbage(&mut self) -> GcStats {
        let mut stats = GcStats {
            atoms_before: self.atoms().len(),
            records_before: self.heap().record_count(),
            variables_before: self.heap().variable_count(),
            ..Default::default()
        };

        let mut gc = Gc::new(self);
        let mut roots = mem::take(self.roots_mut());
        let mut scheduler = mem::take(self.scheduler_mut());
        {
            let vm: &Vm = self;
            let mut relocate = |node: &mut Node| *node = gc.relocate(vm, node);
            roots.visit_roots(&mut relocate);
            scheduler.visit_roots(&mut relocate);
        }
        *self.roots_mut() = roots;
        *self.scheduler_mut() = scheduler;

        let (atoms, heap) = gc.finish();
        self.install(atoms, heap);

        stats.atoms_after = self.atoms().len();
        stats.records_after = self.heap().record_count();
        stats.variables_after = self.heap().variable_count();
        debug!(
            "gc: atoms {} -> {}, records {} -> {}, variables {} -> {}",
            stats.atoms_before,
            stats.atoms_after,
            stats.records_before,
            stats.records_after,
            stats.variables_before,
            stats.variables_after
        );
        stats
    }
}
