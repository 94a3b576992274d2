use std::{
    collections::HashSet,
    hash::{BuildHasher, Hash, Hasher},
    sync::atomic::{AtomicU64, Ordering},
};

use log::trace;

use crate::{
    AtomTable, Behavior, Heap, HeapCreateInfo, HeapSettings, Implementation, Listener, Node,
    RecordRef, Roots, Scheduler, VarCell, VarRef, Visitable, Visitor, VmError, VmResult,
};

/// Process-unique identity of a VM instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VmId(u64);

impl VmId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
pub struct VMCreateInfo {
    pub heap: HeapCreateInfo,
    // instructions a thread runs before it yields
    pub quantum: Option<usize>,
    pub print_depth: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct VmSettings {
    pub quantum: usize,
    pub print_depth: usize,
}

impl Default for VmSettings {
    fn default() -> Self {
        Self {
            quantum: 64,
            print_depth: 10,
        }
    }
}

impl VmSettings {
    pub fn from_info(info: &VMCreateInfo) -> Self {
        let mut settings = VmSettings::default();
        info.quantum.inspect(|&val| settings.quantum = val.max(1));
        info.print_depth.inspect(|&val| settings.print_depth = val);
        settings
    }
}

/// One instance of the dataflow VM.
///
/// Owns the atom table, the heap and the threads. Nothing is shared
/// between instances: atoms built by one VM never compare equal to atoms
/// of another.
#[derive(Debug)]
pub struct Vm {
    id: VmId,
    settings: VmSettings,
    atoms: AtomTable,
    heap: Heap,
    scheduler: Scheduler,
    roots: Roots,
    output: String,
}

impl Vm {
    pub fn new(info: VMCreateInfo) -> Self {
        let id = VmId::next();
        let settings = VmSettings::from_info(&info);
        let heap = Heap::new(HeapSettings::from_info(&info.heap));
        trace!("created vm {id:?} with {settings:?}");
        Self {
            id,
            settings,
            atoms: AtomTable::new(id),
            heap,
            scheduler: Scheduler::default(),
            roots: Roots::default(),
            output: String::new(),
        }
    }

    pub fn id(&self) -> VmId {
        self.id
    }

    pub fn settings(&self) -> &VmSettings {
        &self.settings
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

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Roots {
        &mut self.roots
    }

    pub(crate) fn install(&mut self, atoms: AtomTable, heap: Heap) {
        debug_assert_eq!(atoms.owner(), self.id);
        self.atoms = atoms;
        self.heap = heap;
    }

    pub fn new_atom(&self, content: &str) -> Node {
        self.atoms.get(content).into()
    }

    pub fn new_variable(&mut self) -> VarRef {
        self.heap.allocate_variable()
    }

    /// Follows bound variables until a value or an unbound variable.
    pub fn deref(&self, node: &Node) -> Node {
        let mut current = node;
        while let Node::Variable(var) = current {
            match self.heap.variable(*var) {
                VarCell::Bound(value) => current = value,
                VarCell::Unbound { .. } => break,
            }
        }
        current.clone()
    }

    pub fn is_determined(&self, node: &Node) -> bool {
        !matches!(self.deref(node), Node::Variable(_))
    }

    /// Binds an unbound variable and reschedules every thread waiting on it.
    pub fn bind(&mut self, var: VarRef, value: Node) -> VmResult<()> {
        let target = match self.deref(&var.into()) {
            Node::Variable(target) => target,
            _ => return Err(VmError::AlreadyBound(var)),
        };
        if self.deref(&value).as_variable() == Some(target) {
            return Ok(());
        }

        let cell = self.heap.variable_mut(target);
        let listeners = match std::mem::replace(cell, VarCell::Bound(value)) {
            VarCell::Unbound { listeners } => listeners,
            VarCell::Bound(_) => unreachable!("deref stops at unbound variables"),
        };
        trace!("bound {target:?}, waking {} listeners", listeners.len());
        let mut threads = Vec::with_capacity(listeners.len());
        for listener in listeners {
            match listener {
                Listener::Thread(thread) => threads.push(thread),
                Listener::Variable(control) => {
                    if !self.is_determined(&control.into()) {
                        self.bind(control, Node::unit())?;
                    }
                }
            }
        }
        self.scheduler.wake(threads);
        Ok(())
    }

    /// Generic value equality on the dereferenced values.
    ///
    /// Value kinds use their own `equals`, records compare field by field.
    /// A pair of records met again while it is being compared counts as
    /// equal, so cyclic values terminate.
    pub fn equals(&self, left: &Node, right: &Node) -> bool {
        let mut pending = vec![(left.clone(), right.clone())];
        let mut seen: HashSet<(RecordRef, RecordRef), ahash::RandomState> = HashSet::default();
        while let Some((left, right)) = pending.pop() {
            let (left, right) = (self.deref(&left), self.deref(&right));
            if left.kind() != right.kind() {
                return false;
            }
            match left.capabilities().behavior {
                Behavior::Value => {
                    if !self.value_equals(&left, &right) {
                        return false;
                    }
                }
                Behavior::Variable => {
                    if left.as_variable() != right.as_variable() {
                        return false;
                    }
                }
                Behavior::Structural => {
                    let (Some(l), Some(r)) = (left.as_record(), right.as_record()) else {
                        return false;
                    };
                    if l == r || !seen.insert((l, r)) {
                        continue;
                    }
                    let (l, r) = (self.heap.record(l), self.heap.record(r));
                    if !l.same_arity(self, r) {
                        return false;
                    }
                    pending.push((l.label().clone(), r.label().clone()));
                    pending.extend(l.fields().iter().cloned().zip(r.fields().iter().cloned()));
                }
            }
        }
        true
    }

    // kinds with value behavior, already dereferenced
    fn value_equals(&self, left: &Node, right: &Node) -> bool {
        match (left, right) {
            (Node::Atom(l), Node::Atom(r)) => l.equals(self, r),
            (Node::SmallInt(l), Node::SmallInt(r)) => l.equals(self, r),
            (Node::Float(l), Node::Float(r)) => l.equals(self, r),
            (Node::Boolean(l), Node::Boolean(r)) => l.equals(self, r),
            (Node::Unit(l), Node::Unit(r)) => l.equals(self, r),
            _ => false,
        }
    }

    /// Like [`Vm::equals`], but rejects values built by another VM.
    pub fn try_equals(&self, left: &Node, right: &Node) -> VmResult<bool> {
        self.owns(left)?;
        self.owns(right)?;
        Ok(self.equals(left, right))
    }

    /// Checks that every atom reachable from `node` belongs to this VM.
    pub fn owns(&self, node: &Node) -> VmResult<()> {
        struct OwnerCheck<'a> {
            vm: &'a Vm,
            foreign: Option<VmId>,
        }

        impl Visitor for OwnerCheck<'_> {
            fn visit(&mut self, node: &Node) {
                if self.foreign.is_some() {
                    return;
                }
                match node {
                    Node::Atom(atom) if atom.owner() != self.vm.id => {
                        self.foreign = Some(atom.owner())
                    }
                    Node::Record(record) if self.vm.heap.contains_record(*record) => {
                        let vm = self.vm;
                        vm.heap.record(*record).visit_edges(self)
                    }
                    _ => {}
                }
            }
        }

        let mut check = OwnerCheck {
            vm: self,
            foreign: None,
        };
        check.visit(node);
        match check.foreign {
            Some(found) => Err(VmError::ForeignValue {
                expected: self.id,
                found,
            }),
            None => Ok(()),
        }
    }

    /// Hash consistent with [`Vm::equals`] for determined values.
    pub fn hash_value(&self, node: &Node) -> u64 {
        let mut hasher =
            ahash::RandomState::with_seeds(0x5354, 0x5241, 0x4e44, 0x564d).build_hasher();
        self.hash_into(node, self.settings.print_depth, &mut hasher);
        hasher.finish()
    }

    fn hash_into(&self, node: &Node, depth: usize, state: &mut impl Hasher) {
        let node = self.deref(node);
        node.kind().hash(state);
        match node.capabilities().behavior {
            Behavior::Value => match &node {
                Node::Atom(atom) => atom.identity().hash(state),
                Node::SmallInt(int) => int.0.hash(state),
                // 0.0 == -0.0
                Node::Float(float) if float.0 == 0.0 => 0u64.hash(state),
                Node::Float(float) => float.0.to_bits().hash(state),
                Node::Boolean(boolean) => boolean.0.hash(state),
                Node::Unit(_) | Node::Record(_) | Node::Variable(_) => {}
            },
            Behavior::Variable => node.as_variable().hash(state),
            Behavior::Structural => {
                if let Some(record) = node.as_record().filter(|_| depth > 0) {
                    let record = self.heap.record(record);
                    self.hash_into(record.label(), depth - 1, state);
                    record.width().hash(state);
                    for field in record.fields() {
                        self.hash_into(field, depth - 1, state);
                    }
                }
            }
        }
    }

    /// Pins `node` across collections. Returns the slot to read it back.
    pub fn add_root(&mut self, node: Node) -> usize {
        self.roots.push(node)
    }

    pub fn root(&self, slot: usize) -> Option<&Node> {
        self.roots.get(slot)
    }

    /// Everything the `show` builtin printed so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub(crate) fn output_mut(&mut self) -> &mut String {
        &mut self.output
    }
}
