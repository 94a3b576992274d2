use log::trace;

use crate::{Node, Record, ThreadId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef(u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarRef(u32);

impl RecordRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl VarRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Something waiting for a variable to be bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Listener {
    Thread(ThreadId),
    /// a control variable, bound to `unit` as soon as any of the
    /// variables it listens on is bound
    Variable(VarRef),
}

#[derive(Debug, Clone)]
pub enum VarCell {
    Unbound { listeners: Vec<Listener> },
    Bound(Node),
}

// TODO: heap growth policy, right now we only count allocations between collections
#[derive(Debug, Default)]
pub struct HeapCreateInfo {
    pub initial_capacity: Option<usize>,
    // number of allocations after which the scheduler collects
    pub gc_threshold: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HeapSettings {
    pub initial_capacity: usize,
    pub gc_threshold: usize,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            gc_threshold: 64 * 1024,
        }
    }
}

impl HeapSettings {
    pub fn from_info(info: &HeapCreateInfo) -> Self {
        let mut settings = HeapSettings::default();
        info.initial_capacity
            .inspect(|&val| settings.initial_capacity = val);
        info.gc_threshold.inspect(|&val| settings.gc_threshold = val);
        settings
    }
}

/// Storage for the boxed kinds: records and dataflow variables.
///
/// References are plain indices. They stay valid until the next
/// collection, which builds a new heap and relocates every live reference.
#[derive(Debug)]
pub struct Heap {
    settings: HeapSettings,
    records: Vec<Record>,
    variables: Vec<VarCell>,
    allocated_since_gc: usize,
}

impl Heap {
    pub fn new(settings: HeapSettings) -> Self {
        let capacity = settings.initial_capacity;
        Self {
            settings,
            records: Vec::with_capacity(capacity),
            variables: Vec::with_capacity(capacity),
            allocated_since_gc: 0,
        }
    }

    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    pub fn allocate_record(&mut self, record: Record) -> RecordRef {
        let index = u32::try_from(self.records.len()).expect("VM out of memory");
        self.records.push(record);
        self.allocated_since_gc += 1;
        RecordRef(index)
    }

    pub fn allocate_variable(&mut self) -> VarRef {
        self.allocate_var_cell(VarCell::Unbound {
            listeners: Vec::new(),
        })
    }

    pub(crate) fn allocate_var_cell(&mut self, cell: VarCell) -> VarRef {
        let index = u32::try_from(self.variables.len()).expect("VM out of memory");
        self.variables.push(cell);
        self.allocated_since_gc += 1;
        trace!("allocated variable {index}");
        VarRef(index)
    }

    /// Panics on a dangling reference: the heap is corrupt at that point.
    pub fn record(&self, record: RecordRef) -> &Record {
        match self.records.get(record.index()) {
            Some(record) => record,
            None => panic!("dangling record reference {record:?}"),
        }
    }

    pub(crate) fn replace_record(&mut self, record: RecordRef, value: Record) {
        match self.records.get_mut(record.index()) {
            Some(slot) => *slot = value,
            None => panic!("dangling record reference {record:?}"),
        }
    }

    pub fn variable(&self, var: VarRef) -> &VarCell {
        match self.variables.get(var.index()) {
            Some(cell) => cell,
            None => panic!("dangling variable reference {var:?}"),
        }
    }

    pub(crate) fn variable_mut(&mut self, var: VarRef) -> &mut VarCell {
        match self.variables.get_mut(var.index()) {
            Some(cell) => cell,
            None => panic!("dangling variable reference {var:?}"),
        }
    }

    /// Who waits on `var`. Bound variables have nobody left.
    pub fn listeners(&self, var: VarRef) -> &[Listener] {
        match self.variable(var) {
            VarCell::Unbound { listeners } => listeners,
            VarCell::Bound(_) => &[],
        }
    }

    pub(crate) fn add_listener(&mut self, var: VarRef, listener: Listener) -> bool {
        match self.variable_mut(var) {
            VarCell::Unbound { listeners } => {
                if !listeners.contains(&listener) {
                    listeners.push(listener);
                }
                true
            }
            VarCell::Bound(_) => false,
        }
    }

    pub fn contains_record(&self, record: RecordRef) -> bool {
        record.index() < self.records.len()
    }

    pub fn contains_variable(&self, var: VarRef) -> bool {
        var.index() < self.variables.len()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    // relocated values do not count towards the next collection
    pub(crate) fn reset_allocation_count(&mut self) {
        self.allocated_since_gc = 0;
    }

    pub fn needs_collection(&self) -> bool {
        self.allocated_since_gc >= self.settings.gc_threshold
    }
}
