mod capability;
mod error;
mod format;
mod gc;
mod heap;
mod interning;
mod kinds;
mod node;
mod primitives;
pub mod record_like;
mod result;
mod scheduler;
mod threads;
mod visitor;
mod vm;

pub use capability::{Behavior, Capabilities, CopyPolicy, Implementation, KindFlags, Storage};
pub use error::{VmError, VmResult, raise_illegal_field_selection, raise_type_error};
pub use format::{Repr, write_atom};
pub use gc::{Gc, GcStats, Relocate};
pub use heap::{Heap, HeapCreateInfo, HeapSettings, Listener, RecordRef, VarCell, VarRef};
pub use interning::{AtomImpl, AtomTable};
pub use kinds::{
    atom::Atom,
    literals::{Boolean, Unit},
    numbers::{Float, SmallInt},
    record::{Arity, Record, compare_features},
};
pub use node::{Kind, Node};
pub use primitives::{
    BUILTINS, Builtin, BuiltinContext, BuiltinFunction, BuiltinIndex, builtin_index, get_builtin,
};
pub use record_like::RecordLike;
pub use result::BuiltinResult;
pub use scheduler::{RunReport, Scheduler};
pub use threads::{Instruction, Thread, ThreadId, ThreadState};
pub use visitor::{RootProvider, Roots, Visitable, Visitor};
pub use vm::{VMCreateInfo, Vm, VmId, VmSettings};
