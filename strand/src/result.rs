use crate::{Node, VarRef};

/// Outcome of a builtin operation.
///
/// `Suspend` is not an error: the operation needs the value of an unbound
/// variable and must be retried from the start once it is bound. Builtins
/// commit no side effects before returning `Proceed`, which is what makes
/// the retry safe.
#[must_use]
#[derive(Debug, Clone)]
pub enum BuiltinResult {
    /// completed, the result slot holds the output
    Proceed,
    /// failed with a language-level exception value
    Raise(Node),
    /// blocked on this unbound variable
    Suspend(VarRef),
}

impl BuiltinResult {
    pub fn is_proceed(&self) -> bool {
        matches!(self, BuiltinResult::Proceed)
    }

    pub fn is_raise(&self) -> bool {
        matches!(self, BuiltinResult::Raise(_))
    }

    pub fn is_suspend(&self) -> bool {
        matches!(self, BuiltinResult::Suspend(_))
    }

    pub fn exception(&self) -> Option<&Node> {
        match self {
            BuiltinResult::Raise(exception) => Some(exception),
            _ => None,
        }
    }

    pub fn waiting_on(&self) -> Option<VarRef> {
        match self {
            BuiltinResult::Suspend(var) => Some(*var),
            _ => None,
        }
    }
}

/// Returns early from the enclosing builtin unless `$result` proceeded.
#[macro_export]
macro_rules! check {
    ($result:expr) => {
        match $result {
            $crate::BuiltinResult::Proceed => {}
            other => return other,
        }
    };
}
