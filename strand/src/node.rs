use crate::{
    Atom, Boolean, Capabilities, Float, Implementation, RecordLike, RecordRef, SmallInt, Unit,
    VarRef,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Atom,
    SmallInt,
    Float,
    Boolean,
    Unit,
    Record,
    Variable,
}

/// A generic value slot.
///
/// The slot only knows which kind it holds; everything else goes through
/// that kind's [`Implementation`].
#[derive(Debug, Clone)]
pub enum Node {
    Atom(Atom),
    SmallInt(SmallInt),
    Float(Float),
    Boolean(Boolean),
    Unit(Unit),
    Record(RecordRef),
    Variable(VarRef),
}

impl Default for Node {
    fn default() -> Self {
        Node::Unit(Unit)
    }
}

impl Node {
    pub fn int(value: i64) -> Self {
        Node::SmallInt(SmallInt(value))
    }

    pub fn float(value: f64) -> Self {
        Node::Float(Float(value))
    }

    pub fn boolean(value: bool) -> Self {
        Node::Boolean(Boolean(value))
    }

    pub fn unit() -> Self {
        Node::Unit(Unit)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Node::Atom(_) => Atom::KIND,
            Node::SmallInt(_) => SmallInt::KIND,
            Node::Float(_) => Float::KIND,
            Node::Boolean(_) => Boolean::KIND,
            Node::Unit(_) => Unit::KIND,
            Node::Record(_) => RecordRef::KIND,
            Node::Variable(_) => VarRef::KIND,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Node::Atom(_) => Atom::CAPABILITIES,
            Node::SmallInt(_) => SmallInt::CAPABILITIES,
            Node::Float(_) => Float::CAPABILITIES,
            Node::Boolean(_) => Boolean::CAPABILITIES,
            Node::Unit(_) => Unit::CAPABILITIES,
            Node::Record(_) => RecordRef::CAPABILITIES,
            Node::Variable(_) => VarRef::CAPABILITIES,
        }
    }

    /// Literals are the values that can label a record.
    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Atom(_) | Node::Boolean(_) | Node::Unit(_))
    }

    /// Features are literals and small integers.
    pub fn is_feature(&self) -> bool {
        self.is_literal() || matches!(self, Node::SmallInt(_))
    }

    /// The record-like implementation of this kind, if it has one.
    ///
    /// Variables have none: callers must dereference first and suspend on
    /// whatever is still unbound.
    pub fn as_record_like(&self) -> Option<&dyn RecordLike> {
        match self {
            Node::Atom(atom) => Some(atom),
            Node::Boolean(boolean) => Some(boolean),
            Node::Unit(unit) => Some(unit),
            Node::Record(record) => Some(record),
            Node::SmallInt(_) | Node::Float(_) | Node::Variable(_) => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Node::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::SmallInt(SmallInt(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<RecordRef> {
        match self {
            Node::Record(record) => Some(*record),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<VarRef> {
        match self {
            Node::Variable(var) => Some(*var),
            _ => None,
        }
    }
}

impl From<Atom> for Node {
    fn from(value: Atom) -> Self {
        Node::Atom(value)
    }
}

impl From<SmallInt> for Node {
    fn from(value: SmallInt) -> Self {
        Node::SmallInt(value)
    }
}

impl From<Float> for Node {
    fn from(value: Float) -> Self {
        Node::Float(value)
    }
}

impl From<Boolean> for Node {
    fn from(value: Boolean) -> Self {
        Node::Boolean(value)
    }
}

impl From<Unit> for Node {
    fn from(value: Unit) -> Self {
        Node::Unit(value)
    }
}

impl From<RecordRef> for Node {
    fn from(value: RecordRef) -> Self {
        Node::Record(value)
    }
}

impl From<VarRef> for Node {
    fn from(value: VarRef) -> Self {
        Node::Variable(value)
    }
}
