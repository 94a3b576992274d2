use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{Atom, VmId};

/// Canonical storage for the content of one atom.
///
/// Exactly one `AtomImpl` exists per content and table, so two atoms are
/// equal iff they point at the same `AtomImpl`.
pub struct AtomImpl {
    owner: VmId,
    content: Box<str>,
}

impl AtomImpl {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn owner(&self) -> VmId {
        self.owner
    }
}

impl fmt::Debug for AtomImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomImpl({:?} @ {:?})", self.content, self.owner)
    }
}

struct AtomTableImpl {
    mappings: HashMap<Box<str>, Arc<AtomImpl>, ahash::RandomState>,
}

impl AtomTableImpl {
    fn new() -> Self {
        Self {
            mappings: HashMap::default(),
        }
    }

    fn get_or_add(&mut self, owner: VmId, content: &str) -> Arc<AtomImpl> {
        if let Some(existing) = self.mappings.get(content) {
            return existing.clone();
        }
        let interned = Arc::new(AtomImpl {
            owner,
            content: content.into(),
        });
        self.mappings.insert(content.into(), interned.clone());
        interned
    }

    fn get(&self, content: &str) -> Option<Arc<AtomImpl>> {
        self.mappings.get(content).cloned()
    }
}

/// Interning table of one VM instance.
///
/// Entries are only ever added. A collection builds a new table holding
/// the atoms that are still reachable.
pub struct AtomTable {
    owner: VmId,
    inner: RwLock<AtomTableImpl>,
}

impl AtomTable {
    pub fn new(owner: VmId) -> Self {
        Self {
            owner,
            inner: RwLock::new(AtomTableImpl::new()),
        }
    }

    pub fn owner(&self) -> VmId {
        self.owner
    }

    /// Returns the canonical atom for `content`, creating it on first use.
    pub fn get(&self, content: &str) -> Atom {
        if let Some(existing) = self.inner.read().get(content) {
            return Atom::from_canonical(existing);
        }
        Atom::from_canonical(self.inner.write().get_or_add(self.owner, content))
    }

    /// Same as [`AtomTable::get`] for an explicit sequence of scalar values.
    pub fn get_scalars(&self, content: &[char]) -> Atom {
        let content: String = content.iter().collect();
        self.get(&content)
    }

    /// Probes the table without inserting.
    pub fn lookup(&self, content: &str) -> Option<Atom> {
        self.inner.read().get(content).map(Atom::from_canonical)
    }

    pub fn len(&self) -> usize {
        self.inner.read().mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for AtomTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomTable")
            .field("owner", &self.owner)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_yields_same_identity() {
        let table = AtomTable::new(VmId::next());
        let a = table.get("hello");
        let b = table.get("hello");
        assert!(a.same_identity(&b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn different_content_yields_different_identity() {
        let table = AtomTable::new(VmId::next());
        let a = table.get("hello");
        let b = table.get("world");
        assert!(!a.same_identity(&b));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn scalar_overload_interns_to_the_same_entry() {
        let table = AtomTable::new(VmId::next());
        let from_str = table.get("äbc€");
        let from_chars = table.get_scalars(&['ä', 'b', 'c', '€']);
        assert!(from_str.same_identity(&from_chars));
    }

    #[test]
    fn empty_content_is_a_valid_atom() {
        let table = AtomTable::new(VmId::next());
        let a = table.get("");
        assert!(a.same_identity(&table.get_scalars(&[])));
        assert_eq!(a.content(), "");
    }

    #[test]
    fn lookup_does_not_insert() {
        let table = AtomTable::new(VmId::next());
        assert!(table.lookup("missing").is_none());
        assert!(table.is_empty());
        let a = table.get("present");
        let found = table.lookup("present").expect("atom was interned");
        assert!(a.same_identity(&found));
    }

    #[test]
    fn atoms_remember_their_table() {
        let owner = VmId::next();
        let table = AtomTable::new(owner);
        assert_eq!(table.get("x").owner(), owner);
        assert_eq!(table.owner(), owner);
    }
}
