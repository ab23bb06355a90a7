//! Integer ids handed to Python, mapped to body handles both ways.

use std::collections::BTreeMap;

use phys_core::BodyHandle;
use slotmap::SecondaryMap;

/// Ids are allocated in insertion order and never reused. Entries for
/// bodies that left the world are dropped by [`BodyIds::prune`].
#[derive(Debug, Default)]
pub(crate) struct BodyIds {
    handles: BTreeMap<usize, BodyHandle>,
    ids: SecondaryMap<BodyHandle, usize>,
    next: usize,
}

impl BodyIds {
    pub fn insert(&mut self, handle: BodyHandle) -> usize {
        let id = self.next;
        self.next += 1;
        self.handles.insert(id, handle);
        self.ids.insert(handle, id);
        id
    }

    pub fn handle(&self, id: usize) -> Option<BodyHandle> {
        self.handles.get(&id).copied()
    }

    pub fn id_of(&self, handle: BodyHandle) -> Option<usize> {
        self.ids.get(handle).copied()
    }

    /// Forget every handle for which `alive` is false.
    pub fn prune(&mut self, alive: impl Fn(BodyHandle) -> bool) {
        self.ids.retain(|handle, _| alive(handle));
        let ids = &self.ids;
        self.handles.retain(|_, handle| ids.contains_key(*handle));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.handles.len()
    }
}
