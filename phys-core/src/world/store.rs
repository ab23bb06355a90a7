//! Body storage.
//!
//! Bodies live in a dense vector in insertion order. A slot map translates
//! stable `BodyHandle`s to dense indices, so handles survive the index
//! shuffling caused by removals and a stale handle never resolves.

use std::collections::BTreeSet;

use slotmap::SlotMap;

use crate::body::{Body, BodyHandle};

#[derive(Debug, Default)]
pub(crate) struct BodyStore {
    slots: SlotMap<BodyHandle, usize>,
    handles: Vec<BodyHandle>,
    bodies: Vec<Body>,
}

impl BodyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: Body) -> BodyHandle {
        let handle = self.slots.insert(self.bodies.len());
        self.handles.push(handle);
        self.bodies.push(body);
        handle
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.slots.contains_key(handle)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        let index = *self.slots.get(handle)?;
        self.bodies.get(index)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let index = *self.slots.get(handle)?;
        self.bodies.get_mut(index)
    }

    /// Body at a dense index, with its handle.
    pub fn get_index_mut(&mut self, index: usize) -> Option<(BodyHandle, &mut Body)> {
        let handle = *self.handles.get(index)?;
        self.bodies.get_mut(index).map(|body| (handle, body))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.handles.iter().copied().zip(self.bodies.iter())
    }

    /// Remove every body in `doomed`, keeping the rest in insertion order.
    pub fn remove_many(&mut self, doomed: &BTreeSet<BodyHandle>) -> Vec<Body> {
        if doomed.is_empty() {
            return Vec::new();
        }

        let handles = std::mem::take(&mut self.handles);
        let bodies = std::mem::take(&mut self.bodies);
        let mut removed = Vec::new();

        for (handle, body) in handles.into_iter().zip(bodies) {
            if doomed.contains(&handle) {
                self.slots.remove(handle);
                removed.push(body);
            } else {
                if let Some(slot) = self.slots.get_mut(handle) {
                    *slot = self.bodies.len();
                }
                self.handles.push(handle);
                self.bodies.push(body);
            }
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec2;

    fn body_at(x: f64) -> Body {
        Body::new(Vec2::new(x, 0.0), 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_remove_many_preserves_order_and_handles() {
        let mut store = BodyStore::new();
        let handles: Vec<_> = (0..5).map(|i| store.insert(body_at(i as f64))).collect();

        let doomed: BTreeSet<_> = [handles[1], handles[3]].into_iter().collect();
        let removed = store.remove_many(&doomed);

        assert_eq!(removed.len(), 2);
        assert_eq!(store.len(), 3);

        let xs: Vec<f64> = store.iter().map(|(_, body)| body.position().x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);

        assert_eq!(store.get(handles[4]).unwrap().position().x, 4.0);
        assert!(store.get(handles[1]).is_none());
        assert!(!store.contains(handles[3]));
    }

    #[test]
    fn test_stale_handle_does_not_alias_new_body() {
        let mut store = BodyStore::new();
        let old = store.insert(body_at(1.0));
        store.remove_many(&[old].into_iter().collect());

        let new = store.insert(body_at(2.0));
        assert_ne!(old, new);
        assert!(store.get(old).is_none());
        assert_eq!(store.get(new).unwrap().position().x, 2.0);
    }

    #[test]
    fn test_get_index_mut() {
        let mut store = BodyStore::new();
        let a = store.insert(body_at(1.0));
        let (handle, body) = store.get_index_mut(0).unwrap();
        assert_eq!(handle, a);
        body.set_position(Vec2::new(9.0, 9.0));
        assert_eq!(store.get(a).unwrap().position(), Vec2::new(9.0, 9.0));
        assert!(store.get_index_mut(1).is_none());
    }
}
