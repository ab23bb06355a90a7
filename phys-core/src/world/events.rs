//! Contact and lifecycle events.
//!
//! Contact events are returned from `World::step`. Lifecycle events go to
//! listeners registered per body and fire synchronously from the mutator
//! that caused them.

use slotmap::SecondaryMap;

use crate::body::BodyHandle;
use crate::contact::{Contact, ContactKind};

/// A contact that started this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub kind: ContactKind,
    pub contact: Contact,
}

impl ContactEvent {
    pub fn new(contact: Contact) -> Self {
        Self {
            kind: contact.kind(),
            contact,
        }
    }

    pub fn involves(&self, body: BodyHandle) -> bool {
        self.contact.involves(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Activated,
    Deactivated,
    /// The body was queued for removal; it leaves the world at the next step.
    BeginDestroy,
}

/// Identifies a lifecycle listener for unsubscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub type LifecycleListener = Box<dyn FnMut(BodyHandle, LifecycleEvent)>;

#[derive(Default)]
pub(crate) struct Listeners {
    next: u64,
    by_body: SecondaryMap<BodyHandle, Vec<(ListenerId, LifecycleListener)>>,
}

impl Listeners {
    pub fn add(&mut self, body: BodyHandle, listener: LifecycleListener) -> Option<ListenerId> {
        let id = ListenerId(self.next);
        let entry = self.by_body.entry(body)?.or_default();
        entry.push((id, listener));
        self.next += 1;
        Some(id)
    }

    pub fn remove(&mut self, body: BodyHandle, id: ListenerId) -> bool {
        let Some(listeners) = self.by_body.get_mut(body) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Call every listener of `body`, in subscription order.
    pub fn notify(&mut self, body: BodyHandle, event: LifecycleEvent) {
        if let Some(listeners) = self.by_body.get_mut(body) {
            for (_, listener) in listeners.iter_mut() {
                listener(body, event);
            }
        }
    }

    pub fn drop_body(&mut self, body: BodyHandle) {
        self.by_body.remove(body);
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("bodies", &self.by_body.len())
            .finish_non_exhaustive()
    }
}
