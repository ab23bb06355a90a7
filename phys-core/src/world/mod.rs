//! The world: body ownership and the per-tick step.
//!
//! ## Step order
//!
//! ```text
//! step(dt)
//!   1. drain removals      queued bodies leave store, grid, dirty set, contacts
//!   2. advance             every body present at the start of the loop
//!   3. re-partition        dirty bodies update their grid cells
//!   4. narrow phase        dirty bodies against cell neighbours
//!   5. diff contacts       stale contacts dropped, fresh ones dispatched
//!   6. clear dirty set
//! ```
//!
//! Only fresh contacts produce events. A contact that persists across
//! ticks fires once, on the tick it starts, and there is no separation
//! event. A contact is considered gone when one of its bodies was
//! re-tested (dirty) and the pair was not detected again.
//!
//! All iteration is over ordered collections keyed by handle, so a given
//! sequence of calls always produces the same events in the same order.

mod events;
mod grid;
mod store;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;

use tracing::{debug, instrument, trace};

use crate::body::{Body, BodyHandle, WorldId};
use crate::collider::Collider;
use crate::collision::{ContactEvaluator, Impact, ImpactBody};
use crate::config::WorldConfig;
use crate::contact::{Contact, ContactPair};
use crate::error::PhysError;
use crate::movement::Movement;
use crate::types::Vec2;

pub use events::{ContactEvent, LifecycleEvent, LifecycleListener, ListenerId};
pub use grid::MAX_PARTITIONS;

use events::Listeners;
use grid::PartitionGrid;
use store::BodyStore;

/// Owns bodies and advances them.
#[derive(Debug)]
pub struct World {
    id: WorldId,
    bodies: BodyStore,
    grid: PartitionGrid,
    dirty: BTreeSet<BodyHandle>,
    pending_removal: BTreeSet<BodyHandle>,
    contacts: BTreeMap<ContactPair, Contact>,
    evaluator: ContactEvaluator,
    listeners: Listeners,
}

impl World {
    /// Empty world over the rectangle and grid described by `config`.
    pub fn new(config: WorldConfig) -> Result<Self, PhysError> {
        Ok(Self {
            id: WorldId::next(),
            bodies: BodyStore::new(),
            grid: PartitionGrid::new(&config)?,
            dirty: BTreeSet::new(),
            pending_removal: BTreeSet::new(),
            contacts: BTreeMap::new(),
            evaluator: ContactEvaluator::new(),
            listeners: Listeners::default(),
        })
    }

    /// Use a custom contact evaluator.
    pub fn with_evaluator(mut self, evaluator: ContactEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    // -------------------------------------------------------------------------
    // Bodies
    // -------------------------------------------------------------------------

    /// Take ownership of `body` and return its handle.
    ///
    /// Active bodies are tested for contacts at the next step. The handle
    /// is only meaningful to this world; see `BodyHandle`.
    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        let active = body.is_active();
        let handle = self.bodies.insert(body);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.attach(self.id, handle);
        }
        if active {
            self.dirty.insert(handle);
        }
        trace!(?handle, active, "body added");
        handle
    }

    /// Queue a body for removal at the start of the next step.
    ///
    /// Returns true if the body was newly queued. Unknown handles and
    /// bodies already queued are ignored. Listeners get `BeginDestroy`
    /// before this returns.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if !self.bodies.contains(handle) || !self.pending_removal.insert(handle) {
            return false;
        }
        trace!(?handle, "body queued for removal");
        self.listeners.notify(handle, LifecycleEvent::BeginDestroy);
        true
    }

    /// Bodies in insertion order, including any queued for removal.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.bodies.iter()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Mutable access that keeps the world informed of changes.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<BodyMut<'_>> {
        let World {
            bodies,
            grid,
            dirty,
            contacts,
            listeners,
            ..
        } = self;
        let body = bodies.get_mut(handle)?;
        Some(BodyMut {
            handle,
            body,
            grid,
            dirty,
            contacts,
            listeners,
        })
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_pending_removal(&self, handle: BodyHandle) -> bool {
        self.pending_removal.contains(&handle)
    }

    pub fn pending_removal_count(&self) -> usize {
        self.pending_removal.len()
    }

    pub fn is_dirty(&self, handle: BodyHandle) -> bool {
        self.dirty.contains(&handle)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    // -------------------------------------------------------------------------
    // Contacts and partitions
    // -------------------------------------------------------------------------

    /// Current contacts, ordered by body pair.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.contacts.values()
    }

    pub fn contact_between(&self, a: BodyHandle, b: BodyHandle) -> Option<&Contact> {
        self.contacts.get(&ContactPair::new(a, b))
    }

    pub fn partition_count(&self) -> usize {
        self.grid.len()
    }

    /// Bottom-left corner of a partition cell.
    pub fn partition_origin(&self, index: usize) -> Result<Vec2, PhysError> {
        Ok(self.grid.cell_rect(index)?.origin)
    }

    pub fn partition_members(&self, index: usize) -> Result<&BTreeSet<BodyHandle>, PhysError> {
        self.grid.members(index)
    }

    // -------------------------------------------------------------------------
    // Lifecycle listeners
    // -------------------------------------------------------------------------

    /// Register a lifecycle listener on `handle`. `None` if the body is unknown.
    pub fn subscribe<F>(&mut self, handle: BodyHandle, listener: F) -> Option<ListenerId>
    where
        F: FnMut(BodyHandle, LifecycleEvent) + 'static,
    {
        if !self.bodies.contains(handle) {
            return None;
        }
        self.listeners.add(handle, Box::new(listener))
    }

    pub fn unsubscribe(&mut self, handle: BodyHandle, id: ListenerId) -> bool {
        self.listeners.remove(handle, id)
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advance the world by `dt` seconds and return the contacts that
    /// started during this tick.
    ///
    /// Hit responses have already been applied to both bodies when this
    /// returns.
    #[instrument(level = "trace", skip(self), fields(world = ?self.id))]
    pub fn step(&mut self, dt: f64) -> Result<Vec<ContactEvent>, PhysError> {
        if !(dt > 0.0) {
            return Err(PhysError::InvalidTimeStep(dt));
        }

        let removed = self.drain_removals();

        // Bodies appended while advancing wait for the next tick
        let count = self.bodies.len();
        for index in 0..count {
            if let Some((handle, body)) = self.bodies.get_index_mut(index) {
                if body.step(dt)? {
                    self.dirty.insert(handle);
                }
            }
        }

        let dirty = std::mem::take(&mut self.dirty);
        let detected = self.detect(&dirty);
        let fresh = self.diff_contacts(&dirty, detected);

        let events: Vec<ContactEvent> = fresh
            .into_iter()
            .map(|contact| {
                if contact.is_hit() {
                    self.respond(&contact);
                }
                ContactEvent::new(contact)
            })
            .collect();

        debug!(
            removed,
            dirty = dirty.len(),
            contacts = self.contacts.len(),
            events = events.len(),
            "world stepped"
        );
        Ok(events)
    }

    fn drain_removals(&mut self) -> usize {
        if self.pending_removal.is_empty() {
            return 0;
        }
        let removing = std::mem::take(&mut self.pending_removal);

        for &handle in &removing {
            self.dirty.remove(&handle);
            self.grid.remove(handle);
            self.listeners.drop_body(handle);
        }
        self.contacts.retain(|pair, _| {
            let (a, b) = pair.bodies();
            !removing.contains(&a) && !removing.contains(&b)
        });

        self.bodies.remove_many(&removing).len()
    }

    /// Re-partition dirty bodies and test them against their cell neighbours.
    fn detect(&mut self, dirty: &BTreeSet<BodyHandle>) -> Vec<Contact> {
        let mut placed: Vec<Vec<BodyHandle>> = vec![Vec::new(); self.grid.len()];
        for &handle in dirty {
            let Some(body) = self.bodies.get(handle) else {
                continue;
            };
            for cell in self.grid.place(handle, body) {
                placed[cell].push(handle);
            }
        }

        let mut tested: BTreeSet<ContactPair> = BTreeSet::new();
        let mut detected = Vec::new();

        for (cell, movers) in placed.iter().enumerate() {
            let Ok(members) = self.grid.members(cell) else {
                continue;
            };
            for &a in movers {
                for &b in members {
                    if a == b || !tested.insert(ContactPair::new(a, b)) {
                        continue;
                    }
                    let (Some(body_a), Some(body_b)) = (self.bodies.get(a), self.bodies.get(b))
                    else {
                        continue;
                    };
                    if let Some(contact) = self.evaluator.intersects(a, body_a, b, body_b) {
                        detected.push(contact);
                    }
                }
            }
        }

        detected
    }

    /// Merge detected contacts into the current set and return the fresh ones,
    /// in detection order.
    fn diff_contacts(&mut self, dirty: &BTreeSet<BodyHandle>, detected: Vec<Contact>) -> Vec<Contact> {
        let found: BTreeSet<ContactPair> = detected.iter().map(Contact::pair).collect();

        self.contacts.retain(|pair, _| {
            let (a, b) = pair.bodies();
            let retested = dirty.contains(&a) || dirty.contains(&b);
            !retested || found.contains(pair)
        });

        let mut fresh = Vec::new();
        for contact in detected {
            let pair = contact.pair();
            if !self.contacts.contains_key(&pair) {
                self.contacts.insert(pair, contact);
                fresh.push(contact);
            }
        }
        fresh
    }

    /// Apply a hit to both bodies from a snapshot taken before either changes.
    fn respond(&mut self, contact: &Contact) {
        let (a, b) = (contact.body_a(), contact.body_b());
        let (Some(state_a), Some(state_b)) = (
            self.bodies.get(a).map(ImpactBody::of),
            self.bodies.get(b).map(ImpactBody::of),
        ) else {
            return;
        };

        if let Some(body) = self.bodies.get_mut(a) {
            body.on_hit(&Impact {
                normal: contact.direction(),
                own: state_a,
                other: state_b,
            });
        }
        if let Some(body) = self.bodies.get_mut(b) {
            body.on_hit(&Impact {
                normal: -contact.direction(),
                own: state_b,
                other: state_a,
            });
        }
    }
}

// =============================================================================
// BodyMut
// =============================================================================

/// Mutable view of a body owned by a world.
///
/// Changes to position, activity and colliders mark the body for
/// re-testing at the next step. Read access goes through `Deref<Target = Body>`.
pub struct BodyMut<'w> {
    handle: BodyHandle,
    body: &'w mut Body,
    grid: &'w mut PartitionGrid,
    dirty: &'w mut BTreeSet<BodyHandle>,
    contacts: &'w mut BTreeMap<ContactPair, Contact>,
    listeners: &'w mut Listeners,
}

impl BodyMut<'_> {
    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.body.set_position(position);
        self.dirty.insert(self.handle);
    }

    /// Change the active flag.
    ///
    /// Deactivating drops the body's contacts and takes it out of the grid
    /// immediately. Listeners are told only when the flag actually changes.
    pub fn set_active(&mut self, active: bool) {
        let changed = self.body.set_active(active);
        self.dirty.insert(self.handle);
        if !changed {
            return;
        }

        let handle = self.handle;
        if active {
            self.listeners.notify(handle, LifecycleEvent::Activated);
        } else {
            self.contacts.retain(|pair, _| !pair.contains(handle));
            self.grid.remove(handle);
            self.listeners.notify(handle, LifecycleEvent::Deactivated);
        }
    }

    pub fn add_collider(&mut self, collider: Collider) {
        self.body.add_collider(collider);
        self.dirty.insert(self.handle);
    }

    pub fn remove_collider(&mut self, index: usize) -> Option<Collider> {
        let removed = self.body.remove_collider(index)?;
        self.dirty.insert(self.handle);
        Some(removed)
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<(), PhysError> {
        self.body.set_mass(mass)
    }

    pub fn set_bounciness(&mut self, bounciness: f64) -> Result<(), PhysError> {
        self.body.set_bounciness(bounciness)
    }

    pub fn set_movement<M: Movement + 'static>(&mut self, movement: M) {
        self.body.set_movement(movement);
    }

    pub fn clear_movement(&mut self) -> Option<Box<dyn Movement>> {
        self.body.clear_movement()
    }

    pub fn movement_mut(&mut self) -> Option<&mut (dyn Movement + 'static)> {
        self.body.movement_mut()
    }
}

impl Deref for BodyMut<'_> {
    type Target = Body;

    fn deref(&self) -> &Body {
        self.body
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::CollisionMask;
    use crate::contact::ContactKind;
    use crate::movement::LinearMovement;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SOLID: CollisionMask = CollisionMask::new(1, 1, 0);
    const SENSOR: CollisionMask = CollisionMask::new(1, 0, 1);

    fn world() -> World {
        World::new(WorldConfig {
            origin: Vec2::new(-100.0, -100.0),
            size: Vec2::new(200.0, 200.0),
            columns: 4,
            rows: 4,
        })
        .unwrap()
    }

    fn circle(x: f64, y: f64, radius: f64, mask: CollisionMask) -> Body {
        Body::new(Vec2::new(x, y), 1.0, 1.0)
            .unwrap()
            .with_collider(Collider::circle(radius).unwrap().with_mask(mask))
    }

    #[test]
    fn test_new_validates_config() {
        let config = WorldConfig {
            size: Vec2::new(10.0, -1.0),
            ..WorldConfig::default()
        };
        assert!(World::new(config).is_err());
        assert!(World::new(WorldConfig::default()).is_ok());

        let oversized = WorldConfig {
            columns: 1 << 33,
            rows: 1 << 31,
            ..WorldConfig::default()
        };
        assert!(matches!(
            World::new(oversized),
            Err(PhysError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn test_add_body_attaches_and_marks_dirty() {
        let mut world = world();
        let active = world.add_body(circle(0.0, 0.0, 1.0, SOLID));
        let inactive = world.add_body(circle(0.0, 0.0, 1.0, SOLID).with_active(false));

        let body = world.body(active).unwrap();
        assert_eq!(body.world(), Some(world.id()));
        assert_eq!(body.handle(), Some(active));
        assert!(world.is_dirty(active));
        assert!(!world.is_dirty(inactive));
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_step_rejects_bad_dt() {
        let mut world = world();
        assert_eq!(world.step(0.0), Err(PhysError::InvalidTimeStep(0.0)));
        assert!(world.step(-0.5).is_err());
    }

    #[test]
    fn test_dirty_set_cleared_by_step_and_refilled_by_mutation() {
        let mut world = world();
        let h = world.add_body(circle(0.0, 0.0, 1.0, SOLID));
        world.step(0.1).unwrap();
        assert_eq!(world.dirty_count(), 0);

        world.body_mut(h).unwrap().set_position(Vec2::new(5.0, 5.0));
        assert!(world.is_dirty(h));
        world.step(0.1).unwrap();
        assert_eq!(world.dirty_count(), 0);

        world.body_mut(h).unwrap().add_collider(Collider::circle(2.0).unwrap());
        assert!(world.is_dirty(h));
        world.step(0.1).unwrap();

        world.body_mut(h).unwrap().set_mass(3.0).unwrap();
        assert!(!world.is_dirty(h), "mass does not affect geometry");
    }

    #[test]
    fn test_overlap_event_fires_once_for_resting_pair() {
        let mut world = world();
        let a = world.add_body(circle(0.0, 0.0, 5.0, SENSOR));
        let b = world.add_body(circle(3.0, 0.0, 5.0, SENSOR));

        let events = world.step(0.1).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContactKind::Overlap);
        assert!(events[0].involves(a) && events[0].involves(b));

        for _ in 0..5 {
            assert!(world.step(0.1).unwrap().is_empty());
        }
        assert!(world.contact_between(b, a).is_some());
    }

    #[test]
    fn test_contact_dropped_when_retested_apart() {
        let mut world = world();
        let a = world.add_body(circle(0.0, 0.0, 5.0, SOLID));
        let b = world.add_body(circle(8.0, 0.0, 5.0, SOLID));
        assert_eq!(world.step(0.1).unwrap().len(), 1);

        world.body_mut(b).unwrap().set_position(Vec2::new(50.0, 0.0));
        assert!(world.step(0.1).unwrap().is_empty());
        assert!(world.contact_between(a, b).is_none());

        // Moving back in starts a new contact
        world.body_mut(b).unwrap().set_position(Vec2::new(8.0, 0.0));
        assert_eq!(world.step(0.1).unwrap().len(), 1);
    }

    #[test]
    fn test_deactivation_drops_contacts_and_notifies() {
        let mut world = world();
        let a = world.add_body(circle(0.0, 0.0, 5.0, SOLID));
        let b = world.add_body(circle(8.0, 0.0, 5.0, SOLID));
        world.step(0.1).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        world
            .subscribe(a, move |_, event| log.borrow_mut().push(event))
            .unwrap();

        world.body_mut(a).unwrap().set_active(false);
        world.body_mut(a).unwrap().set_active(false);
        assert!(world.contact_between(a, b).is_none());
        assert!((0..world.partition_count()).all(|i| !world.partition_members(i).unwrap().contains(&a)));

        assert!(world.step(0.1).unwrap().is_empty(), "inactive bodies are not tested");

        world.body_mut(a).unwrap().set_active(true);
        assert_eq!(world.step(0.1).unwrap().len(), 1);

        assert_eq!(
            *seen.borrow(),
            vec![LifecycleEvent::Deactivated, LifecycleEvent::Activated]
        );
    }

    #[test]
    fn test_remove_body_is_deferred_and_idempotent() {
        let mut world = world();
        let a = world.add_body(circle(0.0, 0.0, 5.0, SOLID));
        let b = world.add_body(circle(8.0, 0.0, 5.0, SOLID));
        world.step(0.1).unwrap();

        let destroyed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&destroyed);
        world.subscribe(a, move |_, event| {
            if event == LifecycleEvent::BeginDestroy {
                *counter.borrow_mut() += 1;
            }
        });

        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert_eq!(*destroyed.borrow(), 1);

        // Still visible until the next step
        assert!(world.contains(a));
        assert!(world.contact_between(a, b).is_some());

        world.step(0.1).unwrap();
        assert!(!world.contains(a));
        assert!(world.body(a).is_none());
        assert!(world.contacts().next().is_none());
        assert_eq!(world.pending_removal_count(), 0);
        assert!(!world.remove_body(a), "stale handles are ignored");
        assert!(world.subscribe(a, |_, _| {}).is_none());
    }

    #[test]
    fn test_moving_body_is_advanced_and_retested() {
        let mut world = world();
        let h = world.add_body(
            circle(0.0, 0.0, 1.0, SOLID).with_movement(LinearMovement::new(Vec2::new(10.0, 0.0))),
        );
        world.step(0.5).unwrap();
        assert_eq!(world.body(h).unwrap().position(), Vec2::new(5.0, 0.0));
        assert_eq!(world.dirty_count(), 0);
    }

    #[test]
    fn test_partition_queries() {
        let mut world = world();
        let h = world.add_body(circle(-75.0, -75.0, 1.0, SOLID));
        world.step(0.1).unwrap();

        assert_eq!(world.partition_count(), 16);
        assert_eq!(world.partition_origin(0), Ok(Vec2::new(-100.0, -100.0)));
        assert_eq!(world.partition_origin(5), Ok(Vec2::new(-50.0, -50.0)));
        assert!(world.partition_members(0).unwrap().contains(&h));
        assert_eq!(
            world.partition_members(16).unwrap_err(),
            PhysError::PartitionOutOfRange {
                index: 16,
                count: 16
            }
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut world = world();
        let h = world.add_body(circle(0.0, 0.0, 1.0, SOLID));
        let id = world.subscribe(h, |_, _| panic!("unsubscribed")).unwrap();
        assert!(world.unsubscribe(h, id));
        assert!(!world.unsubscribe(h, id));
        world.body_mut(h).unwrap().set_active(false);
    }

    #[test]
    fn test_custom_shrink_changes_box_direction() {
        let square = |x: f64, y: f64| {
            Body::new(Vec2::new(x, y), 1.0, 1.0)
                .unwrap()
                .with_collider(Collider::rect(2.0, 2.0).unwrap().with_mask(SOLID))
        };

        // Deep overlap: unknown direction with the default shrink
        let mut default = world();
        let a = default.add_body(square(0.0, 0.0));
        let b = default.add_body(square(1.5, 0.5));
        default.step(0.1).unwrap();
        let contact = default.contact_between(a, b).unwrap();
        assert!(contact.direction().is_zero());

        // Stronger shrink separates the boxes on X
        let mut shrunk = world().with_evaluator(ContactEvaluator::with_config(
            crate::collision::EvaluatorConfig {
                direction_shrink: 0.5,
            },
        ));
        let a = shrunk.add_body(square(0.0, 0.0));
        let b = shrunk.add_body(square(1.5, 0.5));
        shrunk.step(0.1).unwrap();
        let contact = shrunk.contact_between(a, b).unwrap();
        assert_eq!(contact.direction_from(a), Ok(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_bodies_record_the_world_that_issued_their_handle() {
        let mut first = world();
        let mut second = world();
        let h1 = first.add_body(circle(0.0, 0.0, 1.0, SOLID));
        let h2 = second.add_body(circle(5.0, 0.0, 1.0, SOLID));

        // Both worlds hand out the same first key
        assert_eq!(h1, h2);
        assert_ne!(first.id(), second.id());

        // The key alone resolves in either world; the recorded id tells them apart
        let foreign = second.body(h1).unwrap();
        assert_eq!(foreign.position(), Vec2::new(5.0, 0.0));
        assert_ne!(foreign.world(), Some(first.id()));
        assert_eq!(first.body(h1).unwrap().world(), Some(first.id()));
    }
}
