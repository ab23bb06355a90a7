//! Physical bodies.
//!
//! Typical construction:
//!
//! ```
//! use phys_core::{Body, Collider, LinearMovement, Vec2, World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default()).unwrap();
//! let body = Body::new(Vec2::new(100.0, 100.0), 1.0, 0.8)
//!     .unwrap()
//!     .with_collider(Collider::circle(10.0).unwrap())
//!     .with_movement(LinearMovement::new(Vec2::new(5.0, 0.0)));
//! let handle = world.add_body(body);
//! assert!(world.body(handle).is_some());
//! ```
//!
//! Once a body is in a world, mutate it through `World::body_mut` so the
//! world learns about position, activity and collider changes.

use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::new_key_type;

use crate::collider::Collider;
use crate::collision::resolution::Impact;
use crate::error::PhysError;
use crate::movement::Movement;
use crate::types::{Rect, Vec2};

new_key_type! {
    /// Stable generational handle to a body owned by a `World`.
    ///
    /// A handle to a removed body never resolves to a later body that
    /// reuses the same slot.
    ///
    /// Handles are scoped to the `World` that issued them. Two worlds can
    /// hand out equal keys, so passing a handle to another world looks up
    /// whatever body that world keeps in the same slot. Compare
    /// `Body::world` against `World::id` when a handle may cross worlds.
    pub struct BodyHandle;
}

/// Identity of a `World`, recorded on each body it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(u64);

impl WorldId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A physical entity: position, mass, bounciness, colliders and an
/// optional movement. Without a movement the body is kinematic.
#[derive(Debug)]
pub struct Body {
    position: Vec2,
    mass: f64,
    bounciness: f64,
    active: bool,
    colliders: Vec<Collider>,
    movement: Option<Box<dyn Movement>>,
    world: Option<WorldId>,
    handle: Option<BodyHandle>,
}

fn check_mass(mass: f64) -> Result<f64, PhysError> {
    if mass > 0.0 {
        Ok(mass)
    } else {
        Err(PhysError::InvalidMass(mass))
    }
}

fn check_bounciness(bounciness: f64) -> Result<f64, PhysError> {
    if (0.0..=1.0).contains(&bounciness) {
        Ok(bounciness)
    } else {
        Err(PhysError::InvalidBounciness(bounciness))
    }
}

impl Body {
    /// Active kinematic body with no colliders.
    ///
    /// Fails if `mass <= 0` or `bounciness` is outside [0, 1].
    pub fn new(position: Vec2, mass: f64, bounciness: f64) -> Result<Self, PhysError> {
        Ok(Self {
            position,
            mass: check_mass(mass)?,
            bounciness: check_bounciness(bounciness)?,
            active: true,
            colliders: Vec::new(),
            movement: None,
            world: None,
            handle: None,
        })
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }

    pub fn with_movement<M: Movement + 'static>(mut self, movement: M) -> Self {
        self.movement = Some(Box::new(movement));
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn bounciness(&self) -> f64 {
        self.bounciness
    }

    /// True if the body steps and takes part in contacts.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True if the body has no movement.
    pub fn is_kinematic(&self) -> bool {
        self.movement.is_none()
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn movement(&self) -> Option<&dyn Movement> {
        self.movement.as_deref()
    }

    pub fn movement_mut(&mut self) -> Option<&mut (dyn Movement + 'static)> {
        self.movement.as_deref_mut()
    }

    /// Velocity of the movement, `None` if kinematic.
    pub fn velocity(&self) -> Option<Vec2> {
        self.movement.as_ref().map(|movement| movement.velocity())
    }

    /// World that owns this body, once inserted.
    pub fn world(&self) -> Option<WorldId> {
        self.world
    }

    /// Handle of this body in its world, once inserted.
    pub fn handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    /// World-space bounding box of all colliders, `None` without colliders.
    pub fn bounds(&self) -> Option<Rect> {
        self.colliders
            .iter()
            .map(|collider| collider.bounds(self.position))
            .reduce(|acc, rect| acc.union(&rect))
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Returns true if the flag changed.
    pub fn set_active(&mut self, active: bool) -> bool {
        let changed = self.active != active;
        self.active = active;
        changed
    }

    pub fn add_collider(&mut self, collider: Collider) {
        self.colliders.push(collider);
    }

    /// Remove the collider at `index`, `None` if out of range.
    pub fn remove_collider(&mut self, index: usize) -> Option<Collider> {
        (index < self.colliders.len()).then(|| self.colliders.remove(index))
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<(), PhysError> {
        self.mass = check_mass(mass)?;
        Ok(())
    }

    pub fn set_bounciness(&mut self, bounciness: f64) -> Result<(), PhysError> {
        self.bounciness = check_bounciness(bounciness)?;
        Ok(())
    }

    pub fn set_movement<M: Movement + 'static>(&mut self, movement: M) {
        self.movement = Some(Box::new(movement));
    }

    /// Make the body kinematic, returning its previous movement.
    pub fn clear_movement(&mut self) -> Option<Box<dyn Movement>> {
        self.movement.take()
    }

    /// Advance the body by `dt` seconds.
    ///
    /// Inactive and kinematic bodies do not move. Returns true if the
    /// position was advanced.
    pub fn step(&mut self, dt: f64) -> Result<bool, PhysError> {
        if !(dt > 0.0) {
            return Err(PhysError::InvalidTimeStep(dt));
        }
        if !self.active {
            return Ok(false);
        }
        let Some(movement) = self.movement.as_mut() else {
            return Ok(false);
        };
        self.position = movement.advance(self.position, dt);
        Ok(true)
    }

    /// Apply a hit response. Kinematic bodies ignore hits.
    pub fn on_hit(&mut self, impact: &Impact) {
        if let Some(movement) = self.movement.as_mut() {
            movement.on_hit(impact);
        }
    }

    pub(crate) fn attach(&mut self, world: WorldId, handle: BodyHandle) {
        debug_assert!(self.world.is_none(), "body attached twice");
        self.world = Some(world);
        self.handle = Some(handle);
    }
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            mass: 1.0,
            bounciness: 1.0,
            active: true,
            colliders: Vec::new(),
            movement: None,
            world: None,
            handle: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::LinearMovement;

    #[test]
    fn test_rejects_invalid_mass_and_bounciness() {
        assert_eq!(
            Body::new(Vec2::ZERO, 0.0, 0.5).unwrap_err(),
            PhysError::InvalidMass(0.0)
        );
        assert!(Body::new(Vec2::ZERO, -1.0, 0.5).is_err());
        assert_eq!(
            Body::new(Vec2::ZERO, 1.0, 1.5).unwrap_err(),
            PhysError::InvalidBounciness(1.5)
        );
        assert!(Body::new(Vec2::ZERO, 1.0, -0.1).is_err());

        let mut body = Body::default();
        assert!(body.set_mass(0.0).is_err());
        assert!(body.set_bounciness(2.0).is_err());
        assert_eq!(body.mass(), 1.0);
        assert_eq!(body.bounciness(), 1.0);
    }

    #[test]
    fn test_kinematic_body_never_moves() {
        let mut body = Body::new(Vec2::new(1.0, 2.0), 1.0, 1.0).unwrap();
        assert!(body.is_kinematic());
        for _ in 0..10 {
            assert_eq!(body.step(0.1), Ok(false));
        }
        assert_eq!(body.position(), Vec2::new(1.0, 2.0));
        assert_eq!(body.velocity(), None);
    }

    #[test]
    fn test_step_advances_active_moving_body() {
        let mut body = Body::default().with_movement(LinearMovement::new(Vec2::new(2.0, 0.0)));
        assert_eq!(body.step(0.5), Ok(true));
        assert_eq!(body.position(), Vec2::new(1.0, 0.0));

        body.set_active(false);
        assert_eq!(body.step(0.5), Ok(false));
        assert_eq!(body.position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_step_rejects_non_positive_dt() {
        let mut body = Body::default();
        assert_eq!(body.step(0.0), Err(PhysError::InvalidTimeStep(0.0)));
        assert!(body.step(-1.0).is_err());
    }

    #[test]
    fn test_bounds_cover_all_colliders() {
        let body = Body::new(Vec2::new(10.0, 0.0), 1.0, 1.0)
            .unwrap()
            .with_collider(Collider::circle(1.0).unwrap())
            .with_collider(
                Collider::rect(2.0, 2.0)
                    .unwrap()
                    .with_offset(Vec2::new(5.0, 0.0)),
            );
        let bounds = body.bounds().unwrap();
        assert_eq!(bounds.min(), Vec2::new(9.0, -1.0));
        assert_eq!(bounds.max(), Vec2::new(16.0, 1.0));

        assert!(Body::default().bounds().is_none());
    }

    #[test]
    fn test_collider_list_edits() {
        let mut body = Body::default();
        body.add_collider(Collider::circle(1.0).unwrap());
        body.add_collider(Collider::rect(1.0, 1.0).unwrap());

        assert!(body.remove_collider(5).is_none());
        let removed = body.remove_collider(0).unwrap();
        assert!(matches!(
            removed.shape(),
            crate::collider::Shape::Circle { .. }
        ));
        assert_eq!(body.colliders().len(), 1);
    }

    #[test]
    fn test_set_active_reports_change() {
        let mut body = Body::default();
        assert!(!body.set_active(true));
        assert!(body.set_active(false));
        assert!(!body.is_active());
    }

    #[test]
    fn test_clear_movement_makes_kinematic() {
        let mut body = Body::default().with_movement(LinearMovement::default());
        assert!(!body.is_kinematic());
        assert!(body.clear_movement().is_some());
        assert!(body.is_kinematic());
    }
}
