//! Contacts between two bodies.

use std::hash::{Hash, Hasher};

use crate::body::BodyHandle;
use crate::error::PhysError;
use crate::types::Vec2;

/// Whether a contact is a physical collision or a sensor overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    /// Physical collision: velocities respond and `Hit` events fire.
    Hit,
    /// Sensing only: no response, `Overlap` events fire.
    Overlap,
}

/// Unordered pair of bodies. `ContactPair::new(a, b) == ContactPair::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactPair(BodyHandle, BodyHandle);

impl ContactPair {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn contains(&self, body: BodyHandle) -> bool {
        self.0 == body || self.1 == body
    }

    pub fn bodies(&self) -> (BodyHandle, BodyHandle) {
        (self.0, self.1)
    }
}

/// A detected relationship between two bodies.
///
/// Equality and hashing only look at the unordered pair of bodies, so a
/// contact found as (A, B) equals the same contact found as (B, A) even if
/// their directions differ.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    a: BodyHandle,
    b: BodyHandle,
    // From a to b. Zero means unknown.
    direction: Vec2,
    kind: ContactKind,
}

impl Contact {
    /// Build a contact. A non-zero `direction` is normalized; the zero
    /// vector is kept as the "unknown direction" marker.
    pub fn new(a: BodyHandle, b: BodyHandle, direction: Vec2, kind: ContactKind) -> Self {
        let direction = if direction.is_zero() {
            Vec2::ZERO
        } else {
            direction.normalized()
        };
        Self {
            a,
            b,
            direction,
            kind,
        }
    }

    pub fn body_a(&self) -> BodyHandle {
        self.a
    }

    pub fn body_b(&self) -> BodyHandle {
        self.b
    }

    pub fn pair(&self) -> ContactPair {
        ContactPair::new(self.a, self.b)
    }

    /// Unit direction from body A to body B, or zero if unknown.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn kind(&self) -> ContactKind {
        self.kind
    }

    pub fn is_hit(&self) -> bool {
        self.kind == ContactKind::Hit
    }

    pub fn involves(&self, body: BodyHandle) -> bool {
        self.a == body || self.b == body
    }

    /// The body on the other side of the contact from `body`.
    pub fn other(&self, body: BodyHandle) -> Result<BodyHandle, PhysError> {
        if self.a == body {
            Ok(self.b)
        } else if self.b == body {
            Ok(self.a)
        } else {
            Err(PhysError::NotInContact(body))
        }
    }

    /// Direction pointing away from `body` toward the other participant.
    pub fn direction_from(&self, body: BodyHandle) -> Result<Vec2, PhysError> {
        if self.a == body {
            Ok(self.direction)
        } else if self.b == body {
            Ok(-self.direction)
        } else {
            Err(PhysError::NotInContact(body))
        }
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.pair() == other.pair()
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pair().hash(state);
    }
}
