//! Collision response.
//!
//! Computes a body's new velocity after a hit. Each participant of a hit
//! is resolved independently from its own point of view, using a snapshot
//! of both bodies taken before either velocity changes.
//!
//! ## Model
//!
//! ```text
//!            n (direction from self toward other)
//!   self ●──────→ ● other
//!        ↑ p = perpendicular to n
//! ```
//!
//! - The component of velocity along `p` is always preserved.
//! - Against a kinematic body (no movement) the component along `n` is
//!   reflected and scaled by bounciness.
//! - Against a moving body the component along `n` follows the 1D
//!   collision formula with a coefficient of restitution:
//!
//! ```text
//! n' = (nA*mA + nB*mB + e*mB*(nB - nA)) / (mA + mB)
//! ```
//!
//! Bounciness `e` is the larger of the two bodies' bounciness values.
//! Angular effects are not modelled: bodies have no orientation.

use crate::body::Body;
use crate::types::Vec2;

/// State of one participant as seen by a collision response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactBody {
    pub mass: f64,
    pub bounciness: f64,
    /// Current velocity; `None` for kinematic bodies.
    pub velocity: Option<Vec2>,
}

impl ImpactBody {
    /// Snapshot the parts of `body` a collision response needs.
    pub fn of(body: &Body) -> Self {
        Self {
            mass: body.mass(),
            bounciness: body.bounciness(),
            velocity: body.velocity(),
        }
    }
}

/// One side of a hit: the direction toward the other body plus both bodies' state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// Unit direction from the resolving body toward the other one.
    /// Zero means the direction is unknown and no response is applied.
    pub normal: Vec2,
    pub own: ImpactBody,
    pub other: ImpactBody,
}

impl Impact {
    /// Effective coefficient of restitution of the pair.
    pub fn bounciness(&self) -> f64 {
        self.own.bounciness.max(self.other.bounciness)
    }
}

/// Stateless collision response.
pub struct ImpactResolver;

impl ImpactResolver {
    /// Velocity of the resolving body after the impact.
    ///
    /// # Arguments
    /// * `velocity` - Current velocity of the resolving body
    /// * `impact` - Direction and participant snapshot, from its point of view
    pub fn resolve(velocity: Vec2, impact: &Impact) -> Vec2 {
        let normal = impact.normal;
        if normal.is_zero() {
            return velocity;
        }

        // Decompose velocity along the line of impact and its perpendicular
        let tangent = velocity.project_onto(&normal.perp());
        let own_normal = velocity.project_onto(&normal);
        let bounciness = impact.bounciness();

        match impact.other.velocity {
            None => tangent - own_normal * bounciness,
            Some(other_velocity) => {
                let mass_a = impact.own.mass;
                let mass_b = impact.other.mass;
                let other_normal = other_velocity.project_onto(&normal);

                let new_normal = (own_normal * mass_a
                    + other_normal * mass_b
                    + (other_normal - own_normal) * (bounciness * mass_b))
                    / (mass_a + mass_b);

                tangent + new_normal
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
