//! Movement strategies.
//!
//! A movement owns a body's velocity and decides two things:
//!
//! - how the body's position advances over a time step (`advance`)
//! - how a hit changes the velocity (`on_hit`)
//!
//! A body without a movement is kinematic: it never moves on its own and
//! only changes position when repositioned from outside.
//!
//! Velocity changes requested from outside (`set_velocity`, `stop`) are
//! pending: they take effect at the start of the next `advance`, so a
//! change made mid-tick never affects the current tick.

use std::fmt;

use crate::collision::resolution::{Impact, ImpactResolver};
use crate::error::PhysError;
use crate::types::Vec2;

/// How a body moves and reacts to hits.
pub trait Movement: fmt::Debug {
    /// Current velocity.
    fn velocity(&self) -> Vec2;

    /// Request a new velocity, applied at the start of the next advance.
    fn set_velocity(&mut self, velocity: Vec2);

    /// Request a full stop. The body may still be set moving later.
    fn stop(&mut self) {
        self.set_velocity(Vec2::ZERO);
    }

    /// Advance over `dt` seconds from `position` and return the new position.
    fn advance(&mut self, position: Vec2, dt: f64) -> Vec2;

    /// Update velocity after a hit.
    fn on_hit(&mut self, impact: &Impact);
}

// =============================================================================
// Linear movement
// =============================================================================

/// Constant velocity between hits.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMovement {
    velocity: Vec2,
    pending: Option<Vec2>,
}

impl LinearMovement {
    pub fn new(velocity: Vec2) -> Self {
        Self {
            velocity,
            pending: None,
        }
    }

    /// Velocity that will apply from the next advance, if one was requested.
    pub fn pending_velocity(&self) -> Option<Vec2> {
        self.pending
    }

    fn apply_pending(&mut self) {
        if let Some(velocity) = self.pending.take() {
            self.velocity = velocity;
        }
    }
}

impl Default for LinearMovement {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Movement for LinearMovement {
    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.pending = Some(velocity);
    }

    fn advance(&mut self, position: Vec2, dt: f64) -> Vec2 {
        self.apply_pending();
        position + self.velocity * dt
    }

    fn on_hit(&mut self, impact: &Impact) {
        self.velocity = ImpactResolver::resolve(self.velocity, impact);
    }
}

// =============================================================================
// Weaving movement
// =============================================================================

/// Angle increment for one step: `(dt, coefficient, angular_speed) -> radians`.
pub type AngleFn = Box<dyn Fn(f64, f64, f64) -> f64>;

/// Default weave: turn at full angular speed, in the direction given by the
/// sign of the ramp coefficient. No turn while the coefficient is exactly 0.
pub fn default_angle(dt: f64, coefficient: f64, angular_speed: f64) -> f64 {
    if coefficient > 0.0 {
        angular_speed * dt
    } else if coefficient < 0.0 {
        -angular_speed * dt
    } else {
        0.0
    }
}

/// Constant speed with a direction that weaves from side to side.
///
/// After each linear advance the velocity is rotated by the angle function,
/// then the ramp coefficient moves toward -1 or +1 at a rate of
/// `4 / curve_duration` per second, reversing at each bound. The
/// coefficient therefore follows a triangle wave in [-1, 1] and the body
/// alternates between turning left and right.
pub struct WeavingMovement {
    linear: LinearMovement,
    angular_speed: f64,
    curve_duration: f64,
    coefficient: f64,
    descending: bool,
    angle_fn: AngleFn,
}

impl WeavingMovement {
    /// Start at coefficient 1, ramping down.
    ///
    /// # Arguments
    /// * `velocity` - Initial velocity
    /// * `angular_speed` - Turn rate in radians per second
    /// * `curve_duration` - Duration of one weave cycle in seconds, > 0
    pub fn new(velocity: Vec2, angular_speed: f64, curve_duration: f64) -> Result<Self, PhysError> {
        if !(curve_duration > 0.0) {
            return Err(PhysError::InvalidCurve("curve duration should be > 0"));
        }
        Ok(Self {
            linear: LinearMovement::new(velocity),
            angular_speed,
            curve_duration,
            coefficient: 1.0,
            descending: true,
            angle_fn: Box::new(default_angle),
        })
    }

    /// Start the ramp at `coefficient` in [-1, 1], moving down if `descending`.
    pub fn with_phase(mut self, coefficient: f64, descending: bool) -> Result<Self, PhysError> {
        if !(-1.0..=1.0).contains(&coefficient) {
            return Err(PhysError::InvalidCurve("coefficient should be in [-1, 1]"));
        }
        self.coefficient = coefficient;
        self.descending = descending;
        Ok(self)
    }

    /// Replace the angle function.
    pub fn with_angle_fn<F>(mut self, angle_fn: F) -> Self
    where
        F: Fn(f64, f64, f64) -> f64 + 'static,
    {
        self.angle_fn = Box::new(angle_fn);
        self
    }

    pub fn angular_speed(&self) -> f64 {
        self.angular_speed
    }

    pub fn curve_duration(&self) -> f64 {
        self.curve_duration
    }

    /// Current position on the triangle wave, in [-1, 1].
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    fn advance_ramp(&mut self, dt: f64) {
        let delta = (dt / self.curve_duration) * 4.0;
        if self.descending {
            self.coefficient -= delta;
            if self.coefficient <= -1.0 {
                self.coefficient = -1.0;
                self.descending = false;
            }
        } else {
            self.coefficient += delta;
            if self.coefficient >= 1.0 {
                self.coefficient = 1.0;
                self.descending = true;
            }
        }
    }
}

impl fmt::Debug for WeavingMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeavingMovement")
            .field("linear", &self.linear)
            .field("angular_speed", &self.angular_speed)
            .field("curve_duration", &self.curve_duration)
            .field("coefficient", &self.coefficient)
            .field("descending", &self.descending)
            .finish_non_exhaustive()
    }
}

impl Movement for WeavingMovement {
    fn velocity(&self) -> Vec2 {
        self.linear.velocity()
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.linear.set_velocity(velocity);
    }

    fn advance(&mut self, position: Vec2, dt: f64) -> Vec2 {
        let next = self.linear.advance(position, dt);

        let angle = (self.angle_fn)(dt, self.coefficient, self.angular_speed);
        self.linear.velocity = self.linear.velocity.rotated(angle);

        self.advance_ramp(dt);
        next
    }

    fn on_hit(&mut self, impact: &Impact) {
        self.linear.on_hit(impact);
    }
}

// =============================================================================
// Tests
// =============================================================================
