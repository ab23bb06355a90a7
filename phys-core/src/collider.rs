//! Colliders: the geometric parts of a body.
//!
//! A collider is a circle or an axis-aligned box placed at a local offset
//! from its body, plus three category bitmasks:
//!
//! ```text
//! category  what this collider is
//! hit       what it physically collides with (response + hit event)
//! overlap   what it senses without response (overlap event only)
//! ```
//!
//! Colliders carry no intersection logic; see `collision::detection`.

use serde::{Deserialize, Serialize};

use crate::error::{positive, PhysError};
use crate::types::{Rect, Vec2};

/// Collision categories used by the game layer.
///
/// This bit layout is a stable contract: ship, asteroid, projectile and
/// screen-edge bodies are configured against exactly these bits.
pub mod categories {
    pub const ALL: u16 = 0b1111_1111;
    pub const GUNSHIP: u16 = 0b0000_0001;
    pub const ASTEROID: u16 = 0b0000_0010;
    pub const PROJECTILE: u16 = 0b0000_0100;
    pub const EDGE: u16 = 0b0000_1000;
}

/// Category bitmasks of a collider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionMask {
    /// What this collider is
    #[serde(default)]
    pub category: u16,
    /// What it can hit
    #[serde(default)]
    pub hit: u16,
    /// What it can overlap
    #[serde(default)]
    pub overlap: u16,
}

impl CollisionMask {
    pub const fn new(category: u16, hit: u16, overlap: u16) -> Self {
        Self {
            category,
            hit,
            overlap,
        }
    }
}

/// Shape of a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f64 },
    /// Axis-aligned box; rotation is not supported.
    Box { width: f64, height: f64 },
}

/// A circle or box attached to a body. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    shape: Shape,
    offset: Vec2,
    mask: CollisionMask,
}

impl Collider {
    /// Circle collider centered on the body.
    pub fn circle(radius: f64) -> Result<Self, PhysError> {
        Ok(Self {
            shape: Shape::Circle {
                radius: positive("radius", radius)?,
            },
            offset: Vec2::ZERO,
            mask: CollisionMask::default(),
        })
    }

    /// Box collider centered on the body.
    pub fn rect(width: f64, height: f64) -> Result<Self, PhysError> {
        Ok(Self {
            shape: Shape::Box {
                width: positive("width", width)?,
                height: positive("height", height)?,
            },
            offset: Vec2::ZERO,
            mask: CollisionMask::default(),
        })
    }

    /// Place the collider at `offset` relative to the body position.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_mask(mut self, mask: CollisionMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn mask(&self) -> CollisionMask {
        self.mask
    }

    /// World-space center given the owning body's position.
    pub fn center(&self, body_position: Vec2) -> Vec2 {
        body_position + self.offset
    }

    /// World-space bounding box given the owning body's position.
    ///
    /// Circles are bounded by the square around them.
    pub fn bounds(&self, body_position: Vec2) -> Rect {
        let center = self.center(body_position);
        match self.shape {
            Shape::Circle { radius } => Rect::centered(center, Vec2::new(radius, radius) * 2.0),
            Shape::Box { width, height } => Rect::centered(center, Vec2::new(width, height)),
        }
    }
}
