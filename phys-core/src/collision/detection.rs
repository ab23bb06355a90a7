//! Narrow-phase contact detection.
//!
//! Tests pairs of bodies collider by collider. For each collider pair the
//! category masks are checked first; only compatible pairs reach the
//! geometry tests, which are dispatched on the pair of shapes:
//!
//! ```text
//!            | Circle         | Box
//! -----------+----------------+----------------------------
//! Circle     | circle_circle  | circle_box
//! Box        | -circle_box    | box_box
//! ```
//!
//! Boxes are axis aligned and circles against boxes are treated as boxes
//! with rounded corners. The direction heuristics are approximate on
//! purpose; gameplay is tuned against these exact thresholds.

use crate::body::{Body, BodyHandle};
use crate::collider::{Collider, CollisionMask, Shape};
use crate::contact::{Contact, ContactKind};
use crate::types::{constants, Rect, Vec2};

/// Configuration for contact evaluation.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Shrink factor used to guess which side a box was touched from.
    pub direction_shrink: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            direction_shrink: constants::DIRECTION_SHRINK,
        }
    }
}

/// Contact evaluator. Holds no per-pair state.
#[derive(Debug, Clone, Default)]
pub struct ContactEvaluator {
    pub config: EvaluatorConfig,
}

impl ContactEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Classify a collider pair by masks, before any geometry.
    ///
    /// Hit needs both sides to accept each other's category through `hit`;
    /// otherwise overlap needs the same through `overlap`.
    pub fn classify(a: CollisionMask, b: CollisionMask) -> Option<ContactKind> {
        if (a.hit & b.category) != 0 && (a.category & b.hit) != 0 {
            Some(ContactKind::Hit)
        } else if (a.overlap & b.category) != 0 && (a.category & b.overlap) != 0 {
            Some(ContactKind::Overlap)
        } else {
            None
        }
    }

    /// Test two bodies.
    ///
    /// Collider pairs are tried in order (all of A's colliders against all
    /// of B's); the first overlapping pair decides the contact's direction
    /// and kind.
    pub fn intersects(
        &self,
        a: BodyHandle,
        body_a: &Body,
        b: BodyHandle,
        body_b: &Body,
    ) -> Option<Contact> {
        let pos_a = body_a.position();
        let pos_b = body_b.position();

        body_a.colliders().iter().find_map(|collider_a| {
            body_b.colliders().iter().find_map(|collider_b| {
                self.collider_contact(pos_a, collider_a, pos_b, collider_b)
                    .map(|(direction, kind)| Contact::new(a, b, direction, kind))
            })
        })
    }

    /// Test two colliders at the given body positions.
    ///
    /// Returns the direction from A to B (zero if unknown) and the kind.
    pub fn collider_contact(
        &self,
        pos_a: Vec2,
        a: &Collider,
        pos_b: Vec2,
        b: &Collider,
    ) -> Option<(Vec2, ContactKind)> {
        let kind = Self::classify(a.mask(), b.mask())?;

        let center_a = a.center(pos_a);
        let center_b = b.center(pos_b);

        let direction = match (a.shape(), b.shape()) {
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                Self::circle_circle(center_a, ra, center_b, rb)
            }
            (Shape::Box { width: wa, height: ha }, Shape::Box { width: wb, height: hb }) => {
                self.box_box(center_a, Vec2::new(wa, ha), center_b, Vec2::new(wb, hb))
            }
            (Shape::Circle { radius }, Shape::Box { width, height }) => {
                self.circle_box(center_a, radius, center_b, Vec2::new(width, height))
            }
            (Shape::Box { width, height }, Shape::Circle { radius }) => {
                self.box_circle(center_a, Vec2::new(width, height), center_b, radius)
            }
        }?;

        Some((direction, kind))
    }

    /// Circles touch when `distance <= ra + rb`.
    pub fn circle_circle(center_a: Vec2, ra: f64, center_b: Vec2, rb: f64) -> Option<Vec2> {
        if center_a.distance(&center_b) <= ra + rb {
            Some((center_b - center_a).normalized())
        } else {
            None
        }
    }

    /// Axis-aligned boxes given centers and full sizes.
    pub fn box_box(&self, center_a: Vec2, size_a: Vec2, center_b: Vec2, size_b: Vec2) -> Option<Vec2> {
        let x_dist = (center_a.x - center_b.x).abs();
        let y_dist = (center_a.y - center_b.y).abs();

        let sum_width = size_a.x + size_b.x;
        let sum_height = size_a.y + size_b.y;

        if x_dist > sum_width / 2.0 || y_dist > sum_height / 2.0 {
            return None;
        }

        // Shrink both boxes and see on which axis they stop overlapping
        let shrink = self.config.direction_shrink;
        let direction = if x_dist > sum_width * shrink / 2.0 {
            Vec2::new(center_b.x - center_a.x, 0.0).normalized()
        } else if y_dist > sum_height * shrink / 2.0 {
            Vec2::new(0.0, center_b.y - center_a.y).normalized()
        } else {
            Vec2::ZERO
        };

        Some(direction)
    }

    /// Circle against axis-aligned box; direction points from circle to box.
    pub fn circle_box(&self, circle: Vec2, radius: f64, rect: Vec2, size: Vec2) -> Option<Vec2> {
        let half_width = size.x / 2.0;
        let half_height = size.y / 2.0;

        let x_dist = (circle.x - rect.x).abs();
        let y_dist = (circle.y - rect.y).abs();

        let sum_width = radius + half_width;
        let sum_height = radius + half_height;

        if x_dist > sum_width || y_dist > sum_height {
            return None;
        }

        // Past a corner on both axes: the circle must reach the corner itself
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                let corner = Vec2::new(rect.x + sx * half_width, rect.y + sy * half_height);
                if half_width < sx * (circle.x - rect.x)
                    && half_height < sy * (circle.y - rect.y)
                    && circle.distance(&corner) > radius
                {
                    return None;
                }
            }
        }

        let left = rect.x - half_width;
        let right = rect.x + half_width;
        let bottom = rect.y - half_height;
        let top = rect.y + half_height;

        let direction = if circle.x > left && circle.x < right && circle.y > bottom && circle.y < top {
            // Center inside the box
            Vec2::ZERO
        } else if circle.x >= left && circle.x <= right {
            // Above or below
            Vec2::new(0.0, if circle.y >= top { -1.0 } else { 1.0 })
        } else if circle.y >= bottom && circle.y <= top {
            // Right or left
            Vec2::new(if circle.x >= right { -1.0 } else { 1.0 }, 0.0)
        } else {
            // Corner. The sums here are already half extents, and the
            // threshold still halves them; keep it, tuning depends on it.
            let shrink = self.config.direction_shrink;
            if x_dist > sum_width * shrink / 2.0 {
                Vec2::new(rect.x - circle.x, 0.0).normalized()
            } else if y_dist > sum_height * shrink / 2.0 {
                Vec2::new(0.0, rect.y - circle.y).normalized()
            } else {
                Vec2::ZERO
            }
        };

        Some(direction)
    }

    /// Mirror of `circle_box`; direction points from box to circle.
    pub fn box_circle(&self, rect: Vec2, size: Vec2, circle: Vec2, radius: f64) -> Option<Vec2> {
        self.circle_box(circle, radius, rect, size).map(|direction| -direction)
    }

    /// True if any collider of `body` overlaps `rect` by bounding box.
    ///
    /// Used by the broad phase to place bodies in partitions.
    pub fn overlaps_rect(body: &Body, rect: &Rect) -> bool {
        body.colliders()
            .iter()
            .any(|collider| collider.bounds(body.position()).overlaps(rect))
    }
}

// =============================================================================
// Tests
// =============================================================================
