//! # Phys Core
//!
//! A small deterministic 2D collision engine for arcade games.
//!
//! ## Architecture
//!
//! - `types`: Core geometry (Vec2, Rect, constants)
//! - `collider`: Circle and box shapes with collision category masks
//! - `contact`: Unordered body pairs with direction and hit/overlap kind
//! - `collision`: Narrow-phase detection and elastic hit response
//! - `movement`: Linear and weaving movement strategies
//! - `body`: Bodies and their handles
//! - `world`: Body ownership, grid broad phase and the per-tick step
//! - `config`: YAML world and body presets
//!
//! ## Quick start
//!
//! ```
//! use phys_core::{categories, Body, Collider, CollisionMask, LinearMovement, Vec2, World, WorldConfig};
//!
//! let mask = CollisionMask::new(categories::ASTEROID, categories::ALL, 0);
//! let mut world = World::new(WorldConfig::default())?;
//!
//! let rock = |x: f64, vx: f64| -> Result<Body, phys_core::PhysError> {
//!     Ok(Body::new(Vec2::new(x, 100.0), 1.0, 1.0)?
//!         .with_collider(Collider::circle(10.0)?.with_mask(mask))
//!         .with_movement(LinearMovement::new(Vec2::new(vx, 0.0))))
//! };
//! let left = world.add_body(rock(100.0, 5.0)?);
//! world.add_body(rock(125.0, -5.0)?);
//!
//! let mut hits = 0;
//! for _ in 0..10 {
//!     hits += world.step(0.1)?.len();
//! }
//! assert_eq!(hits, 1);
//! assert!(world.body(left).and_then(|b| b.velocity()).is_some_and(|v| v.x < 0.0));
//! # Ok::<(), phys_core::PhysError>(())
//! ```

pub mod body;
pub mod collider;
pub mod collision;
pub mod config;
pub mod contact;
pub mod error;
pub mod movement;
pub mod types;
pub mod world;

pub use body::{Body, BodyHandle, WorldId};
pub use collider::{categories, Collider, CollisionMask, Shape};
pub use collision::{ContactEvaluator, EvaluatorConfig, Impact, ImpactBody, ImpactResolver};
pub use config::{BodyPreset, ColliderSpec, ConfigError, ConfigLoader, MovementSpec, WorldConfig};
pub use contact::{Contact, ContactKind, ContactPair};
pub use error::PhysError;
pub use movement::{LinearMovement, Movement, WeavingMovement};
pub use types::{Rect, Vec2};
pub use world::{BodyMut, ContactEvent, LifecycleEvent, ListenerId, World, MAX_PARTITIONS};
