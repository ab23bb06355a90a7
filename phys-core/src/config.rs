//! World and body presets.
//!
//! Loads world layouts and body templates from YAML files so game tuning
//! happens without recompiling.
//!
//! ## Directory Structure
//!
//! ```text
//! presets/
//! ├── worlds/
//! │   └── arena.yaml
//! └── bodies/
//!     ├── asteroid.yaml
//!     ├── edge.yaml
//!     ├── gunship.yaml
//!     └── laser_ball.yaml
//! ```
//!
//! Body presets look like:
//!
//! ```yaml
//! name: Asteroid
//! mass: 4.0
//! bounciness: 0.9
//! colliders:
//!   - shape: circle
//!     radius: 24.0
//!     mask: { category: 2, hit: 251, overlap: 4 }
//! movement:
//!   type: linear
//!   velocity: { x: -60.0, y: 0.0 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::Body;
use crate::collider::{Collider, CollisionMask};
use crate::error::PhysError;
use crate::movement::{LinearMovement, WeavingMovement};
use crate::types::Vec2;

/// Error type for preset loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("preset not found: {0}")]
    NotFound(String),

    #[error("invalid preset: {0}")]
    Phys(#[from] PhysError),
}

// =============================================================================
// World layout
// =============================================================================

/// Rectangle covered by a world and how it is split into partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Bottom-left corner
    pub origin: Vec2,
    pub size: Vec2,
    pub columns: usize,
    pub rows: usize,
}

impl Default for WorldConfig {
    /// A 960x640 screen split 4x4.
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            size: Vec2::new(960.0, 640.0),
            columns: 4,
            rows: 4,
        }
    }
}

// =============================================================================
// Body presets
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ColliderSpec {
    Circle {
        radius: f64,
        #[serde(default = "zero")]
        offset: Vec2,
        #[serde(default)]
        mask: CollisionMask,
    },
    Box {
        width: f64,
        height: f64,
        #[serde(default = "zero")]
        offset: Vec2,
        #[serde(default)]
        mask: CollisionMask,
    },
}

impl ColliderSpec {
    pub fn build(&self) -> Result<Collider, PhysError> {
        let (collider, offset, mask) = match *self {
            ColliderSpec::Circle {
                radius,
                offset,
                mask,
            } => (Collider::circle(radius)?, offset, mask),
            ColliderSpec::Box {
                width,
                height,
                offset,
                mask,
            } => (Collider::rect(width, height)?, offset, mask),
        };
        Ok(collider.with_offset(offset).with_mask(mask))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementSpec {
    Linear {
        velocity: Vec2,
    },
    Weaving {
        velocity: Vec2,
        /// Radians per second
        angular_speed: f64,
        /// Seconds per weave cycle
        curve_duration: f64,
        #[serde(default = "one")]
        coefficient: f64,
        #[serde(default = "yes")]
        descending: bool,
    },
}

/// Template for a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPreset {
    pub name: String,
    pub mass: f64,
    pub bounciness: f64,
    #[serde(default)]
    pub colliders: Vec<ColliderSpec>,
    /// Absent for kinematic bodies
    #[serde(default)]
    pub movement: Option<MovementSpec>,
}

impl BodyPreset {
    /// Build a validated body at `position`.
    pub fn build(&self, position: Vec2) -> Result<Body, PhysError> {
        let mut body = Body::new(position, self.mass, self.bounciness)?;
        for spec in &self.colliders {
            body.add_collider(spec.build()?);
        }

        match self.movement {
            None => {}
            Some(MovementSpec::Linear { velocity }) => {
                body.set_movement(LinearMovement::new(velocity));
            }
            Some(MovementSpec::Weaving {
                velocity,
                angular_speed,
                curve_duration,
                coefficient,
                descending,
            }) => {
                let weave = WeavingMovement::new(velocity, angular_speed, curve_duration)?
                    .with_phase(coefficient, descending)?;
                body.set_movement(weave);
            }
        }

        Ok(body)
    }
}

fn zero() -> Vec2 {
    Vec2::ZERO
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

// =============================================================================
// Loader
// =============================================================================

/// Preset loader with configurable base directory.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// The base path should contain `worlds/` and `bodies/` subdirectories.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load a world layout by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = ConfigLoader::new("presets");
    /// let world = World::new(loader.load_world("arena")?)?;
    /// ```
    pub fn load_world(&self, name: &str) -> Result<WorldConfig, ConfigError> {
        self.load("worlds", name)
    }

    /// Load a body preset by name.
    pub fn load_body(&self, name: &str) -> Result<BodyPreset, ConfigError> {
        self.load("bodies", name)
    }

    pub fn list_worlds(&self) -> Result<Vec<String>, ConfigError> {
        self.list("worlds")
    }

    pub fn list_bodies(&self) -> Result<Vec<String>, ConfigError> {
        self.list("bodies")
    }

    fn load<T: serde::de::DeserializeOwned>(&self, subdir: &str, name: &str) -> Result<T, ConfigError> {
        let path = self.base_path.join(subdir).join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn list(&self, subdir: &str) -> Result<Vec<String>, ConfigError> {
        let path = self.base_path.join(subdir);
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let file_name = entry?.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".yaml") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================
