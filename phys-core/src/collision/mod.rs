//! Contact detection and collision response.
//!
//! - **Detection**: deciding whether two bodies touch, how (hit or overlap)
//!   and from which direction
//! - **Resolution**: computing post-hit velocities
//!
//! ## Direction heuristic
//!
//! Shapes are not separated along a minimum translation vector. Instead
//! both shapes are shrunk slightly and the axis on which they stop
//! overlapping is taken as the contact side:
//!
//! ```text
//!   ┌─────┐                 ┌────┐
//!   │  A ┌┼────┐    shrink   │ A  │┌───┐
//!   │    ││ B  │   ───────→  │    ││ B │   separated on X → direction ±X
//!   └────┼┘    │             └────┘└───┘
//!        └─────┘
//! ```
//!
//! When the shrunk shapes still overlap on both axes the direction is
//! unknown (zero) and no velocity response is applied.

pub mod detection;
pub mod resolution;

pub use detection::*;
pub use resolution::*;
