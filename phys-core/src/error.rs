//! Error type for invalid engine input.
//!
//! The engine performs no I/O, so every error here is a caller-side logic
//! error: a rejected parameter or a query against the wrong contact or
//! partition. Nothing is retried and nothing is clamped.

use thiserror::Error;

use crate::body::BodyHandle;

/// Errors returned by constructors, setters and lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysError {
    #[error("mass should be > 0, got {0}")]
    InvalidMass(f64),

    #[error("bounciness should be in [0, 1], got {0}")]
    InvalidBounciness(f64),

    #[error("{what} should be > 0, got {value}")]
    InvalidDimension { what: &'static str, value: f64 },

    #[error("time step should be > 0, got {0}")]
    InvalidTimeStep(f64),

    #[error("invalid curve parameter: {0}")]
    InvalidCurve(&'static str),

    #[error("world bounds should be finite with size > 0 on both axes, got size ({width}, {height})")]
    InvalidWorldBounds { width: f64, height: f64 },

    #[error("partition grid needs at least one column and one row, got {columns}x{rows}")]
    InvalidGrid { columns: usize, rows: usize },

    #[error("body {0:?} is not part of this contact")]
    NotInContact(BodyHandle),

    #[error("partition index {index} out of range (world has {count} partitions)")]
    PartitionOutOfRange { index: usize, count: usize },
}

/// Reject non-positive (or NaN) sizes.
pub(crate) fn positive(what: &'static str, value: f64) -> Result<f64, PhysError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(PhysError::InvalidDimension { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rejects_zero_and_nan() {
        assert_eq!(positive("radius", 2.0), Ok(2.0));
        assert!(matches!(
            positive("radius", 0.0),
            Err(PhysError::InvalidDimension { what: "radius", .. })
        ));
        assert!(positive("width", -1.0).is_err());
        assert!(positive("width", f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PhysError::InvalidMass(0.0).to_string(),
            "mass should be > 0, got 0"
        );
        assert_eq!(
            PhysError::PartitionOutOfRange { index: 9, count: 4 }.to_string(),
            "partition index 9 out of range (world has 4 partitions)"
        );
    }
}
