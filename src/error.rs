//! Unified error handling.
//!
//! Two error families exist:
//! - [`EstimateError`] - invalid input, always surfaced to the caller.
//! - [`SnapError`] - a failed street lookup for a single candidate. These are
//!   recorded per point and never abort a batch.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EstimateError>;

/// Invalid input detected before or during estimation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("density estimation needs at least {minimum_required} points, got {point_count} points")]
    InsufficientPoints {
        point_count: usize,
        minimum_required: usize,
    },

    #[error("geometry at index {index} has a non-finite coordinate ({x}, {y})")]
    MalformedGeometry { index: usize, x: f64, y: f64 },

    #[error("weight vector has {weight_count} entries but there are {point_count} points")]
    WeightLengthMismatch {
        weight_count: usize,
        point_count: usize,
    },

    #[error("weight at index {index} must be finite and non-negative, got {value}")]
    InvalidWeight { index: usize, value: f64 },

    #[error("weights sum to zero")]
    ZeroWeightSum,

    #[error("kernel covariance is degenerate: {reason}")]
    DegenerateCovariance { reason: String },

    #[error("grid resolution must be at least 1, got {0}")]
    InvalidResolution(usize),

    #[error("kernel width must be finite and positive, got {0}")]
    InvalidKernelWidth(f64),

    #[error("route collection is empty")]
    EmptyRoutes,
}

/// Failure of the street snapping collaborator for one candidate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response has no `{0}` field")]
    MissingField(&'static str),
}

/// Extension trait for converting empty options into estimation errors.
pub trait OptionExt<T> {
    /// Map `None` to [`EstimateError::InsufficientPoints`].
    fn ok_or_insufficient_points(self, point_count: usize, minimum_required: usize) -> Result<T>;

    /// Map `None` to [`EstimateError::EmptyRoutes`].
    fn ok_or_empty_routes(self) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(self, point_count: usize, minimum_required: usize) -> Result<T> {
        self.ok_or(EstimateError::InsufficientPoints {
            point_count,
            minimum_required,
        })
    }

    fn ok_or_empty_routes(self) -> Result<T> {
        self.ok_or(EstimateError::EmptyRoutes)
    }
}
