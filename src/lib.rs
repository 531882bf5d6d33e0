//! # Stop Finder
//!
//! Bus-stop location estimation from noisy crowd-sourced position samples.
//!
//! This library provides:
//! - Weighted Gaussian kernel density estimation over 2-D point sets
//! - Grid evaluation of the density surface
//! - Candidate stop extraction as joint row/column local maxima
//! - A caching [`Estimator`] that drives the whole pipeline
//! - Optional street snapping with explicit per-point outcomes
//! - Point-to-route distance reduction (plain and R-tree indexed)
//!
//! ## Features
//!
//! - **`parallel`** - Evaluate density grids and snap candidates with rayon
//! - **`synthetic`** - Seeded generator of noisy pings around known stops
//! - **`http`** - OSRM-backed street snapper
//! - **`cli`** - `stopfinder-cli` debug binary
//!
//! ## Quick Start
//!
//! ```rust
//! use stopfinder::{EstimateConfig, Estimator};
//!
//! // Two clusters of pings, around x=3 y=2 and x=7 y=8, inside a 10x10 extent
//! let pings = vec![
//!     (0.0, 0.0),
//!     (3.0, 2.0), (3.3, 2.1), (2.8, 2.25), (3.1, 1.7), (2.85, 1.9),
//!     (7.0, 8.0), (7.3, 8.1), (6.8, 8.25), (7.1, 7.7), (6.85, 7.9),
//!     (10.0, 10.0),
//! ];
//!
//! let mut estimator = Estimator::new(&pings).unwrap();
//! let config = EstimateConfig {
//!     resolution: 50,
//!     ..EstimateConfig::default()
//! };
//!
//! let stops = estimator.estimate_stops(&config).unwrap();
//! assert_eq!(stops.len(), 2);
//! // Stops come back as (latitude, longitude) = (y, x)
//! assert!((stops[0].latitude - 2.0).abs() < 0.2);
//! assert!((stops[0].longitude - 3.0).abs() < 0.2);
//! for stop in &stops {
//!     println!("stop at lat={:.2} lng={:.2}", stop.latitude, stop.longitude);
//! }
//! ```

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{EstimateError, OptionExt, Result, SnapError};

// Weighted Gaussian kernel density estimation
pub mod density;
pub use density::{DensityModel, KernelConfig, KernelCovariance};

// Sample grids and evaluated density surfaces
pub mod grid;
pub use grid::{DensitySurface, SampleGrid, linspace};

// Joint row/column local maxima extraction
pub mod maxima;
pub use maxima::extract_candidates;

// Orchestration with cached density surfaces
pub mod estimator;
pub use estimator::{Estimator, SurfaceCache, SurfaceKey};

// Street snapping seam and batch outcomes
pub mod snapping;
pub use snapping::{SnapBatch, SnapOutcome, StreetSnapper, snap_all};

// Point-to-route distances
pub mod routes;
pub use routes::{RouteGeometry, RouteIndex, route_distances};

// OSRM client for street snapping
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::{OsrmSnapper, SnapConfig};

// Synthetic crowd data for tests and benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A coordinate in (latitude, longitude) order.
///
/// This is the order in which estimated stops are handed back to callers:
/// latitude carries the internal `y` axis and longitude the internal `x` axis.
///
/// # Example
/// ```
/// use stopfinder::GpsPoint;
/// let point = GpsPoint::new(-6.7924, 39.2083); // Dar es Salaam
/// assert_eq!(point.as_tuple(), (-6.7924, 39.2083));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// The point as a `(latitude, longitude)` pair, i.e. `(y, x)`.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Anything that exposes a planar (x, y) coordinate.
///
/// Input geometries only need this capability; no particular geometry library
/// is required.
pub trait PointGeometry {
    fn x(&self) -> f64;
    fn y(&self) -> f64;

    fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x(),
            y: self.y(),
        }
    }
}

impl PointGeometry for Coord<f64> {
    fn x(&self) -> f64 {
        self.x
    }
    fn y(&self) -> f64 {
        self.y
    }
}

impl PointGeometry for Point<f64> {
    fn x(&self) -> f64 {
        Point::x(*self)
    }
    fn y(&self) -> f64 {
        Point::y(*self)
    }
}

impl PointGeometry for (f64, f64) {
    fn x(&self) -> f64 {
        self.0
    }
    fn y(&self) -> f64 {
        self.1
    }
}

impl PointGeometry for [f64; 2] {
    fn x(&self) -> f64 {
        self[0]
    }
    fn y(&self) -> f64 {
        self[1]
    }
}

/// Longitude is the x axis, latitude the y axis.
impl PointGeometry for GpsPoint {
    fn x(&self) -> f64 {
        self.longitude
    }
    fn y(&self) -> f64 {
        self.latitude
    }
}

impl<T: PointGeometry> PointGeometry for &T {
    fn x(&self) -> f64 {
        (**self).x()
    }
    fn y(&self) -> f64 {
        (**self).y()
    }
}

/// Axis-aligned extent of a point set: `(xmin, xmax, ymin, ymax)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundaries {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Boundaries {
    /// Compute boundaries from coordinates. Returns `None` for an empty slice.
    pub fn from_coords(coords: &[Coord<f64>]) -> Option<Self> {
        if coords.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;

        for c in coords {
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
            min_y = min_y.min(c.y);
            max_y = max_y.max(c.y);
        }

        Some(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// The boundaries as `(xmin, xmax, ymin, ymax)`.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.max_x, self.min_y, self.max_y)
    }

    /// Inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A grid cell that is a local maximum along both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidatePoint {
    pub x: f64,
    pub y: f64,
    /// Density value at the cell
    pub density: f64,
}

impl CandidatePoint {
    /// Swap into the caller-facing `(latitude, longitude) = (y, x)` order.
    pub fn to_gps_point(&self) -> GpsPoint {
        GpsPoint::new(self.y, self.x)
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// Configuration for [`Estimator::estimate_stops`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateConfig {
    /// Use the estimator's weight vector. With no weights set this is
    /// identical to uniform weighting.
    /// Default: true
    pub weighted: bool,

    /// Width and height of the evaluation grid.
    /// Default: 100
    pub resolution: usize,

    /// Bandwidth factor applied to the data covariance.
    /// Larger values give smoother surfaces with fewer, merged modes.
    /// Default: 0.1
    pub kernel_width: f64,

    /// Which covariance terms the kernel keeps.
    /// Default: [`KernelCovariance::Diagonal`]
    pub covariance: KernelCovariance,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            weighted: true,
            resolution: 100,
            kernel_width: 0.1,
            covariance: KernelCovariance::Diagonal,
        }
    }
}

impl EstimateConfig {
    /// Check the grid and bandwidth parameters.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(EstimateError::InvalidResolution(self.resolution));
        }
        self.kernel().validate()
    }

    /// The kernel part of this configuration.
    pub fn kernel(&self) -> KernelConfig {
        KernelConfig {
            bandwidth: self.kernel_width,
            covariance: self.covariance,
        }
    }
}
