//! Street snapping with explicit per-point outcomes.
//!
//! Each candidate is looked up independently. A failed lookup is recorded as
//! [`SnapOutcome::Failed`] and never aborts the batch; callers decide whether
//! to retry, drop, or fall back via [`SnapBatch::resolve`].

use log::{debug, warn};

use crate::GpsPoint;
use crate::error::SnapError;

/// Moves a coordinate onto the nearest street.
///
/// Lookups may run concurrently, so implementations must be thread-safe.
pub trait StreetSnapper: Send + Sync {
    fn snap(&self, point: &GpsPoint) -> Result<GpsPoint, SnapError>;
}

impl<F> StreetSnapper for F
where
    F: Fn(&GpsPoint) -> Result<GpsPoint, SnapError> + Send + Sync,
{
    fn snap(&self, point: &GpsPoint) -> Result<GpsPoint, SnapError> {
        self(point)
    }
}

/// Result of snapping one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapOutcome {
    Snapped {
        original: GpsPoint,
        snapped: GpsPoint,
    },
    Failed {
        original: GpsPoint,
        error: SnapError,
    },
}

impl SnapOutcome {
    /// The unsnapped candidate.
    pub fn original(&self) -> GpsPoint {
        match self {
            SnapOutcome::Snapped { original, .. } | SnapOutcome::Failed { original, .. } => {
                *original
            }
        }
    }

    pub fn is_snapped(&self) -> bool {
        matches!(self, SnapOutcome::Snapped { .. })
    }

    /// The snapped point, or the unsnapped candidate as sentinel on failure.
    pub fn resolved(&self) -> GpsPoint {
        match self {
            SnapOutcome::Snapped { snapped, .. } => *snapped,
            SnapOutcome::Failed { original, .. } => *original,
        }
    }

    pub fn error(&self) -> Option<&SnapError> {
        match self {
            SnapOutcome::Snapped { .. } => None,
            SnapOutcome::Failed { error, .. } => Some(error),
        }
    }
}

/// Ordered outcomes of snapping a batch of candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapBatch {
    outcomes: Vec<SnapOutcome>,
}

impl SnapBatch {
    pub fn outcomes(&self) -> &[SnapOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<SnapOutcome> {
        self.outcomes
    }

    /// One point per candidate, substituting the unsnapped candidate for
    /// every failed lookup.
    pub fn resolve(&self) -> Vec<GpsPoint> {
        self.outcomes.iter().map(SnapOutcome::resolved).collect()
    }

    /// Failed outcomes, in batch order.
    pub fn failures(&self) -> impl Iterator<Item = &SnapOutcome> {
        self.outcomes.iter().filter(|o| !o.is_snapped())
    }

    pub fn snapped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_snapped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.snapped_count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

fn snap_one<S: StreetSnapper + ?Sized>(point: &GpsPoint, snapper: &S) -> SnapOutcome {
    match snapper.snap(point) {
        Ok(snapped) => SnapOutcome::Snapped {
            original: *point,
            snapped,
        },
        Err(error) => {
            warn!(
                "[Snapping] Lookup failed for ({:.6}, {:.6}): {}",
                point.latitude, point.longitude, error
            );
            SnapOutcome::Failed {
                original: *point,
                error,
            }
        }
    }
}

/// Snap every point independently, keeping input order.
pub fn snap_all<S: StreetSnapper + ?Sized>(points: &[GpsPoint], snapper: &S) -> SnapBatch {
    #[cfg(feature = "parallel")]
    let outcomes: Vec<SnapOutcome> = {
        use rayon::prelude::*;
        points.par_iter().map(|p| snap_one(p, snapper)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<SnapOutcome> = points.iter().map(|p| snap_one(p, snapper)).collect();

    let batch = SnapBatch { outcomes };
    debug!(
        "[Snapping] {}/{} candidates snapped",
        batch.snapped_count(),
        batch.len()
    );
    batch
}
