//! Weighted Gaussian kernel density estimation in two dimensions.
//!
//! The kernel covariance is the weighted, unbiased covariance of the data
//! scaled by the square of an explicit bandwidth factor. No bandwidth rule of
//! thumb is applied implicitly, so fits are reproducible from the
//! configuration alone.
//!
//! For normalized weights `w`, the data covariance is
//! `Σ wᵢ (pᵢ - μ)(pᵢ - μ)ᵀ / (1 - Σ wᵢ²)`, which reduces to the usual
//! `N - 1` denominator when all weights are equal.

use std::f64::consts::PI;

use geo::Coord;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{EstimateError, Result};

/// Minimum number of points a density fit accepts.
pub const MIN_POINTS: usize = 2;

/// Which covariance terms the kernel keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelCovariance {
    /// Per-axis variances only (axis-aligned product kernel).
    #[default]
    Diagonal,
    /// Full 2x2 covariance, including the x/y correlation term.
    Full,
}

/// Kernel parameters for a density fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Factor applied to the data standard deviation.
    /// Default: 0.1
    pub bandwidth: f64,
    /// Default: [`KernelCovariance::Diagonal`]
    pub covariance: KernelCovariance,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            bandwidth: 0.1,
            covariance: KernelCovariance::Diagonal,
        }
    }
}

impl KernelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(EstimateError::InvalidKernelWidth(self.bandwidth));
        }
        Ok(())
    }
}

/// A fitted kernel density surface.
///
/// Only points with non-zero weight are retained; they carry all the mass.
#[derive(Debug, Clone)]
pub struct DensityModel {
    centers: Vec<Coord<f64>>,
    weights: Vec<f64>,
    /// Kernel covariance `[[xx, xy], [xy, yy]]`
    covariance: [[f64; 2]; 2],
    inv_xx: f64,
    inv_xy: f64,
    inv_yy: f64,
    norm: f64,
    effective_sample_size: f64,
    bandwidth: f64,
}

impl DensityModel {
    /// Fit a density model to `points`.
    ///
    /// `weights`, when given, must be index-aligned with `points`, finite,
    /// non-negative and not all zero. `None` means uniform weighting.
    pub fn fit(
        points: &[Coord<f64>],
        weights: Option<&[f64]>,
        config: &KernelConfig,
    ) -> Result<Self> {
        if points.len() < MIN_POINTS {
            return Err(EstimateError::InsufficientPoints {
                point_count: points.len(),
                minimum_required: MIN_POINTS,
            });
        }
        config.validate()?;

        let normalized = normalize_weights(points.len(), weights)?;

        let sum_sq: f64 = normalized.iter().map(|w| w * w).sum();
        let effective_sample_size = 1.0 / sum_sq;
        let dof_factor = 1.0 - sum_sq;
        if dof_factor <= f64::EPSILON {
            return Err(EstimateError::DegenerateCovariance {
                reason: "all weight rests on a single point".to_string(),
            });
        }

        let (mean_x, mean_y) = points
            .iter()
            .zip(&normalized)
            .fold((0.0, 0.0), |(mx, my), (p, w)| (mx + w * p.x, my + w * p.y));

        let (mut cxx, mut cxy, mut cyy) = (0.0, 0.0, 0.0);
        for (p, w) in points.iter().zip(&normalized) {
            let dx = p.x - mean_x;
            let dy = p.y - mean_y;
            cxx += w * dx * dx;
            cxy += w * dx * dy;
            cyy += w * dy * dy;
        }
        let scale = config.bandwidth * config.bandwidth / dof_factor;
        cxx *= scale;
        cyy *= scale;
        cxy = match config.covariance {
            KernelCovariance::Diagonal => 0.0,
            KernelCovariance::Full => cxy * scale,
        };

        if cxx <= 0.0 {
            return Err(EstimateError::DegenerateCovariance {
                reason: "weighted points have no spread along x".to_string(),
            });
        }
        if cyy <= 0.0 {
            return Err(EstimateError::DegenerateCovariance {
                reason: "weighted points have no spread along y".to_string(),
            });
        }
        let det = cxx * cyy - cxy * cxy;
        if !(det.is_finite() && det > 0.0) {
            return Err(EstimateError::DegenerateCovariance {
                reason: format!("covariance determinant is {det}, points are collinear"),
            });
        }

        let (centers, weights): (Vec<Coord<f64>>, Vec<f64>) = points
            .iter()
            .zip(normalized)
            .filter(|(_, w)| *w > 0.0)
            .map(|(p, w)| (*p, w))
            .unzip();

        debug!(
            "[Density] Fitted {} weighted centers (n_eff={:.1}), kernel sigma=({:.4}, {:.4}), cov_xy={:.4}",
            centers.len(),
            effective_sample_size,
            cxx.sqrt(),
            cyy.sqrt(),
            cxy
        );

        Ok(Self {
            centers,
            weights,
            covariance: [[cxx, cxy], [cxy, cyy]],
            inv_xx: cyy / det,
            inv_xy: -cxy / det,
            inv_yy: cxx / det,
            norm: 1.0 / (2.0 * PI * det.sqrt()),
            effective_sample_size,
            bandwidth: config.bandwidth,
        })
    }

    /// Density at a single coordinate.
    pub fn density_at(&self, query: Coord<f64>) -> f64 {
        let sum: f64 = self
            .centers
            .iter()
            .zip(&self.weights)
            .map(|(c, w)| {
                let dx = query.x - c.x;
                let dy = query.y - c.y;
                let mahalanobis =
                    dx * dx * self.inv_xx + 2.0 * dx * dy * self.inv_xy + dy * dy * self.inv_yy;
                w * (-0.5 * mahalanobis).exp()
            })
            .sum();
        sum * self.norm
    }

    /// Density at each query coordinate, in query order.
    pub fn evaluate(&self, queries: &[Coord<f64>]) -> Vec<f64> {
        queries.iter().map(|q| self.density_at(*q)).collect()
    }

    /// `1 / Σ wᵢ²` for the normalized weights.
    pub fn effective_sample_size(&self) -> f64 {
        self.effective_sample_size
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Kernel covariance `[[xx, xy], [xy, yy]]`.
    pub fn kernel_covariance(&self) -> [[f64; 2]; 2] {
        self.covariance
    }

    /// Number of points carrying non-zero weight.
    pub fn center_count(&self) -> usize {
        self.centers.len()
    }
}

/// Validate weights and scale them to sum to one.
fn normalize_weights(point_count: usize, weights: Option<&[f64]>) -> Result<Vec<f64>> {
    let Some(weights) = weights else {
        return Ok(vec![1.0 / point_count as f64; point_count]);
    };

    if weights.len() != point_count {
        return Err(EstimateError::WeightLengthMismatch {
            weight_count: weights.len(),
            point_count,
        });
    }
    validate_weights(weights)?;

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(EstimateError::ZeroWeightSum);
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

/// Every weight must be finite and non-negative.
pub(crate) fn validate_weights(weights: &[f64]) -> Result<()> {
    match weights
        .iter()
        .enumerate()
        .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
    {
        Some((index, &value)) => Err(EstimateError::InvalidWeight { index, value }),
        None => Ok(()),
    }
}
