//! # Stop Estimator
//!
//! Holds the point set and weights and drives the estimation pipeline:
//!
//! 1. Build a `resolution x resolution` grid over the point boundaries
//! 2. Fit the density model and evaluate it on the grid (cached)
//! 3. Extract joint row/column maxima as candidate stops
//! 4. Optionally snap candidates to the street network
//!
//! ## Caching
//!
//! Every mutation of points or weights bumps an input generation counter.
//! The cached surface is stored with the generation and request parameters
//! it was computed for (see [`SurfaceCache`]) and is only reused when they
//! all match.

pub mod surface_cache;

pub use surface_cache::{SurfaceCache, SurfaceKey};

use geo::Coord;
use log::{debug, info};

use crate::density::{DensityModel, MIN_POINTS, validate_weights};
use crate::error::{EstimateError, OptionExt, Result};
use crate::grid::{DensitySurface, SampleGrid};
use crate::maxima::extract_candidates;
use crate::routes::{RouteGeometry, RouteIndex, route_distances};
use crate::snapping::{SnapBatch, StreetSnapper, snap_all};
use crate::{Boundaries, CandidatePoint, EstimateConfig, GpsPoint, PointGeometry};

/// Bus-stop estimator over an in-memory point set.
#[derive(Debug)]
pub struct Estimator {
    points: Vec<Coord<f64>>,
    weights: Option<Vec<f64>>,
    boundaries: Boundaries,
    generation: u64,
    cache: SurfaceCache,
}

impl Estimator {
    /// Create an estimator over `points` with uniform weights.
    pub fn new<G: PointGeometry>(points: &[G]) -> Result<Self> {
        let points = extract_coords(points)?;
        let boundaries = Boundaries::from_coords(&points).ok_or_insufficient_points(0, MIN_POINTS)?;
        Ok(Self {
            points,
            weights: None,
            boundaries,
            generation: 0,
            cache: SurfaceCache::new(),
        })
    }

    /// Create an estimator with per-point weights.
    pub fn with_weights<G: PointGeometry>(points: &[G], weights: Vec<f64>) -> Result<Self> {
        let mut estimator = Self::new(points)?;
        estimator.set_weights(Some(weights))?;
        Ok(estimator)
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Replace the point set and recompute the boundaries.
    ///
    /// On error the estimator is left unchanged.
    pub fn set_points<G: PointGeometry>(&mut self, points: &[G]) -> Result<()> {
        let points = extract_coords(points)?;
        self.boundaries = Boundaries::from_coords(&points).ok_or_insufficient_points(0, MIN_POINTS)?;
        self.points = points;
        self.generation += 1;
        Ok(())
    }

    /// Replace the weight vector; `None` restores uniform weighting.
    ///
    /// Each weight must be finite and non-negative. The length is checked
    /// against the point set when a weighted estimate is requested.
    pub fn set_weights(&mut self, weights: Option<Vec<f64>>) -> Result<()> {
        if let Some(w) = &weights {
            validate_weights(w)?;
        }
        self.weights = weights;
        self.generation += 1;
        Ok(())
    }

    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Input generation, bumped by every call to a setter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The last computed surface, if it was computed from the current inputs.
    pub fn density_surface(&self) -> Option<&DensitySurface> {
        self.cache
            .key()
            .filter(|k| k.generation == self.generation)
            .and_then(|k| self.cache.get(k))
    }

    pub fn cache(&self) -> &SurfaceCache {
        &self.cache
    }

    // ========================================================================
    // Estimation
    // ========================================================================

    /// Density surface for `config`, computed on demand.
    pub fn surface(&mut self, config: &EstimateConfig) -> Result<&DensitySurface> {
        config.validate()?;
        let key = SurfaceKey::new(self.generation, config);
        if self.cache.is_fresh(&key) {
            debug!("[Estimator] Reusing cached surface (generation {})", key.generation);
        }

        let points = &self.points;
        let weights = if config.weighted {
            self.weights.as_deref()
        } else {
            None
        };
        let boundaries = self.boundaries;
        self.cache.get_or_try_compute(key, || {
            let model = DensityModel::fit(points, weights, &config.kernel())?;
            let grid = SampleGrid::new(boundaries, config.resolution)?;
            Ok(DensitySurface::evaluate(&model, grid))
        })
    }

    /// Candidate cells in internal `(x, y)` order with their density.
    pub fn candidates(&mut self, config: &EstimateConfig) -> Result<Vec<CandidatePoint>> {
        let surface = self.surface(config)?;
        let candidates = extract_candidates(surface);
        info!(
            "[Estimator] {} candidate stops from {} points on a {}x{} grid",
            candidates.len(),
            self.points.len(),
            config.resolution,
            config.resolution
        );
        Ok(candidates)
    }

    /// Estimate stop locations.
    ///
    /// Stops are returned in row-major grid order as `(latitude, longitude)`
    /// = `(y, x)` points.
    pub fn estimate_stops(&mut self, config: &EstimateConfig) -> Result<Vec<GpsPoint>> {
        Ok(self
            .candidates(config)?
            .iter()
            .map(CandidatePoint::to_gps_point)
            .collect())
    }

    /// Estimate stop locations and snap each one to the street network.
    ///
    /// A failed lookup only affects its own entry in the returned batch.
    pub fn estimate_stops_snapped<S>(
        &mut self,
        config: &EstimateConfig,
        snapper: &S,
    ) -> Result<SnapBatch>
    where
        S: StreetSnapper + ?Sized,
    {
        let stops = self.estimate_stops(config)?;
        Ok(snap_all(&stops, snapper))
    }

    // ========================================================================
    // Route distance
    // ========================================================================

    /// Minimum distance from each point to any of `routes`.
    pub fn route_dist<R: RouteGeometry>(&self, routes: &[R]) -> Result<Vec<f64>> {
        route_distances(&self.points, routes)
    }

    /// Same as [`Estimator::route_dist`] against a prebuilt R-tree.
    pub fn route_dist_indexed(&self, index: &RouteIndex) -> Vec<f64> {
        index.distances(&self.points)
    }
}

/// One finite coordinate per geometry, at least [`MIN_POINTS`] of them.
fn extract_coords<G: PointGeometry>(points: &[G]) -> Result<Vec<Coord<f64>>> {
    if points.len() < MIN_POINTS {
        return Err(EstimateError::InsufficientPoints {
            point_count: points.len(),
            minimum_required: MIN_POINTS,
        });
    }
    points
        .iter()
        .enumerate()
        .map(|(index, g)| {
            let c = g.coord();
            if c.x.is_finite() && c.y.is_finite() {
                Ok(c)
            } else {
                Err(EstimateError::MalformedGeometry {
                    index,
                    x: c.x,
                    y: c.y,
                })
            }
        })
        .collect()
}
