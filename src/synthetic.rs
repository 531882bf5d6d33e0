//! Synthetic crowd data generator for tests and benchmarks.
//!
//! Generates noisy pings scattered around known stop locations, plus optional
//! uniform background pings, so estimates can be checked against ground
//! truth.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use stopfinder::synthetic::{StopScenario, SyntheticStop};
//!
//! let scenario = StopScenario {
//!     stops: vec![
//!         SyntheticStop::new(0.0, 0.0, 40),
//!         SyntheticStop::new(10.0, 4.0, 40),
//!     ],
//!     noise_sigma: 0.3,
//!     background_pings: 10,
//!     background_weight: 0.1,
//!     seed: 42,
//! };
//!
//! let dataset = scenario.generate();
//! assert_eq!(dataset.points.len(), 90);
//! assert_eq!(dataset.weights.len(), 90);
//! ```

use std::f64::consts::PI;

use geo::{Coord, LineString};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Types
// ============================================================================

/// A ground-truth stop and how many pings it produces.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticStop {
    pub center: Coord<f64>,
    pub pings: usize,
    /// Weight assigned to each of this stop's pings.
    pub weight: f64,
}

impl SyntheticStop {
    /// A stop at `(x, y)` with unit-weight pings.
    pub fn new(x: f64, y: f64, pings: usize) -> Self {
        Self {
            center: Coord { x, y },
            pings,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Scenario configuration for generating synthetic data.
#[derive(Debug, Clone)]
pub struct StopScenario {
    /// Ground-truth stops.
    pub stops: Vec<SyntheticStop>,
    /// Standard deviation of ping noise around each stop.
    pub noise_sigma: f64,
    /// Number of pings spread uniformly over the stops' extent.
    pub background_pings: usize,
    /// Weight assigned to each background ping.
    pub background_weight: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// Metadata about a generated dataset.
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    pub total_points: usize,
    pub stop_points: usize,
    pub background_points: usize,
}

/// A complete synthetic dataset with ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    /// Pings, stop pings first (in stop order), then background pings.
    pub points: Vec<Coord<f64>>,
    /// Weight per ping, index-aligned with `points`.
    pub weights: Vec<f64>,
    /// Ground-truth stop locations.
    pub stops: Vec<Coord<f64>>,
    pub metadata: DatasetMetadata,
}

impl SyntheticDataset {
    /// A route visiting the stops in order.
    pub fn route(&self) -> LineString<f64> {
        LineString::new(self.stops.clone())
    }

    /// Distance from `point` to the closest ground-truth stop.
    pub fn nearest_stop_distance(&self, point: Coord<f64>) -> f64 {
        self.stops
            .iter()
            .map(|s| ((s.x - point.x).powi(2) + (s.y - point.y).powi(2)).sqrt())
            .fold(f64::INFINITY, f64::min)
    }
}

// ============================================================================
// Noise Helpers
// ============================================================================

/// Box-Muller transform: two independent standard normal samples.
fn gaussian_pair(rng: &mut StdRng) -> (f64, f64) {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    let r = (-2.0 * u1.ln()).sqrt();
    (r * (2.0 * PI * u2).cos(), r * (2.0 * PI * u2).sin())
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl StopScenario {
    /// Generate a complete synthetic dataset from this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let stop_points: usize = self.stops.iter().map(|s| s.pings).sum();
        let total_points = stop_points + self.background_pings;
        let mut points = Vec::with_capacity(total_points);
        let mut weights = Vec::with_capacity(total_points);

        for stop in &self.stops {
            for _ in 0..stop.pings {
                let (dx, dy) = gaussian_pair(&mut rng);
                points.push(Coord {
                    x: stop.center.x + dx * self.noise_sigma,
                    y: stop.center.y + dy * self.noise_sigma,
                });
                weights.push(stop.weight);
            }
        }

        if self.background_pings > 0 && !self.stops.is_empty() {
            let (min_x, max_x, min_y, max_y) = self.stops.iter().fold(
                (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
                |(a, b, c, d), s| {
                    (
                        a.min(s.center.x),
                        b.max(s.center.x),
                        c.min(s.center.y),
                        d.max(s.center.y),
                    )
                },
            );
            // Pad degenerate extents so the ranges are never empty
            let pad = self.noise_sigma.max(1e-6);
            for _ in 0..self.background_pings {
                points.push(Coord {
                    x: rng.gen_range((min_x - pad)..(max_x + pad)),
                    y: rng.gen_range((min_y - pad)..(max_y + pad)),
                });
                weights.push(self.background_weight);
            }
        }

        SyntheticDataset {
            metadata: DatasetMetadata {
                total_points: points.len(),
                stop_points,
                background_points: points.len() - stop_points,
            },
            points,
            weights,
            stops: self.stops.iter().map(|s| s.center).collect(),
        }
    }
}

// ============================================================================
// Predefined Scenarios
// ============================================================================

impl StopScenario {
    /// Two well-separated stops, no background. Baseline scenario.
    pub fn two_stops() -> Self {
        Self {
            stops: vec![
                SyntheticStop::new(0.0, 0.0, 50),
                SyntheticStop::new(10.0, 10.0, 50),
            ],
            noise_sigma: 0.3,
            background_pings: 0,
            background_weight: 0.0,
            seed: 42,
        }
    }

    /// Stops along a zig-zag line every `spacing` units, with background
    /// noise. Used for scaling benchmarks.
    pub fn corridor(stop_count: usize, spacing: f64, pings_per_stop: usize) -> Self {
        Self {
            stops: (0..stop_count)
                .map(|i| {
                    let y = if i % 2 == 0 { 0.0 } else { spacing / 2.0 };
                    SyntheticStop::new(i as f64 * spacing, y, pings_per_stop)
                })
                .collect(),
            noise_sigma: spacing / 20.0,
            background_pings: stop_count * pings_per_stop / 10,
            background_weight: 0.5,
            seed: 7,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
