//! Regular sample grids and density surfaces evaluated on them.
//!
//! Grids are stored row-major: the row index walks the y samples and the
//! column index walks the x samples.

use geo::Coord;

use crate::Boundaries;
use crate::density::DensityModel;
use crate::error::{EstimateError, Result};

/// `n` evenly spaced samples from `start` to `end`, both inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// A `resolution x resolution` grid of sample coordinates spanning some
/// boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    boundaries: Boundaries,
}

impl SampleGrid {
    pub fn new(boundaries: Boundaries, resolution: usize) -> Result<Self> {
        if resolution == 0 {
            return Err(EstimateError::InvalidResolution(resolution));
        }
        Ok(Self {
            xs: linspace(boundaries.min_x, boundaries.max_x, resolution),
            ys: linspace(boundaries.min_y, boundaries.max_y, resolution),
            boundaries,
        })
    }

    pub fn resolution(&self) -> usize {
        self.xs.len()
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Sample positions along x (one per column).
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Sample positions along y (one per row).
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Coordinate of the cell at `(row, col)`.
    pub fn coord(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: self.xs[col],
            y: self.ys[row],
        }
    }

    /// Coordinates of one grid row.
    pub fn row_coords(&self, row: usize) -> Vec<Coord<f64>> {
        let y = self.ys[row];
        self.xs.iter().map(|&x| Coord { x, y }).collect()
    }
}

/// Density values over a [`SampleGrid`], row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DensitySurface {
    grid: SampleGrid,
    values: Vec<f64>,
}

impl DensitySurface {
    /// Wrap precomputed values. `values.len()` must be `resolution²`.
    pub fn from_values(grid: SampleGrid, values: Vec<f64>) -> Option<Self> {
        let n = grid.resolution();
        (values.len() == n * n).then_some(Self { grid, values })
    }

    /// Evaluate `model` at every grid cell.
    pub fn evaluate(model: &DensityModel, grid: SampleGrid) -> Self {
        let rows = grid.resolution();

        #[cfg(feature = "parallel")]
        let values: Vec<f64> = {
            use rayon::prelude::*;
            (0..rows)
                .into_par_iter()
                .flat_map_iter(|row| model.evaluate(&grid.row_coords(row)))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let values: Vec<f64> = (0..rows)
            .flat_map(|row| model.evaluate(&grid.row_coords(row)))
            .collect();

        Self { grid, values }
    }

    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    pub fn resolution(&self) -> usize {
        self.grid.resolution()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.resolution() + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.resolution();
        &self.values[row * n..(row + 1) * n]
    }

    /// Highest cell as `(row, col, value)`. The first one wins on ties.
    pub fn peak(&self) -> Option<(usize, usize, f64)> {
        let n = self.resolution();
        self.values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, v)| (i / n, i % n, v))
    }

    /// Coordinate of the highest cell.
    pub fn peak_coord(&self) -> Option<Coord<f64>> {
        self.peak().map(|(row, col, _)| self.grid.coord(row, col))
    }
}
