//! Candidate extraction as joint row/column local maxima.
//!
//! A cell is a relative maximum along an axis when it is strictly greater
//! than both neighbours on that axis. Cells on the grid border lack one of the
//! neighbours and never qualify; plateaus of equal values never qualify.
//!
//! A candidate must be a relative maximum when scanning across its row *and*
//! when scanning down its column. A single-axis test would also flag every
//! cell on a ridge.

use crate::CandidatePoint;
use crate::grid::DensitySurface;

/// Scan direction for relative maxima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAxis {
    /// Compare with the cells above and below.
    Columns,
    /// Compare with the cells left and right.
    Rows,
}

/// Row-major mask of cells that are strict relative maxima along `axis` on
/// an `n x n` grid.
pub fn relative_maxima_mask(values: &[f64], n: usize, axis: ScanAxis) -> Vec<bool> {
    debug_assert_eq!(values.len(), n * n);
    let mut mask = vec![false; values.len()];
    if n < 3 {
        return mask;
    }

    let stride = match axis {
        ScanAxis::Columns => n,
        ScanAxis::Rows => 1,
    };

    for row in 0..n {
        for col in 0..n {
            let interior = match axis {
                ScanAxis::Columns => row > 0 && row < n - 1,
                ScanAxis::Rows => col > 0 && col < n - 1,
            };
            if !interior {
                continue;
            }
            let i = row * n + col;
            let v = values[i];
            mask[i] = v > values[i - stride] && v > values[i + stride];
        }
    }
    mask
}

/// Extract candidate stops from an evaluated surface, in row-major order.
pub fn extract_candidates(surface: &DensitySurface) -> Vec<CandidatePoint> {
    let n = surface.resolution();
    let values = surface.values();
    let across_rows = relative_maxima_mask(values, n, ScanAxis::Rows);
    let down_columns = relative_maxima_mask(values, n, ScanAxis::Columns);

    across_rows
        .iter()
        .zip(&down_columns)
        .enumerate()
        .filter(|(_, (r, c))| **r && **c)
        .map(|(i, _)| {
            let coord = surface.grid().coord(i / n, i % n);
            CandidatePoint {
                x: coord.x,
                y: coord.y,
                density: values[i],
            }
        })
        .collect()
}
