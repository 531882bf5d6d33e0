//! Tests for the estimation pipeline

use geo::{Coord, Point};
use stopfinder::{EstimateConfig, EstimateError, Estimator, GpsPoint, KernelCovariance};

const CLUSTER_OFFSETS: [(f64, f64); 5] = [(0.0, 0.0), (0.3, 0.1), (-0.2, 0.25), (0.1, -0.3), (-0.15, -0.1)];

fn cluster(cx: f64, cy: f64) -> Vec<Coord<f64>> {
    CLUSTER_OFFSETS
        .iter()
        .map(|(dx, dy)| Coord { x: cx + dx, y: cy + dy })
        .collect()
}

/// Corner anchors at (0,0) and (10,10) with clusters around (3,2) and (7,8).
fn two_cluster_points() -> Vec<Coord<f64>> {
    let mut points = vec![Coord { x: 0.0, y: 0.0 }];
    points.extend(cluster(3.0, 2.0));
    points.extend(cluster(7.0, 8.0));
    points.push(Coord { x: 10.0, y: 10.0 });
    points
}

/// Weights for [`two_cluster_points`] with the second cluster scaled by `second`.
fn cluster_weights(second: f64) -> Vec<f64> {
    let mut weights = vec![1.0; 6];
    weights.extend([second; 5]);
    weights.push(1.0);
    weights
}

fn config(resolution: usize) -> EstimateConfig {
    EstimateConfig {
        resolution,
        ..EstimateConfig::default()
    }
}

fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

#[test]
fn test_two_clusters_give_two_stops() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();

    for resolution in [30, 50, 100] {
        let stops = estimator.estimate_stops(&config(resolution)).unwrap();
        assert_eq!(stops.len(), 2, "resolution {}", resolution);
    }
}

#[test]
fn test_four_point_scenario() {
    // Two tight pairs near (0, 0) and (10, 10)
    let pings = [(0.0, 0.3), (0.3, 0.0), (10.0, 9.7), (9.7, 10.0)];
    let mut estimator = Estimator::new(&pings).unwrap();
    let stops = estimator.estimate_stops(&config(50)).unwrap();

    assert_eq!(stops.len(), 2);
    for (stop, centroid) in stops.iter().zip([0.15, 9.85]) {
        assert!(approx_eq(stop.latitude, centroid, 0.3), "{:?}", stop);
        assert!(approx_eq(stop.longitude, centroid, 0.3), "{:?}", stop);
    }
}

#[test]
fn test_clusters_on_the_extent_corners_give_no_stops() {
    // The grid spans the exact point extent, so each pair peaks on a border
    // cell, and border cells never qualify
    let pings = [(0.0, 0.0), (0.2, 0.1), (10.0, 10.0), (10.1, 9.9)];
    let mut estimator = Estimator::new(&pings).unwrap();

    for resolution in [30, 50, 100] {
        let stops = estimator.estimate_stops(&config(resolution)).unwrap();
        assert!(stops.is_empty(), "resolution {}: {:?}", resolution, stops);
    }
    let (row, col, _) = estimator.density_surface().unwrap().peak().unwrap();
    let on_border = |i: usize| i == 0 || i == 99;
    assert!(on_border(row) || on_border(col), "peak at ({}, {})", row, col);
}

#[test]
fn test_stops_are_returned_as_lat_lng() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let stops = estimator.estimate_stops(&config(50)).unwrap();

    // Cluster at x=3, y=2 comes back as latitude 2, longitude 3
    assert!(approx_eq(stops[0].latitude, 2.0, 0.2), "{:?}", stops[0]);
    assert!(approx_eq(stops[0].longitude, 3.0, 0.2), "{:?}", stops[0]);
    assert!(approx_eq(stops[1].latitude, 8.0, 0.2), "{:?}", stops[1]);
    assert!(approx_eq(stops[1].longitude, 7.0, 0.2), "{:?}", stops[1]);
}

#[test]
fn test_stops_follow_row_major_order() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let candidates = estimator.candidates(&config(50)).unwrap();
    assert_eq!(candidates.len(), 2);
    // Lower y (earlier row) first
    assert!(candidates[0].y < candidates[1].y);

    let stops = estimator.estimate_stops(&config(50)).unwrap();
    let swapped: Vec<GpsPoint> = candidates.iter().map(|c| c.to_gps_point()).collect();
    assert_eq!(stops, swapped);
}

#[test]
fn test_stops_lie_within_boundaries() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let b = *estimator.boundaries();
    assert_eq!(b.as_tuple(), (0.0, 10.0, 0.0, 10.0));

    for stop in estimator.estimate_stops(&config(80)).unwrap() {
        assert!(b.contains(stop.longitude, stop.latitude), "{:?}", stop);
    }
}

#[test]
fn test_repeated_estimates_are_identical() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let first = estimator.estimate_stops(&config(60)).unwrap();
    let second = estimator.estimate_stops(&config(60)).unwrap();

    assert_eq!(first, second);
    assert_eq!(estimator.cache().computations(), 1);
    assert_eq!(estimator.cache().hits(), 1);
}

#[test]
fn test_parameter_change_recomputes() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    estimator.estimate_stops(&config(40)).unwrap();
    estimator.estimate_stops(&config(60)).unwrap();
    assert_eq!(estimator.cache().computations(), 2);
    assert_eq!(estimator.density_surface().unwrap().resolution(), 60);

    let wider = EstimateConfig {
        kernel_width: 0.2,
        ..config(60)
    };
    estimator.estimate_stops(&wider).unwrap();
    assert_eq!(estimator.cache().computations(), 3);
}

#[test]
fn test_set_points_invalidates_surface() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let before = estimator.estimate_stops(&config(50)).unwrap();
    assert!(estimator.density_surface().is_some());

    // Shift everything by +5 in x
    let shifted: Vec<Coord<f64>> = two_cluster_points()
        .iter()
        .map(|c| Coord { x: c.x + 5.0, y: c.y })
        .collect();
    estimator.set_points(&shifted).unwrap();
    assert!(estimator.density_surface().is_none());

    let after = estimator.estimate_stops(&config(50)).unwrap();
    assert_eq!(estimator.cache().computations(), 2);
    assert_eq!(after.len(), before.len());
    for (a, b) in before.iter().zip(&after) {
        assert!(approx_eq(b.longitude - a.longitude, 5.0, 1e-9));
        assert!(approx_eq(b.latitude, a.latitude, 1e-9));
    }
}

#[test]
fn test_failed_set_points_keeps_state() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let generation = estimator.generation();

    let result = estimator.set_points(&[(1.0, 1.0)]);
    assert!(matches!(
        result,
        Err(EstimateError::InsufficientPoints { point_count: 1, .. })
    ));
    assert_eq!(estimator.generation(), generation);
    assert_eq!(estimator.points().len(), 12);
}

#[test]
fn test_zero_weight_cluster_disappears() {
    let mut estimator =
        Estimator::with_weights(&two_cluster_points(), cluster_weights(0.0)).unwrap();

    let weighted = estimator.estimate_stops(&config(50)).unwrap();
    assert_eq!(weighted.len(), 1);
    assert!(approx_eq(weighted[0].latitude, 2.0, 0.2));
    assert!(approx_eq(weighted[0].longitude, 3.0, 0.2));

    // The surface peak sits on the remaining cluster
    let peak = estimator.density_surface().unwrap().peak_coord().unwrap();
    assert!(((peak.x - 7.0).powi(2) + (peak.y - 8.0).powi(2)).sqrt() > 5.0);

    // The same estimator ignores the weights on request
    let unweighted = EstimateConfig {
        weighted: false,
        ..config(50)
    };
    assert_eq!(estimator.estimate_stops(&unweighted).unwrap().len(), 2);
}

#[test]
fn test_weights_raise_cluster_density() {
    let mut estimator =
        Estimator::with_weights(&two_cluster_points(), cluster_weights(4.0)).unwrap();
    let candidates = estimator.candidates(&config(50)).unwrap();

    assert_eq!(candidates.len(), 2);
    assert!(candidates[1].density > candidates[0].density);

    // Weight scale does not matter
    estimator
        .set_weights(Some(cluster_weights(4.0).iter().map(|w| w * 3.0).collect()))
        .unwrap();
    let rescaled = estimator.candidates(&config(50)).unwrap();
    assert_eq!(rescaled.len(), 2);
    for (a, b) in candidates.iter().zip(&rescaled) {
        assert_eq!((a.x, a.y), (b.x, b.y));
        assert!(approx_eq(a.density, b.density, 1e-9));
    }
}

#[test]
fn test_set_weights_invalidates_surface() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    estimator.estimate_stops(&config(50)).unwrap();

    estimator.set_weights(Some(cluster_weights(0.0))).unwrap();
    let stops = estimator.estimate_stops(&config(50)).unwrap();
    assert_eq!(stops.len(), 1);
    assert_eq!(estimator.cache().computations(), 2);

    estimator.set_weights(None).unwrap();
    assert_eq!(estimator.estimate_stops(&config(50)).unwrap().len(), 2);
}

#[test]
fn test_accepts_point_geometries() {
    let coords = two_cluster_points();
    let points: Vec<Point<f64>> = coords.iter().map(|c| Point::from(*c)).collect();
    let arrays: Vec<[f64; 2]> = coords.iter().map(|c| [c.x, c.y]).collect();

    let a = Estimator::new(&points).unwrap().estimate_stops(&config(40)).unwrap();
    let b = Estimator::new(&arrays).unwrap().estimate_stops(&config(40)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_insufficient_points() {
    let result = Estimator::new(&[(1.0, 2.0)]);
    assert!(matches!(
        result,
        Err(EstimateError::InsufficientPoints {
            point_count: 1,
            minimum_required: 2
        })
    ));

    let empty: Vec<(f64, f64)> = Vec::new();
    assert!(Estimator::new(&empty).is_err());
}

#[test]
fn test_malformed_geometry() {
    let result = Estimator::new(&[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 2.0)]);
    assert!(matches!(
        result,
        Err(EstimateError::MalformedGeometry { index: 1, .. })
    ));
}

#[test]
fn test_degenerate_inputs_are_errors() {
    // All points on one horizontal line
    let mut line = Estimator::new(&[(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)]).unwrap();
    assert!(matches!(
        line.estimate_stops(&config(20)),
        Err(EstimateError::DegenerateCovariance { .. })
    ));

    // Weight length mismatch only surfaces for weighted requests
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    estimator.set_weights(Some(vec![1.0; 3])).unwrap();
    assert!(matches!(
        estimator.estimate_stops(&config(20)),
        Err(EstimateError::WeightLengthMismatch {
            weight_count: 3,
            point_count: 12
        })
    ));
    let unweighted = EstimateConfig {
        weighted: false,
        ..config(20)
    };
    assert!(estimator.estimate_stops(&unweighted).is_ok());
}

#[test]
fn test_invalid_weights_rejected_at_set_time() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let mut weights = vec![1.0; 12];
    weights[4] = f64::NAN;
    assert!(matches!(
        estimator.set_weights(Some(weights)),
        Err(EstimateError::InvalidWeight { index: 4, .. })
    ));
    assert!(estimator.weights().is_none());
}

#[test]
fn test_invalid_config() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    assert!(matches!(
        estimator.estimate_stops(&config(0)),
        Err(EstimateError::InvalidResolution(0))
    ));
    let bad_width = EstimateConfig {
        kernel_width: -1.0,
        ..config(20)
    };
    assert!(matches!(
        estimator.estimate_stops(&bad_width),
        Err(EstimateError::InvalidKernelWidth(_))
    ));
    // A failed request computes nothing
    assert_eq!(estimator.cache().computations(), 0);
}

#[test]
fn test_tiny_resolution_has_no_stops() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    for resolution in [1, 2] {
        assert!(estimator.estimate_stops(&config(resolution)).unwrap().is_empty());
    }
}

#[test]
fn test_full_covariance_runs() {
    let mut estimator = Estimator::new(&two_cluster_points()).unwrap();
    let full = EstimateConfig {
        covariance: KernelCovariance::Full,
        ..config(30)
    };
    let surface = estimator.surface(&full).unwrap();
    assert_eq!(surface.values().len(), 900);
    assert!(surface.values().iter().all(|v| v.is_finite() && *v >= 0.0));
}
