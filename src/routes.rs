//! Point-to-route distances.
//!
//! [`route_distances`] is a plain reduction over any [`RouteGeometry`].
//! For large route sets, [`RouteIndex`] keeps route segments in an R-tree and
//! answers nearest-segment queries instead of scanning every route.

use geo::{Coord, Distance, Euclidean, Line, LineString, MultiLineString, Point};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::error::{EstimateError, OptionExt, Result};

/// A line-like geometry with a planar distance to a point.
pub trait RouteGeometry {
    fn distance_to(&self, point: &Coord<f64>) -> f64;
}

impl RouteGeometry for LineString<f64> {
    fn distance_to(&self, point: &Coord<f64>) -> f64 {
        Euclidean.distance(&Point::from(*point), self)
    }
}

impl RouteGeometry for MultiLineString<f64> {
    fn distance_to(&self, point: &Coord<f64>) -> f64 {
        self.iter()
            .map(|line| line.distance_to(point))
            .fold(f64::INFINITY, f64::min)
    }
}

impl RouteGeometry for Line<f64> {
    fn distance_to(&self, point: &Coord<f64>) -> f64 {
        Euclidean.distance(&Point::from(*point), self)
    }
}

impl RouteGeometry for Point<f64> {
    fn distance_to(&self, point: &Coord<f64>) -> f64 {
        Euclidean.distance(Point::from(*point), *self)
    }
}

/// For each point, the minimum distance to any route.
pub fn route_distances<R: RouteGeometry>(points: &[Coord<f64>], routes: &[R]) -> Result<Vec<f64>> {
    if routes.is_empty() {
        return Err(EstimateError::EmptyRoutes);
    }
    Ok(points
        .iter()
        .map(|p| {
            routes
                .iter()
                .map(|r| r.distance_to(p))
                .fold(f64::INFINITY, f64::min)
        })
        .collect())
}

/// A route segment with the index of the route it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct IndexedSegment {
    pub route: usize,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.start, self.end)
    }
}

impl PointDistance for IndexedSegment {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let len_2 = dx * dx + dy * dy;
        let t = if len_2 > 0.0 {
            (((point[0] - self.start[0]) * dx + (point[1] - self.start[1]) * dy) / len_2)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };
        let px = self.start[0] + t * dx - point[0];
        let py = self.start[1] + t * dy - point[1];
        px * px + py * py
    }
}

/// R-tree over the segments of a route collection.
#[derive(Debug)]
pub struct RouteIndex {
    tree: RTree<IndexedSegment>,
    route_count: usize,
}

impl RouteIndex {
    /// Index the segments of `routes`.
    ///
    /// A single-coordinate route is indexed as a zero-length segment. Fails
    /// with [`EstimateError::EmptyRoutes`] when nothing can be indexed.
    pub fn build(routes: &[LineString<f64>]) -> Result<Self> {
        let mut segments = Vec::new();
        for (route, line) in routes.iter().enumerate() {
            match line.0.as_slice() {
                [] => {}
                [only] => segments.push(IndexedSegment {
                    route,
                    start: [only.x, only.y],
                    end: [only.x, only.y],
                }),
                coords => segments.extend(coords.windows(2).map(|w| IndexedSegment {
                    route,
                    start: [w[0].x, w[0].y],
                    end: [w[1].x, w[1].y],
                })),
            }
        }
        let tree = (!segments.is_empty())
            .then(|| RTree::bulk_load(segments))
            .ok_or_empty_routes()?;
        Ok(Self {
            tree,
            route_count: routes.len(),
        })
    }

    /// Closest route to `point` as `(route index, distance)`.
    pub fn nearest(&self, point: &Coord<f64>) -> Option<(usize, f64)> {
        self.tree
            .nearest_neighbor(&[point.x, point.y])
            .map(|s| (s.route, s.distance_2(&[point.x, point.y]).sqrt()))
    }

    /// Distance from `point` to the closest route.
    pub fn nearest_distance(&self, point: &Coord<f64>) -> f64 {
        self.nearest(point).map_or(f64::INFINITY, |(_, d)| d)
    }

    /// Distance from each point to the closest route, index-aligned with
    /// `points`.
    pub fn distances(&self, points: &[Coord<f64>]) -> Vec<f64> {
        points.iter().map(|p| self.nearest_distance(p)).collect()
    }

    pub fn route_count(&self) -> usize {
        self.route_count
    }

    pub fn segment_count(&self) -> usize {
        self.tree.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn test_segment_distance_projects_inside() {
        let segment = IndexedSegment {
            route: 0,
            start: [0.0, 0.0],
            end: [10.0, 0.0],
        };
        assert!((segment.distance_2(&[5.0, 3.0]) - 9.0).abs() < 1e-12);
        // Beyond the end the distance is measured to the endpoint
        assert!((segment.distance_2(&[13.0, 4.0]) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_index_matches_plain_reduction() {
        let routes = vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            line_string![(x: 0.0, y: 5.0), (x: 5.0, y: 10.0), (x: 10.0, y: 5.0)],
        ];
        let points = vec![
            Coord { x: 2.0, y: 1.0 },
            Coord { x: 5.0, y: 9.0 },
            Coord { x: -3.0, y: -4.0 },
        ];

        let plain = route_distances(&points, &routes).unwrap();
        let index = RouteIndex::build(&routes).unwrap();
        let indexed = index.distances(&points);

        assert_eq!(index.segment_count(), 3);
        for (a, b) in plain.iter().zip(&indexed) {
            assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
        assert!((plain[2] - 5.0).abs() < 1e-9);
        assert_eq!(index.nearest(&points[1]).map(|(r, _)| r), Some(1));
    }

    #[test]
    fn test_distances_stay_aligned_with_points() {
        // An empty route next to a real one contributes no segments
        let routes = vec![
            LineString::new(vec![]),
            line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)],
        ];
        let index = RouteIndex::build(&routes).unwrap();
        let points = vec![
            Coord { x: 2.0, y: 3.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 7.0, y: 4.0 },
        ];

        let distances = index.distances(&points);
        assert_eq!(distances.len(), points.len());
        assert_eq!(index.route_count(), 2);
        assert_eq!(index.segment_count(), 1);
        assert!((distances[0] - 3.0).abs() < 1e-12);
        assert!(distances[1].abs() < 1e-12);
        assert!((distances[2] - 5.0).abs() < 1e-12);
        assert_eq!(index.nearest(&points[0]).map(|(r, _)| r), Some(1));
    }

    #[test]
    fn test_empty_index_rejected() {
        let routes: Vec<LineString<f64>> = vec![LineString::new(vec![])];
        assert!(matches!(
            RouteIndex::build(&routes),
            Err(EstimateError::EmptyRoutes)
        ));
    }
}
