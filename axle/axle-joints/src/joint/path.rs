//! Waypoint path geometry for the path-following piston.
//!
//! Waypoints live in the joint's pin frame; arc lengths are accumulated
//! once at construction and the two queries every step needs - closest
//! point and point-at-arc-distance - walk the polyline. Zero-length
//! segments are skipped under [`WaypointPath::SEGMENT_EPSILON`] so
//! degenerate input never divides by a near-zero magnitude.
//!
//! The closest-point search is O(segment count) per call with no spatial
//! acceleration structure; fine for typical waypoint counts.

use axle_types::{JointError, Result};
use nalgebra::{Point3, Vector3};

/// Result of a closest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// Closest point on the path, pin-frame coordinates.
    pub point: Point3<f64>,
    /// Unit tangent of the containing segment.
    pub tangent: Vector3<f64>,
    /// Arc distance from the path start to `point`.
    pub arc: f64,
    /// Index of the containing segment.
    pub segment: usize,
}

/// An ordered polyline of pin-frame waypoints with cached arc lengths.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointPath {
    points: Vec<Point3<f64>>,
    /// Cumulative arc length at each waypoint; `cumulative[0] == 0`.
    cumulative: Vec<f64>,
    total: f64,
    looped: bool,
}

impl WaypointPath {
    /// Segments shorter than this are skipped by every query.
    pub const SEGMENT_EPSILON: f64 = 1e-9;

    /// Build a path from at least two waypoints, optionally closing the
    /// last waypoint back to the first.
    pub fn new(points: Vec<Point3<f64>>, looped: bool) -> Result<Self> {
        if points.len() < 2 {
            return Err(JointError::PathTooShort(points.len()));
        }
        if points
            .iter()
            .any(|p| !p.coords.iter().all(|x| x.is_finite()))
        {
            return Err(JointError::NonFinite("waypoint"));
        }

        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        for window in points.windows(2) {
            let length = (window[1] - window[0]).norm();
            let last = cumulative.last().copied().unwrap_or(0.0);
            cumulative.push(last + length);
        }

        let open_length = cumulative.last().copied().unwrap_or(0.0);
        let total = if looped {
            let closing = points.last().map_or(0.0, |last| (points[0] - last).norm());
            open_length + closing
        } else {
            open_length
        };

        if total < Self::SEGMENT_EPSILON {
            return Err(JointError::PathDegenerate);
        }

        Ok(Self {
            points,
            cumulative,
            total,
            looped,
        })
    }

    /// Number of waypoints.
    #[must_use]
    pub fn waypoint_count(&self) -> usize {
        self.points.len()
    }

    /// Number of segments (includes the closing segment when looped).
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.points.len() - 1 + usize::from(self.looped)
    }

    /// The waypoints, pin-frame coordinates.
    #[must_use]
    pub fn waypoints(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Whether the path closes back on itself.
    #[must_use]
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// Total arc length (including the closing segment when looped).
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.total
    }

    /// Cumulative arc length from the start to waypoint `index`.
    #[must_use]
    pub fn cumulative_length(&self, index: usize) -> Option<f64> {
        self.cumulative.get(index).copied()
    }

    /// Endpoints of segment `index` (the closing segment wraps to the
    /// first waypoint).
    fn segment(&self, index: usize) -> (Point3<f64>, Point3<f64>) {
        let start = self.points[index];
        let end = if index + 1 < self.points.len() {
            self.points[index + 1]
        } else {
            self.points[0]
        };
        (start, end)
    }

    /// The closest point on the path to `query`, with its tangent, arc
    /// distance and containing segment.
    ///
    /// Every segment is projected onto in turn and the globally closest
    /// projection wins; the closing segment participates when looped.
    #[must_use]
    pub fn closest_point(&self, query: &Point3<f64>) -> Option<PathSample> {
        let mut best: Option<(f64, PathSample)> = None;

        for index in 0..self.segment_count() {
            let (start, end) = self.segment(index);
            let delta = end - start;
            let length = delta.norm();
            if length < Self::SEGMENT_EPSILON {
                continue;
            }
            let tangent = delta / length;

            let along = (query - start).dot(&tangent).clamp(0.0, length);
            let point = start + tangent * along;
            let dist2 = (query - point).norm_squared();

            let arc = self.cumulative[index] + along;
            if best.map_or(true, |(best_dist2, _)| dist2 < best_dist2) {
                best = Some((
                    dist2,
                    PathSample {
                        point,
                        tangent,
                        arc,
                        segment: index,
                    },
                ));
            }
        }

        best.map(|(_, sample)| sample)
    }

    /// The point and tangent at a given arc distance from the start.
    ///
    /// Looped paths wrap the distance modulo the total length; open paths
    /// clamp it to `[0, total]`.
    #[must_use]
    pub fn point_at_arc_distance(&self, distance: f64) -> Option<(Point3<f64>, Vector3<f64>)> {
        let distance = if self.looped {
            distance.rem_euclid(self.total)
        } else {
            distance.clamp(0.0, self.total)
        };

        let mut remaining = distance;
        let mut last_tangent = None;

        for index in 0..self.segment_count() {
            let (start, end) = self.segment(index);
            let delta = end - start;
            let length = delta.norm();
            if length < Self::SEGMENT_EPSILON {
                continue;
            }
            let tangent = delta / length;
            last_tangent = Some((end, tangent));

            if remaining <= length {
                return Some((start + tangent * remaining, tangent));
            }
            remaining -= length;
        }

        // Distance landed exactly on the path end (accumulated rounding
        // included): report the final point with the final tangent.
        last_tangent.map(|(end, tangent)| (end, tangent))
    }

    /// Clamp a target arc distance to the path's addressable range.
    #[must_use]
    pub fn clamp_arc(&self, distance: f64) -> f64 {
        if self.looped {
            distance
        } else {
            distance.clamp(0.0, self.total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            WaypointPath::new(vec![Point3::origin()], false),
            Err(JointError::PathTooShort(1))
        );
    }

    #[test]
    fn test_degenerate() {
        let coincident = vec![Point3::origin(), Point3::origin()];
        assert_eq!(
            WaypointPath::new(coincident, false),
            Err(JointError::PathDegenerate)
        );
    }

    #[test]
    fn test_lengths_open_and_looped() {
        let open = WaypointPath::new(square(), false).unwrap_or_else(|_| unreachable!());
        assert_relative_eq!(open.total_length(), 3.0, epsilon = 1e-12);
        assert_eq!(open.segment_count(), 3);

        let looped = WaypointPath::new(square(), true).unwrap_or_else(|_| unreachable!());
        assert_relative_eq!(looped.total_length(), 4.0, epsilon = 1e-12);
        assert_eq!(looped.segment_count(), 4);
    }

    #[test]
    fn test_closest_at_waypoints_matches_cumulative() {
        for looped in [false, true] {
            let path = WaypointPath::new(square(), looped).unwrap_or_else(|_| unreachable!());
            for (k, waypoint) in path.waypoints().iter().enumerate() {
                let sample = path.closest_point(waypoint).unwrap_or_else(|| unreachable!());
                let expected = path.cumulative_length(k).unwrap_or(f64::NAN);
                assert_relative_eq!(sample.arc, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_closest_projects_onto_segment() {
        let path = WaypointPath::new(square(), false).unwrap_or_else(|_| unreachable!());

        // Above the middle of the first segment.
        let sample = path
            .closest_point(&Point3::new(0.5, -0.3, 0.0))
            .unwrap_or_else(|| unreachable!());
        assert_relative_eq!(sample.point.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(sample.point.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(sample.arc, 0.5, epsilon = 1e-12);
        assert_eq!(sample.segment, 0);
    }

    #[test]
    fn test_closest_uses_closing_segment_when_looped() {
        let path = WaypointPath::new(square(), true).unwrap_or_else(|_| unreachable!());

        // Left of the closing edge from (0,1) to (0,0).
        let sample = path
            .closest_point(&Point3::new(-0.2, 0.5, 0.0))
            .unwrap_or_else(|| unreachable!());
        assert_eq!(sample.segment, 3);
        assert_relative_eq!(sample.point.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(sample.point.y, 0.5, epsilon = 1e-12);
        assert_relative_eq!(sample.arc, 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_point_at_arc_endpoints() {
        let open = WaypointPath::new(square(), false).unwrap_or_else(|_| unreachable!());
        let (start, _) = open.point_at_arc_distance(0.0).unwrap_or_else(|| unreachable!());
        assert_relative_eq!(start.coords, square()[0].coords, epsilon = 1e-12);

        let (end, _) = open
            .point_at_arc_distance(open.total_length())
            .unwrap_or_else(|| unreachable!());
        assert_relative_eq!(end.coords, square()[3].coords, epsilon = 1e-12);

        // Looped: total length wraps back to the first waypoint.
        let looped = WaypointPath::new(square(), true).unwrap_or_else(|_| unreachable!());
        let (wrapped, _) = looped
            .point_at_arc_distance(looped.total_length())
            .unwrap_or_else(|| unreachable!());
        assert_relative_eq!(wrapped.coords, square()[0].coords, epsilon = 1e-12);
    }

    #[test]
    fn test_point_at_arc_interior() {
        let path = WaypointPath::new(square(), false).unwrap_or_else(|_| unreachable!());
        let (p, t) = path.point_at_arc_distance(1.5).unwrap_or_else(|| unreachable!());
        assert_relative_eq!(p.coords, Vector3::new(1.0, 0.5, 0.0), epsilon = 1e-12);
        assert_relative_eq!(t, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_point_at_arc_wraps_when_looped() {
        let path = WaypointPath::new(square(), true).unwrap_or_else(|_| unreachable!());
        let (a, _) = path.point_at_arc_distance(0.5).unwrap_or_else(|| unreachable!());
        let (b, _) = path.point_at_arc_distance(4.5).unwrap_or_else(|| unreachable!());
        assert_relative_eq!(a.coords, b.coords, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_segments_skipped() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0), // duplicate
            Point3::new(2.0, 0.0, 0.0),
        ];
        let path = WaypointPath::new(points, false).unwrap_or_else(|_| unreachable!());

        let sample = path
            .closest_point(&Point3::new(1.0, 0.5, 0.0))
            .unwrap_or_else(|| unreachable!());
        assert_relative_eq!(sample.point.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(sample.arc, 1.0, epsilon = 1e-12);
    }
}
