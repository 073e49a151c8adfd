#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement model that advances enemies along waypoint routes.
//!
//! A [`Route`] is an immutable polyline shared by every enemy walking the same
//! level path. Each enemy owns a [`PathCursor`] recording the segment it is on
//! and the fraction of that segment already covered. Advancing a cursor spends
//! a travel budget segment by segment in an explicit loop, so a fast enemy
//! crossing several short segments within one tick keeps the leftover
//! distance instead of stalling at a waypoint.

use uptime_defence_core::WorldPoint;

/// Immutable polyline followed by enemies.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    waypoints: Vec<WorldPoint>,
    lengths: Vec<f32>,
}

impl Route {
    /// Creates a route through the provided waypoints in order.
    #[must_use]
    pub fn new(waypoints: Vec<WorldPoint>) -> Self {
        let lengths = waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]) as f32)
            .collect();
        Self { waypoints, lengths }
    }

    /// Waypoints composing the route.
    #[must_use]
    pub fn waypoints(&self) -> &[WorldPoint] {
        &self.waypoints
    }

    /// Number of segments between consecutive waypoints.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.lengths.len()
    }

    /// Length of a single segment, or zero when the index is out of range.
    #[must_use]
    pub fn segment_length(&self, segment: usize) -> f32 {
        self.lengths.get(segment).copied().unwrap_or(0.0)
    }

    /// Sum of every segment length.
    #[must_use]
    pub fn total_length(&self) -> f32 {
        self.lengths.iter().sum()
    }

    /// First waypoint of the route.
    #[must_use]
    pub fn start(&self) -> WorldPoint {
        self.waypoints.first().copied().unwrap_or_default()
    }
}

/// Result of advancing a cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The cursor is still travelling.
    Moving,
    /// The cursor reached the final waypoint during this advance.
    Arrived,
    /// The cursor had already arrived before this advance and did not move.
    Finished,
}

/// Progress of a single enemy along a route.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathCursor {
    segment: usize,
    progress: f32,
    arrived: bool,
}

impl PathCursor {
    /// Creates a cursor positioned on the first waypoint.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segment: 0,
            progress: 0.0,
            arrived: false,
        }
    }

    /// Index of the segment currently travelled.
    #[must_use]
    pub const fn segment(&self) -> usize {
        self.segment
    }

    /// Fraction of the current segment already covered, within `[0, 1]`.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Reports whether the cursor reached the end of its route.
    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Spends `distance` world units of travel along `route`.
    ///
    /// Zero-length segments are skipped without consuming any budget. The
    /// final segment holds at a fraction of one and reports
    /// [`Advance::Arrived`] exactly once; later calls report
    /// [`Advance::Finished`].
    pub fn advance(&mut self, route: &Route, distance: f32) -> Advance {
        if self.arrived {
            return Advance::Finished;
        }

        let segments = route.segment_count();
        let mut budget = if distance.is_finite() {
            distance.max(0.0)
        } else {
            0.0
        };

        loop {
            if self.segment >= segments {
                return self.arrive(segments);
            }

            let length = route.segment_length(self.segment);
            if length <= 0.0 {
                self.segment += 1;
                self.progress = 0.0;
                continue;
            }

            let remaining = (1.0 - self.progress) * length;
            if budget < remaining {
                self.progress = (self.progress + budget / length).min(1.0);
                return Advance::Moving;
            }

            budget -= remaining;
            if self.segment + 1 == segments {
                return self.arrive(segments);
            }
            self.segment += 1;
            self.progress = 0.0;
        }
    }

    fn arrive(&mut self, segments: usize) -> Advance {
        self.segment = segments.saturating_sub(1);
        self.progress = 1.0;
        self.arrived = true;
        Advance::Arrived
    }

    /// Current position on `route`.
    #[must_use]
    pub fn position(&self, route: &Route) -> WorldPoint {
        let waypoints = route.waypoints();
        match (waypoints.get(self.segment), waypoints.get(self.segment + 1)) {
            (Some(from), Some(to)) => from.lerp(*to, self.progress),
            (Some(only), None) => *only,
            _ => route.start(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(points: &[(f32, f32)]) -> Route {
        Route::new(
            points
                .iter()
                .map(|&(x, y)| WorldPoint::new(x, y))
                .collect(),
        )
    }

    #[test]
    fn route_measures_segments() {
        let route = straight(&[(0.0, 0.0), (30.0, 40.0), (30.0, 50.0)]);
        assert_eq!(route.segment_count(), 2);
        assert_eq!(route.segment_length(0), 50.0);
        assert_eq!(route.segment_length(1), 10.0);
        assert_eq!(route.total_length(), 60.0);
        assert_eq!(route.segment_length(7), 0.0);
    }

    #[test]
    fn partial_advance_interpolates() {
        let route = straight(&[(0.0, 0.0), (100.0, 0.0)]);
        let mut cursor = PathCursor::new();

        assert_eq!(cursor.advance(&route, 25.0), Advance::Moving);

        assert_eq!(cursor.segment(), 0);
        assert!((cursor.progress() - 0.25).abs() < 1e-6);
        assert_eq!(cursor.position(&route), WorldPoint::new(25.0, 0.0));
    }

    #[test]
    fn overflow_carries_into_following_segments() {
        let route = straight(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (20.0, 100.0)]);
        let mut cursor = PathCursor::new();

        assert_eq!(cursor.advance(&route, 45.0), Advance::Moving);

        assert_eq!(cursor.segment(), 2);
        assert!((cursor.progress() - 0.25).abs() < 1e-6);
        assert_eq!(cursor.position(&route), WorldPoint::new(20.0, 25.0));
    }

    #[test]
    fn degenerate_segments_do_not_consume_budget() {
        let route = straight(&[(0.0, 0.0), (10.0, 0.0), (10.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        let mut cursor = PathCursor::new();

        assert_eq!(cursor.advance(&route, 15.0), Advance::Moving);

        assert_eq!(cursor.segment(), 3);
        assert!((cursor.progress() - 0.5).abs() < 1e-6);
        assert_eq!(cursor.position(&route), WorldPoint::new(15.0, 0.0));
    }

    #[test]
    fn arrival_is_reported_exactly_once() {
        let route = straight(&[(0.0, 0.0), (10.0, 0.0)]);
        let mut cursor = PathCursor::new();

        assert_eq!(cursor.advance(&route, 500.0), Advance::Arrived);
        assert!(cursor.has_arrived());
        assert_eq!(cursor.progress(), 1.0);
        assert_eq!(cursor.position(&route), WorldPoint::new(10.0, 0.0));

        assert_eq!(cursor.advance(&route, 500.0), Advance::Finished);
        assert_eq!(cursor.position(&route), WorldPoint::new(10.0, 0.0));
    }

    #[test]
    fn exact_remaining_distance_arrives() {
        let route = straight(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        let mut cursor = PathCursor::new();

        assert_eq!(cursor.advance(&route, 20.0), Advance::Arrived);
    }

    #[test]
    fn negative_or_invalid_distance_does_not_move() {
        let route = straight(&[(0.0, 0.0), (10.0, 0.0)]);
        let mut cursor = PathCursor::new();

        assert_eq!(cursor.advance(&route, -5.0), Advance::Moving);
        assert_eq!(cursor.advance(&route, f32::NAN), Advance::Moving);
        assert_eq!(cursor.position(&route), WorldPoint::new(0.0, 0.0));
    }

    #[test]
    fn route_of_only_degenerate_segments_arrives_immediately() {
        let route = straight(&[(5.0, 5.0), (5.0, 5.0)]);
        let mut cursor = PathCursor::new();

        assert_eq!(cursor.advance(&route, 0.0), Advance::Arrived);
        assert_eq!(cursor.position(&route), WorldPoint::new(5.0, 5.0));
    }
}
