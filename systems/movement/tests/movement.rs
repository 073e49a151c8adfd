use proptest::prelude::*;
use uptime_defence_core::WorldPoint;
use uptime_defence_system_movement::{Advance, PathCursor, Route};

fn serpentine() -> Route {
    Route::new(vec![
        WorldPoint::new(32.0, 32.0),
        WorldPoint::new(224.0, 32.0),
        WorldPoint::new(224.0, 160.0),
        WorldPoint::new(32.0, 160.0),
    ])
}

#[test]
fn cursors_on_a_shared_route_advance_independently() {
    let route = serpentine();
    let mut slow = PathCursor::new();
    let mut fast = PathCursor::new();

    for _ in 0..10 {
        let _ = slow.advance(&route, 5.0);
        let _ = fast.advance(&route, 30.0);
    }

    assert!(slow.position(&route).distance(WorldPoint::new(82.0, 32.0)) < 1e-3);
    assert_eq!(fast.segment(), 1);
    assert_eq!(fast.position(&route), WorldPoint::new(224.0, 140.0));
}

#[test]
fn large_step_reaches_target_and_holds() {
    let route = serpentine();
    let mut cursor = PathCursor::new();

    assert_eq!(cursor.advance(&route, route.total_length()), Advance::Arrived);
    assert_eq!(cursor.position(&route), WorldPoint::new(32.0, 160.0));
    assert_eq!(cursor.advance(&route, 1.0), Advance::Finished);
}

proptest! {
    #[test]
    fn splitting_travel_into_steps_matches_a_single_step(
        steps in proptest::collection::vec(0.0f32..40.0, 1..40),
    ) {
        let route = serpentine();
        let total: f32 = steps.iter().sum();

        let mut stepped = PathCursor::new();
        let mut arrivals = 0;
        for step in &steps {
            if stepped.advance(&route, *step) == Advance::Arrived {
                arrivals += 1;
            }
        }

        let mut single = PathCursor::new();
        let _ = single.advance(&route, total);

        prop_assert!(arrivals <= 1);
        prop_assert_eq!(stepped.has_arrived(), arrivals == 1);
        let a = stepped.position(&route);
        let b = single.position(&route);
        prop_assert!(a.distance(b) < 0.05, "{:?} vs {:?}", a, b);
    }

    #[test]
    fn progress_stays_within_unit_interval(step in 0.0f32..1000.0) {
        let route = serpentine();
        let mut cursor = PathCursor::new();
        let _ = cursor.advance(&route, step);
        prop_assert!((0.0..=1.0).contains(&cursor.progress()));
        prop_assert!(cursor.segment() < route.segment_count());
    }
}
