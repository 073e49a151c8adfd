use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use proptest::prelude::*;
use uptime_defence_core::{level::Level, CellCoord, EnemyId, Event, TowerKind};
use uptime_defence_session::{Session, SessionConfig};
use uptime_defence_world::query;

fn tutorial() -> Session {
    Session::new(Level::tutorial(), SessionConfig::default()).expect("tutorial is valid")
}

fn placement() -> impl Strategy<Value = (TowerKind, CellCoord)> {
    (0usize..TowerKind::ALL.len(), 0u32..22, 0u32..13)
        .prop_map(|(kind, column, row)| (TowerKind::ALL[kind], CellCoord::new(column, row)))
}

proptest! {
    #[test]
    fn placements_never_land_on_paths_or_overlap(
        requests in prop::collection::vec(placement(), 1..40),
    ) {
        let mut session = tutorial();
        let level = Level::tutorial();
        let path_cells = level.path_cells();
        let mut events = Vec::new();

        for (kind, cell) in requests {
            let before = session.ledger().money();
            match session.place_tower(kind, cell, &mut events) {
                Ok(_) => {
                    prop_assert_eq!(session.ledger().money(), before - kind.base_stats().cost);
                    prop_assert!(!path_cells.contains(&cell));
                }
                Err(_) => prop_assert_eq!(session.ledger().money(), before),
            }
        }

        let towers = query::tower_view(session.world()).into_vec();
        let cells: BTreeSet<_> = towers.iter().map(|tower| tower.cell).collect();
        prop_assert_eq!(cells.len(), towers.len());
        prop_assert!(cells.iter().all(|cell| !path_cells.contains(cell)));
    }

    #[test]
    fn enemies_resolve_exactly_once_and_waves_balance(
        placements in prop::collection::vec(placement(), 0..8),
        steps in prop::collection::vec(1u64..250, 100..400),
    ) {
        let mut session = tutorial();
        let mut events = Vec::new();
        for (kind, cell) in placements {
            let _ = session.place_tower(kind, cell, &mut events);
        }

        let mut health: BTreeMap<EnemyId, f32> = BTreeMap::new();
        let mut budget = session.ledger().damage_budget();
        let mut now = Duration::ZERO;
        for millis in steps {
            let _ = session.start_next_wave(&mut events);
            let dt = Duration::from_millis(millis);
            now += dt;
            events.extend(session.tick(now, dt));

            for enemy in query::enemy_view(session.world()).iter() {
                if let Some(previous) = health.insert(enemy.id, enemy.health) {
                    prop_assert!(enemy.health <= previous);
                }
            }
            prop_assert!(session.ledger().damage_budget() <= budget);
            budget = session.ledger().damage_budget();
        }

        let mut resolved = BTreeSet::new();
        let mut spawned: BTreeMap<u32, u32> = BTreeMap::new();
        let mut finished: BTreeMap<u32, u32> = BTreeMap::new();
        for event in &events {
            match event {
                Event::EnemySpawned { wave, .. } => *spawned.entry(*wave).or_default() += 1,
                Event::EnemyKilled { enemy, wave, .. } | Event::EnemyEscaped { enemy, wave, .. } => {
                    prop_assert!(resolved.insert(*enemy), "enemy {:?} resolved twice", enemy);
                    *finished.entry(*wave).or_default() += 1;
                }
                Event::WaveCompleted { wave, .. } => {
                    prop_assert_eq!(spawned.get(wave), finished.get(wave));
                }
                _ => {}
            }
        }
    }
}
