#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.

use std::time::Duration;

use uptime_defence_core::{Command, TowerSnapshot, TowerTarget, TowerView};

/// Time left before `tower` may attack again at session time `now`.
///
/// Towers that never attacked are ready immediately. `attack_speed_factor`
/// scales the tower's attack speed, shortening the cooldown when above one.
#[must_use]
pub fn ready_in(tower: &TowerSnapshot, now: Duration, attack_speed_factor: f32) -> Duration {
    let Some(last_attack) = tower.last_attack else {
        return Duration::ZERO;
    };
    let cooldown = tower.stats.attack_cooldown(attack_speed_factor);
    let elapsed = now.saturating_sub(last_attack);
    cooldown.saturating_sub(elapsed)
}

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for towers ready to fire.
    pub fn handle(
        &mut self,
        now: Duration,
        attack_speed_factor: f32,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() || towers.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let Some(snapshot) = towers.get(target.tower) else {
                continue;
            };
            if ready_in(snapshot, now, attack_speed_factor).is_zero() {
                self.scratch.push(Command::FireProjectile {
                    tower: target.tower,
                    target: target.enemy,
                    at: now,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uptime_defence_core::{CellCoord, EnemyId, TowerId, TowerKind, WorldPoint};

    fn snapshot(id: u32, kind: TowerKind, last_attack: Option<Duration>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind,
            cell: CellCoord::new(id, 0),
            position: WorldPoint::default(),
            stats: kind.base_stats(),
            last_attack,
        }
    }

    fn target(tower: u32, enemy: u32) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            enemy: EnemyId::new(enemy),
            tower_position: WorldPoint::default(),
            enemy_position: WorldPoint::default(),
        }
    }

    #[test]
    fn fresh_towers_fire_immediately() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(2, TowerKind::Nginx, None),
            snapshot(5, TowerKind::Kafka, None),
        ]);
        let targets = vec![target(2, 4), target(5, 1)];
        let mut out = Vec::new();

        system.handle(Duration::ZERO, 1.0, &towers, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: EnemyId::new(4),
                    at: Duration::ZERO,
                },
                Command::FireProjectile {
                    tower: TowerId::new(5),
                    target: EnemyId::new(1),
                    at: Duration::ZERO,
                },
            ],
        );
    }

    #[test]
    fn cooldown_gates_attacks() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![snapshot(
            1,
            TowerKind::Nginx,
            Some(Duration::from_millis(1000)),
        )]);
        let targets = vec![target(1, 3)];

        let mut out = Vec::new();
        system.handle(Duration::from_millis(1999), 1.0, &towers, &targets, &mut out);
        assert!(out.is_empty());

        system.handle(Duration::from_millis(2000), 1.0, &towers, &targets, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn attack_speed_factor_shortens_the_cooldown() {
        let tower = snapshot(1, TowerKind::Nginx, Some(Duration::from_secs(10)));

        assert_eq!(
            ready_in(&tower, Duration::from_millis(10_200), 1.0),
            Duration::from_millis(800)
        );
        assert_eq!(
            ready_in(&tower, Duration::from_millis(10_200), 2.0),
            Duration::from_millis(300)
        );
        assert_eq!(
            ready_in(&tower, Duration::from_millis(10_500), 2.0),
            Duration::ZERO
        );
    }

    #[test]
    fn missing_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![snapshot(8, TowerKind::Redis, None)]);
        let targets = vec![target(42, 3), target(8, 2)];
        let mut out = Vec::new();

        system.handle(Duration::ZERO, 1.0, &towers, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::FireProjectile {
                tower: TowerId::new(8),
                target: EnemyId::new(2),
                at: Duration::ZERO,
            }]
        );
    }
}
