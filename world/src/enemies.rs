//! Live enemy bookkeeping.

use std::collections::BTreeMap;

use uptime_defence_core::{EnemyId, EnemyKind, EnemySnapshot};
use uptime_defence_system_movement::{Advance, PathCursor, Route};

/// Enemy travelling along one of the level routes.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) wave: u32,
    pub(crate) route: usize,
    pub(crate) cursor: PathCursor,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
}

impl Enemy {
    /// Subtracts `damage` from the enemy's health, clamping at zero.
    ///
    /// Returns `true` when this call brought health to zero.
    pub(crate) fn take_damage(&mut self, damage: f32) -> bool {
        if self.health <= 0.0 {
            return false;
        }
        self.health = (self.health - damage.max(0.0)).clamp(0.0, self.max_health);
        self.health == 0.0
    }

    pub(crate) fn snapshot(&self, routes: &[Route]) -> EnemySnapshot {
        let position = routes
            .get(self.route)
            .map(|route| self.cursor.position(route))
            .unwrap_or_default();
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            wave: self.wave,
            position,
            health: self.health,
            max_health: self.max_health,
        }
    }
}

/// Set of live enemies keyed by identifier.
///
/// Identifiers are handed out in spawn order and never reused, so iterating
/// the roster visits enemies in spawn order.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Adds a full-health enemy at the start of `route`.
    pub(crate) fn spawn(&mut self, kind: EnemyKind, wave: u32, route: usize) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get() + 1);
        let max_health = kind.stats().max_health;
        let _ = self.entries.insert(
            id,
            Enemy {
                id,
                kind,
                wave,
                route,
                cursor: PathCursor::new(),
                health: max_health,
                max_health,
            },
        );
        id
    }

    /// Reports whether `id` was ever handed out.
    pub(crate) fn was_issued(&self, id: EnemyId) -> bool {
        id < self.next_enemy_id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    /// Moves every enemy along its route and removes the ones that arrived.
    ///
    /// Arrivals are returned in identifier order.
    pub(crate) fn advance(&mut self, routes: &[Route], seconds: f32, speed_factor: f32) -> Vec<Enemy> {
        let mut arrived = Vec::new();
        for enemy in self.entries.values_mut() {
            let Some(route) = routes.get(enemy.route) else {
                continue;
            };
            let distance = enemy.kind.stats().speed * speed_factor * seconds;
            if enemy.cursor.advance(route, distance) == Advance::Arrived {
                arrived.push(enemy.id);
            }
        }

        arrived
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect()
    }

    /// Identifier of the live enemy with the lowest health, ties broken by
    /// the lowest identifier.
    pub(crate) fn weakest(&self) -> Option<EnemyId> {
        self.entries
            .values()
            .fold(None::<&Enemy>, |best, enemy| match best {
                Some(current) if current.health <= enemy.health => Some(current),
                _ => Some(enemy),
            })
            .map(|enemy| enemy.id)
    }
}
