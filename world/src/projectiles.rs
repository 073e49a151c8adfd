//! Homing projectiles in flight.

use std::collections::BTreeMap;

use uptime_defence_core::{EnemyId, ProjectileId, TowerId, WorldPoint};

/// Projectile chasing a single enemy.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower: TowerId,
    pub(crate) target: EnemyId,
    pub(crate) position: WorldPoint,
    pub(crate) damage: f32,
}

/// Outcome of moving a projectile for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flight {
    /// The projectile is still travelling and now sits at the provided point.
    InFlight(WorldPoint),
    /// The target is within this tick's travel distance.
    Impact,
}

/// Moves a projectile from `position` toward the target's current position.
///
/// A target closer than `travel` is struck this tick instead of being
/// overshot.
pub(crate) fn step(position: WorldPoint, target: WorldPoint, travel: f32) -> Flight {
    let remaining = position.distance(target);
    if remaining <= f64::from(travel.max(0.0)) {
        return Flight::Impact;
    }
    let fraction = (f64::from(travel.max(0.0)) / remaining) as f32;
    Flight::InFlight(position.lerp(target, fraction))
}

/// Projectiles keyed by identifier; identifiers are never reused.
#[derive(Debug)]
pub(crate) struct ProjectileSet {
    entries: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileSet {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(
        &mut self,
        tower: TowerId,
        target: EnemyId,
        position: WorldPoint,
        damage: f32,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get() + 1);
        let _ = self.entries.insert(
            id,
            Projectile {
                id,
                tower,
                target,
                position,
                damage,
            },
        );
        id
    }

    pub(crate) fn ids(&self) -> Vec<ProjectileId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: ProjectileId) -> Option<Projectile> {
        self.entries.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projectile_moves_toward_target() {
        let flight = step(WorldPoint::new(0.0, 0.0), WorldPoint::new(100.0, 0.0), 40.0);

        assert_eq!(flight, Flight::InFlight(WorldPoint::new(40.0, 0.0)));
    }

    #[test]
    fn target_within_travel_is_struck_without_overshoot() {
        assert_eq!(
            step(WorldPoint::new(0.0, 0.0), WorldPoint::new(30.0, 40.0), 50.0),
            Flight::Impact
        );
        assert_eq!(
            step(WorldPoint::new(0.0, 0.0), WorldPoint::new(30.0, 40.0), 80.0),
            Flight::Impact
        );
    }

    #[test]
    fn launched_identifiers_are_sequential() {
        let mut set = ProjectileSet::new();
        let first = set.launch(TowerId::new(0), EnemyId::new(0), WorldPoint::default(), 5.0);
        let _ = set.remove(first);
        let second = set.launch(TowerId::new(0), EnemyId::new(1), WorldPoint::default(), 5.0);

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert_eq!(set.len(), 1);
    }
}
