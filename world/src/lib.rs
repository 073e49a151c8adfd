#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Uptime Defence.
//!
//! The world owns the grid, every placed tower, every live enemy and every
//! projectile in flight. It changes only through [`apply`], which executes a
//! single [`Command`] and appends the resulting [`Event`] values. Read access
//! goes through the [`query`] module.

mod enemies;
mod grid;
mod projectiles;
mod towers;

use tracing::debug;
use uptime_defence_core::{
    level::Level, Command, EnemyId, Event, ProjectileId, RemovalError, PROJECTILE_SPEED,
};
use uptime_defence_system_movement::Route;

pub use grid::{Grid, GridCell};

use enemies::EnemyRoster;
use projectiles::{Flight, ProjectileSet};
use towers::TowerRegistry;

/// Represents the authoritative Uptime Defence world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    routes: Vec<Route>,
    towers: TowerRegistry,
    enemies: EnemyRoster,
    projectiles: ProjectileSet,
}

impl World {
    /// Creates a world laid out according to `level`, with no towers,
    /// enemies or projectiles.
    ///
    /// The level is expected to have passed validation; paths are turned into
    /// routes through the centres of their waypoint cells.
    #[must_use]
    pub fn from_level(level: &Level) -> Self {
        let grid = Grid::from_level(level);
        let routes = level
            .paths
            .iter()
            .map(|path| Route::new(path.iter().map(|cell| grid.to_world(*cell)).collect()))
            .collect();
        Self {
            grid,
            routes,
            towers: TowerRegistry::new(),
            enemies: EnemyRoster::new(),
            projectiles: ProjectileSet::new(),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTower { kind, cell } => {
            if let Some(reason) = world.grid.placement_error(cell) {
                out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
                return;
            }
            let occupied = world.grid.occupy(cell);
            assert!(occupied, "validated cell {cell} refused occupation");
            let position = world.grid.to_world(cell);
            let tower = world.towers.insert(kind, cell, position);
            debug!(tower = tower.get(), kind = kind.name(), %cell, "tower placed");
            out_events.push(Event::TowerPlaced {
                tower,
                kind,
                cell,
                cost: kind.base_stats().cost,
            });
        }
        Command::UpgradeTower { tower } => {
            let Some(state) = world.towers.get_mut(tower) else {
                out_events.push(Event::TowerRemovalRejected {
                    tower,
                    reason: RemovalError::MissingTower,
                });
                return;
            };
            let cost = state.stats.upgrade_cost;
            state.stats = state.stats.upgraded();
            debug!(tower = tower.get(), level = state.stats.level, "tower upgraded");
            out_events.push(Event::TowerUpgraded {
                tower,
                level: state.stats.level,
                cost,
            });
        }
        Command::SellTower { tower } => {
            let Some(state) = world.towers.remove(tower) else {
                out_events.push(Event::TowerRemovalRejected {
                    tower,
                    reason: RemovalError::MissingTower,
                });
                return;
            };
            world.grid.free(state.cell);
            let refund = state.stats.sell_value();
            debug!(tower = tower.get(), refund, "tower sold");
            out_events.push(Event::TowerSold {
                tower,
                cell: state.cell,
                refund,
            });
        }
        Command::SpawnEnemy { kind, wave, path } => {
            assert!(!world.routes.is_empty(), "world has no routes to spawn on");
            let route = path % world.routes.len();
            let enemy = world.enemies.spawn(kind, wave, route);
            debug!(enemy = enemy.get(), wave, route, "enemy spawned");
            out_events.push(Event::EnemySpawned {
                enemy,
                kind,
                wave,
                path: route,
            });
        }
        Command::AdvanceEnemies { dt, speed_factor } => {
            let arrived = world
                .enemies
                .advance(&world.routes, dt.as_secs_f32(), speed_factor);
            for enemy in arrived {
                let damage = enemy.kind.stats().escape_damage;
                debug!(enemy = enemy.id.get(), damage, "enemy escaped");
                out_events.push(Event::EnemyEscaped {
                    enemy: enemy.id,
                    kind: enemy.kind,
                    wave: enemy.wave,
                    damage,
                });
            }
        }
        Command::FireProjectile { tower, target, at } => {
            let Some(state) = world.towers.get_mut(tower) else {
                debug_assert!(false, "fire command for unknown tower {tower:?}");
                return;
            };
            let Some(enemy) = world.enemies.get(target) else {
                return;
            };
            debug_assert!(enemy.health > 0.0);
            state.last_attack = Some(at);
            let projectile =
                world
                    .projectiles
                    .launch(tower, target, state.position, state.stats.damage);
            out_events.push(Event::ProjectileFired {
                projectile,
                tower,
                target,
            });
        }
        Command::AdvanceProjectiles { dt } => {
            let travel = PROJECTILE_SPEED * dt.as_secs_f32();
            for id in world.projectiles.ids() {
                advance_projectile(world, id, travel, out_events);
            }
        }
        Command::ExecuteWeakest => {
            let Some(enemy) = world.enemies.weakest() else {
                return;
            };
            if let Some(state) = world.enemies.get_mut(enemy) {
                let damage = state.health;
                let _ = state.take_damage(damage);
            }
            kill(world, enemy, out_events);
        }
    }
}

fn advance_projectile(
    world: &mut World,
    id: ProjectileId,
    travel: f32,
    out_events: &mut Vec<Event>,
) {
    let Some(projectile) = world.projectiles.get_mut(id) else {
        return;
    };
    let target = projectile.target;
    let target_position = world
        .enemies
        .get(target)
        .and_then(|enemy| world.routes.get(enemy.route).map(|route| enemy.cursor.position(route)));

    let Some(target_position) = target_position else {
        assert!(
            world.enemies.was_issued(target),
            "projectile {id:?} references unknown enemy {target:?}"
        );
        let _ = world.projectiles.remove(id);
        out_events.push(Event::ProjectileDiscarded {
            projectile: id,
            target,
        });
        return;
    };

    match projectiles::step(projectile.position, target_position, travel) {
        Flight::InFlight(position) => projectile.position = position,
        Flight::Impact => {
            let damage = projectile.damage;
            let _ = world.projectiles.remove(id);
            let killed = world
                .enemies
                .get_mut(target)
                .is_some_and(|enemy| enemy.take_damage(damage));
            out_events.push(Event::ProjectileHit {
                projectile: id,
                target,
                damage,
            });
            if killed {
                kill(world, target, out_events);
            }
        }
    }
}

fn kill(world: &mut World, enemy: EnemyId, out_events: &mut Vec<Event>) {
    let Some(state) = world.enemies.remove(enemy) else {
        return;
    };
    assert!(state.health <= 0.0, "enemy {enemy:?} removed while alive");
    let reward = state.kind.stats().reward;
    debug!(enemy = enemy.get(), reward, "enemy killed");
    out_events.push(Event::EnemyKilled {
        enemy,
        kind: state.kind,
        wave: state.wave,
        reward,
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use uptime_defence_core::{
        CellCoord, EnemyId, EnemyView, ProjectileId, TowerId, TowerSnapshot, TowerView,
        WorldPoint,
    };
    use uptime_defence_system_movement::Route;

    use super::{Grid, World};

    /// Provides read-only access to the world's grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Routes enemies follow, indexed like the level paths.
    #[must_use]
    pub fn routes(world: &World) -> &[Route] {
        &world.routes
    }

    /// Captures a read-only view of every placed tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|state| state.snapshot())
    }

    /// Identifier of the tower standing on `cell`, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.towers.at_cell(cell)
    }

    /// Captures a read-only view of every live enemy in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| enemy.snapshot(&world.routes))
                .collect(),
        )
    }

    /// Number of enemies still on the map.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Projectile in flight.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Identifier of the projectile.
        pub id: ProjectileId,
        /// Tower that fired the projectile.
        pub tower: TowerId,
        /// Enemy being chased.
        pub target: EnemyId,
        /// Current position in world units.
        pub position: WorldPoint,
    }

    /// Captures every projectile in flight ordered by identifier.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                tower: projectile.tower,
                target: projectile.target,
                position: projectile.position,
            })
            .collect()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(world: &World) -> usize {
        world.projectiles.len()
    }
}
