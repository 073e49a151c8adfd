#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Uptime Defence engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative world, the session driver, and pure systems. Hosts submit
//! [`SessionCommand`] values, the session translates them into world
//! [`Command`] values, the world executes those commands via its `apply`
//! entry point, and then broadcasts [`Event`] values for systems and
//! presentation adapters to react to deterministically. Systems consume
//! event streams, query immutable views, and respond exclusively with new
//! command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod level;

/// Fraction of a tower's cumulative cost refunded when it is sold.
pub const SELL_REFUND_RATIO: f64 = 0.7;

/// Distance travelled by a projectile per second, in world units.
pub const PROJECTILE_SPEED: f32 = 400.0;

/// Side length of a grid cell used when a level does not override it.
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// World mutations applied by the authoritative world.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests that an existing tower advances to its next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests removal of an existing tower in exchange for a refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Requests that a new enemy enters the first waypoint of a path.
    SpawnEnemy {
        /// Type of enemy to create.
        kind: EnemyKind,
        /// Zero-based wave the enemy belongs to.
        wave: u32,
        /// Index of the level path the enemy follows.
        path: usize,
    },
    /// Moves every live enemy along its path.
    AdvanceEnemies {
        /// Simulated time that elapsed since the previous advance.
        dt: Duration,
        /// Multiplier applied to every enemy's base speed.
        speed_factor: f32,
    },
    /// Requests that a tower launches a projectile at an enemy.
    FireProjectile {
        /// Identifier of the firing tower.
        tower: TowerId,
        /// Identifier of the enemy being targeted.
        target: EnemyId,
        /// Session time at which the shot is taken.
        at: Duration,
    },
    /// Moves every projectile toward its target and resolves impacts.
    AdvanceProjectiles {
        /// Simulated time that elapsed since the previous advance.
        dt: Duration,
    },
    /// Destroys the live enemy with the lowest remaining health.
    ExecuteWeakest,
}

/// Commands accepted from a host user interface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionCommand {
    /// Places a defender of the provided type on a cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Upgrades an existing defender.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Sells an existing defender.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Starts the next configured wave.
    StartNextWave,
    /// Triggers a player ability.
    UseAbility {
        /// Ability to trigger.
        kind: AbilityKind,
    },
    /// Suspends ticking.
    Pause,
    /// Resumes ticking.
    Resume,
    /// Reinitialises the whole session from its level.
    Reset,
    /// Advances the simulation.
    Tick {
        /// Driver clock reading; the session clock advances by `dt` alone.
        now: Duration,
        /// Time elapsed since the previous tick, before capping.
        dt: Duration,
    },
}

/// Notifications broadcast by the world, the systems and the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Session time at the end of the tick.
        now: Duration,
        /// Capped duration applied during the tick.
        dt: Duration,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Price paid for the tower.
        cost: u32,
    },
    /// Confirms that a tower advanced to a new level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached by the tower.
        level: u32,
        /// Price paid for the upgrade.
        cost: u32,
    },
    /// Confirms that a tower was sold and its cell freed.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Cell previously occupied by the tower.
        cell: CellCoord,
        /// Money returned to the player.
        refund: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that an upgrade or sale referenced an unknown tower.
    TowerRemovalRejected {
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the request failed.
        reason: RemovalError,
    },
    /// Confirms that an enemy entered the map.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Zero-based wave that produced the enemy.
        wave: u32,
        /// Index of the path the enemy follows.
        path: usize,
    },
    /// Reports that an enemy completed its path.
    EnemyEscaped {
        /// Identifier of the escaped enemy.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Zero-based wave that produced the enemy.
        wave: u32,
        /// Damage budget consumed by the escape.
        damage: u32,
    },
    /// Reports that an enemy's health reached zero.
    EnemyKilled {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Zero-based wave that produced the enemy.
        wave: u32,
        /// Money earned for the kill.
        reward: u32,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy being chased.
        target: EnemyId,
    },
    /// Reports that a projectile reached its target and dealt damage.
    ProjectileHit {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Enemy that was struck.
        target: EnemyId,
        /// Damage applied to the enemy.
        damage: f32,
    },
    /// Reports that a projectile lost its target and vanished harmlessly.
    ProjectileDiscarded {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Enemy that was no longer live.
        target: EnemyId,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Zero-based index of the wave.
        wave: u32,
    },
    /// Announces that every enemy of a wave spawned and resolved.
    WaveCompleted {
        /// Zero-based index of the wave.
        wave: u32,
        /// Bonus money earned for the wave.
        reward: u32,
    },
    /// Announces that the final configured wave completed.
    AllWavesCompleted,
    /// Confirms that an ability was triggered.
    AbilityActivated {
        /// Ability that was triggered.
        kind: AbilityKind,
        /// Session time at which a timed effect ends, if any.
        until: Option<Duration>,
    },
    /// Announces the end of a timed ability effect.
    AbilityExpired {
        /// Ability whose effect ended.
        kind: AbilityKind,
    },
    /// Reports the player's balance after a change.
    MoneyChanged {
        /// Current balance.
        money: u32,
    },
    /// Reports the remaining damage budget after a change.
    DamageBudgetChanged {
        /// Current damage budget.
        damage_budget: u32,
    },
    /// Reports the score after a change.
    ScoreChanged {
        /// Current score.
        score: u32,
    },
    /// Confirms that ticking was suspended.
    Paused,
    /// Confirms that ticking resumed.
    Resumed,
    /// Announces that the session ended in victory.
    SessionWon {
        /// Final score.
        score: u32,
    },
    /// Announces that the session ended because the damage budget ran out.
    SessionLost {
        /// Final score.
        score: u32,
    },
    /// Confirms that the session was reinitialised from its level.
    SessionReset,
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy. Identifiers are never reused
/// within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Level files produced by the editor spell the fields `x` and `y`; both
/// spellings are accepted when deserialising.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    #[serde(alias = "x")]
    column: u32,
    #[serde(alias = "y")]
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Continuous position measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point, computed in double
    /// precision so range boundaries compare exactly.
    #[must_use]
    pub fn distance_squared(self, other: WorldPoint) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Linear interpolation toward `other` by `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: WorldPoint, t: f32) -> WorldPoint {
        WorldPoint::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Types of towers that can be constructed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Rate limiter with balanced damage and range.
    Nginx,
    /// Fast, low damage defender.
    LoadBalancer,
    /// Short range cache with quick attacks.
    Redis,
    /// Long range queue with slow, heavy attacks.
    Kafka,
    /// Very high damage, short range defender.
    Database,
    /// Very fast, very long range, low damage defender.
    Monitoring,
}

impl TowerKind {
    /// Every tower kind in catalog order.
    pub const ALL: [TowerKind; 6] = [
        Self::Nginx,
        Self::LoadBalancer,
        Self::Redis,
        Self::Kafka,
        Self::Database,
        Self::Monitoring,
    ];

    /// Level one statistics for the tower kind.
    #[must_use]
    pub const fn base_stats(self) -> TowerStats {
        let (damage, range, attack_speed, cost, upgrade_cost) = match self {
            Self::Nginx => (10.0, 150.0, 1.0, 100, 150),
            Self::LoadBalancer => (5.0, 120.0, 2.0, 150, 200),
            Self::Redis => (8.0, 100.0, 1.5, 120, 180),
            Self::Kafka => (15.0, 180.0, 0.5, 200, 300),
            Self::Database => (20.0, 100.0, 0.8, 180, 270),
            Self::Monitoring => (3.0, 200.0, 3.0, 80, 120),
        };
        TowerStats {
            level: 1,
            damage,
            range,
            attack_speed,
            cost,
            upgrade_cost,
        }
    }

    /// Stable lowercase name used by level files and command lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nginx => "nginx",
            Self::LoadBalancer => "load_balancer",
            Self::Redis => "redis",
            Self::Kafka => "kafka",
            Self::Database => "database",
            Self::Monitoring => "monitoring",
        }
    }

    /// Looks up a tower kind by its stable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Combat and economy statistics carried by a tower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Upgrade level, starting at one.
    pub level: u32,
    /// Damage dealt by each projectile.
    pub damage: f32,
    /// Targeting radius in world units, inclusive.
    pub range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Cumulative money invested in the tower.
    pub cost: u32,
    /// Price of the next upgrade.
    pub upgrade_cost: u32,
}

impl TowerStats {
    /// Returns the statistics after a single upgrade.
    ///
    /// Damage grows by half, range by a tenth and attack speed by a fifth.
    /// The upgrade price is folded into the cumulative cost and the next
    /// upgrade becomes half again as expensive, rounded to the nearest unit.
    #[must_use]
    pub fn upgraded(self) -> Self {
        Self {
            level: self.level + 1,
            damage: self.damage * 1.5,
            range: self.range * 1.1,
            attack_speed: self.attack_speed * 1.2,
            cost: self.cost.saturating_add(self.upgrade_cost),
            upgrade_cost: round_to_u32(f64::from(self.upgrade_cost) * 1.5),
        }
    }

    /// Money returned when the tower is sold.
    #[must_use]
    pub fn sell_value(&self) -> u32 {
        round_to_u32(f64::from(self.cost) * SELL_REFUND_RATIO)
    }

    /// Minimum time between two attacks once `factor` scales the attack speed.
    ///
    /// A non-positive effective attack speed never becomes ready.
    #[must_use]
    pub fn attack_cooldown(&self, factor: f32) -> Duration {
        let per_second = f64::from(self.attack_speed) * f64::from(factor);
        if per_second <= 0.0 || !per_second.is_finite() {
            return Duration::MAX;
        }
        Duration::from_secs_f64(1.0 / per_second)
    }
}

fn round_to_u32(value: f64) -> u32 {
    let rounded = value.round();
    if rounded <= 0.0 {
        0
    } else if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Types of hostile units that traverse the level paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Fast and numerous basic threat.
    TrafficSpike,
    /// Very fast, dangerous attacker.
    Ddos,
    /// Slow unit with moderate health.
    MemoryLeak,
    /// Tanky, very slow unit.
    SlowQuery,
    /// Boss unit with massive health and damage.
    FridayDeploy,
}

impl EnemyKind {
    /// Every enemy kind in catalog order.
    pub const ALL: [EnemyKind; 5] = [
        Self::TrafficSpike,
        Self::Ddos,
        Self::MemoryLeak,
        Self::SlowQuery,
        Self::FridayDeploy,
    ];

    /// Statistics assigned to freshly spawned enemies of this kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        let (max_health, speed, escape_damage, reward) = match self {
            Self::TrafficSpike => (50.0, 100.0, 10, 10),
            Self::Ddos => (100.0, 150.0, 20, 20),
            Self::MemoryLeak => (80.0, 60.0, 15, 15),
            Self::SlowQuery => (120.0, 40.0, 25, 25),
            Self::FridayDeploy => (200.0, 80.0, 50, 50),
        };
        EnemyStats {
            max_health,
            speed,
            escape_damage,
            reward,
        }
    }
}

/// Statistics describing an enemy kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Health at spawn.
    pub max_health: f32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Damage budget consumed when the enemy escapes.
    pub escape_damage: u32,
    /// Money awarded when the enemy is killed.
    pub reward: u32,
}

/// Player abilities with cooldown and cost gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Doubles every tower's attack speed for a while.
    ScaleUp,
    /// Halves every enemy's speed for a while.
    EmergencyCache,
    /// Instantly destroys the weakest enemy.
    SilenceAlerts,
}

impl AbilityKind {
    /// Every ability kind in catalog order.
    pub const ALL: [AbilityKind; 3] = [Self::ScaleUp, Self::EmergencyCache, Self::SilenceAlerts];

    /// Catalog entry for the ability.
    #[must_use]
    pub const fn spec(self) -> AbilitySpec {
        match self {
            Self::ScaleUp => AbilitySpec {
                kind: self,
                cooldown: Duration::from_secs(30),
                cost: 150,
                duration: Some(Duration::from_secs(10)),
            },
            Self::EmergencyCache => AbilitySpec {
                kind: self,
                cooldown: Duration::from_secs(25),
                cost: 100,
                duration: Some(Duration::from_secs(8)),
            },
            Self::SilenceAlerts => AbilitySpec {
                kind: self,
                cooldown: Duration::from_secs(20),
                cost: 120,
                duration: None,
            },
        }
    }

    /// Stable lowercase name used on command lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ScaleUp => "scale_up",
            Self::EmergencyCache => "emergency_cache",
            Self::SilenceAlerts => "silence_alerts",
        }
    }
}

/// Cooldown, cost and duration of an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySpec {
    /// Ability described by the entry.
    pub kind: AbilityKind,
    /// Minimum time between two uses.
    pub cooldown: Duration,
    /// Money spent per use.
    pub cost: u32,
    /// Length of the timed effect, if the ability has one.
    pub duration: Option<Duration>,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell is part of an enemy path.
    #[error("cell is part of an enemy path")]
    OnPath,
    /// The requested cell does not allow construction.
    #[error("cell is not buildable")]
    NotBuildable,
    /// The requested cell already hosts a tower.
    #[error("cell is already occupied")]
    Occupied,
}

/// Reasons a tower upgrade or sale may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RemovalError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Reasons a host command was refused. Rejections are expected outcomes of
/// user interaction and never indicate a broken simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Rejection {
    /// The tower cannot be placed on the requested cell.
    #[error("invalid placement: {0}")]
    Placement(PlacementError),
    /// The player cannot afford the requested action.
    #[error("insufficient funds: need {cost}, have {available}")]
    InsufficientFunds {
        /// Price of the action.
        cost: u32,
        /// Money currently available.
        available: u32,
    },
    /// The referenced tower does not exist.
    #[error("no such tower")]
    MissingTower,
    /// The ability has not finished its cooldown.
    #[error("ability on cooldown for another {remaining:?}")]
    AbilityOnCooldown {
        /// Time left before the ability becomes usable.
        remaining: Duration,
    },
    /// A wave is already spawning or has enemies on the map.
    #[error("a wave is already active")]
    WaveAlreadyActive,
    /// Every configured wave has already been started.
    #[error("no waves remaining")]
    NoWavesRemaining,
    /// The session already ended in victory or defeat.
    #[error("session is over")]
    SessionOver,
}

impl From<PlacementError> for Rejection {
    fn from(error: PlacementError) -> Self {
        Self::Placement(error)
    }
}

impl From<RemovalError> for Rejection {
    fn from(error: RemovalError) -> Self {
        match error {
            RemovalError::MissingTower => Self::MissingTower,
        }
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Centre of the occupied cell in world units.
    pub position: WorldPoint,
    /// Current statistics, including upgrades.
    pub stats: TowerStats,
    /// Session time of the most recent attack, if any.
    pub last_attack: Option<Duration>,
}

/// Read-only snapshot describing all towers placed on the grid.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single tower by identifier.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Reports whether the view contains no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single live enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Type of the enemy.
    pub kind: EnemyKind,
    /// Zero-based wave that produced the enemy.
    pub wave: u32,
    /// Current position in world units.
    pub position: WorldPoint,
    /// Remaining health, within `[0, max_health]`.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
}

/// Read-only snapshot describing all live enemies, ordered by identifier
/// and therefore by spawn order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of live enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Target assignment computed for a single tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that acquired the target.
    pub tower: TowerId,
    /// Enemy selected as the target.
    pub enemy: EnemyId,
    /// Tower position in world units.
    pub tower_position: WorldPoint,
    /// Enemy position in world units at acquisition time.
    pub enemy_position: WorldPoint,
}

#[cfg(test)]
mod tests {
    use super::{
        AbilityKind, CellCoord, EnemyKind, PlacementError, Rejection, RemovalError, TowerId,
        TowerKind, TowerStats, WorldPoint,
    };
    use serde::{de::DeserializeOwned, Serialize};
    use std::time::Duration;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn contracts_round_trip_through_bincode() {
        assert_round_trip(&TowerId::new(42));
        assert_round_trip(&CellCoord::new(5, 7));
        assert_round_trip(&TowerKind::LoadBalancer);
        assert_round_trip(&EnemyKind::FridayDeploy);
        assert_round_trip(&PlacementError::Occupied);
        assert_round_trip(&RemovalError::MissingTower);
        assert_round_trip(&Rejection::InsufficientFunds {
            cost: 100,
            available: 40,
        });
    }

    #[test]
    fn upgrade_follows_growth_rules() {
        let upgraded = TowerKind::Nginx.base_stats().upgraded();

        assert_eq!(upgraded.level, 2);
        assert_eq!(upgraded.cost, 250);
        assert_eq!(upgraded.upgrade_cost, 225);
        assert!((upgraded.damage - 15.0).abs() < 1e-4);
        assert!((upgraded.range - 165.0).abs() < 1e-3);
        assert!((upgraded.attack_speed - 1.2).abs() < 1e-5);
    }

    #[test]
    fn upgrade_cost_rounds_half_away_from_zero() {
        let stats = TowerStats {
            upgrade_cost: 225,
            ..TowerKind::Nginx.base_stats()
        };
        assert_eq!(stats.upgraded().upgrade_cost, 338);
    }

    #[test]
    fn sell_value_refunds_seventy_percent_rounded() {
        assert_eq!(TowerKind::Nginx.base_stats().sell_value(), 70);
        assert_eq!(TowerKind::Nginx.base_stats().upgraded().sell_value(), 175);
        assert_eq!(TowerKind::Redis.base_stats().sell_value(), 84);
        assert_eq!(TowerKind::Monitoring.base_stats().sell_value(), 56);
    }

    #[test]
    fn attack_cooldown_scales_with_factor() {
        let stats = TowerKind::LoadBalancer.base_stats();
        assert_eq!(stats.attack_cooldown(1.0), Duration::from_millis(500));
        assert_eq!(stats.attack_cooldown(2.0), Duration::from_millis(250));
        assert_eq!(stats.attack_cooldown(0.0), Duration::MAX);
    }

    #[test]
    fn distances_are_exact_on_axis() {
        let origin = WorldPoint::new(32.0, 32.0);
        let east = WorldPoint::new(182.0, 32.0);
        assert_eq!(origin.distance_squared(east), 22_500.0);
        assert_eq!(origin.distance(east), 150.0);
    }

    #[test]
    fn tower_names_round_trip() {
        for kind in TowerKind::ALL {
            assert_eq!(TowerKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TowerKind::from_name("mainframe"), None);
    }

    #[test]
    fn timed_abilities_expose_durations() {
        assert_eq!(
            AbilityKind::ScaleUp.spec().duration,
            Some(Duration::from_secs(10))
        );
        assert_eq!(AbilityKind::SilenceAlerts.spec().duration, None);
        assert_eq!(AbilityKind::EmergencyCache.spec().cost, 100);
    }
}
