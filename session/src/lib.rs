#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick driver and host-facing command surface for Uptime Defence.
//!
//! A [`Session`] owns the world, the pure systems and the resource ledger for
//! one play-through of a level. Hosts call the typed command methods (or
//! [`Session::apply`]) between ticks and drive time through
//! [`Session::tick`]. Every call reports what happened as a list of
//! [`Event`] values; the session never renders anything itself.
//!
//! Within a tick the components run in a fixed order: ability expiry, wave
//! spawning, enemy movement, targeting and firing, projectile resolution,
//! wave accounting, ledger settlement and finally the victory check.

mod collaborators;
mod config;
mod ledger;

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};
use uptime_defence_core::{
    level::{Level, LevelError},
    AbilityKind, CellCoord, Command, Event, Rejection, SessionCommand, TowerId, TowerKind,
    TowerTarget,
};
use uptime_defence_system_abilities::{Abilities, Activation};
use uptime_defence_system_builder::PlacementPreview;
use uptime_defence_system_spawning::{SchedulerState, WaveScheduler};
use uptime_defence_system_tower_combat::TowerCombat;
use uptime_defence_system_tower_targeting::TowerTargeting;
use uptime_defence_world::{self as world, query, World};

pub use collaborators::{
    InMemoryLevelStore, InMemoryScoreBoard, LevelStore, ScoreSubmission, ScoreSubmitter,
    StoreError, SubmitError,
};
pub use config::{AutoWaves, SessionConfig, DEFAULT_MAX_TICK_MS};
pub use ledger::{Ledger, Outcome};

/// Summary of the session state for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Money available to the player.
    pub money: u32,
    /// Remaining damage budget.
    pub damage_budget: u32,
    /// Current score.
    pub score: u32,
    /// Number of waves started so far.
    pub current_wave: u32,
    /// Number of configured waves.
    pub total_waves: u32,
    /// Indicates whether a wave is in progress.
    pub wave_active: bool,
    /// Indicates whether ticking is suspended.
    pub paused: bool,
    /// Indicates whether the session was lost.
    pub over: bool,
    /// Indicates whether the session was won.
    pub won: bool,
}

/// One play-through of a level.
#[derive(Debug)]
pub struct Session {
    level: Level,
    config: SessionConfig,
    world: World,
    scheduler: WaveScheduler,
    targeting: TowerTargeting,
    combat: TowerCombat,
    abilities: Abilities,
    ledger: Ledger,
    targets: Vec<TowerTarget>,
    now: Duration,
    idle_since: Option<Duration>,
}

impl Session {
    /// Creates a session for `level`.
    ///
    /// Malformed levels are refused so that no tick ever runs against them.
    pub fn new(level: Level, config: SessionConfig) -> Result<Self, LevelError> {
        level.validate()?;
        let world = World::from_level(&level);
        let scheduler = WaveScheduler::new(level.waves.clone(), level.paths.len());
        let ledger = Ledger::new(level.starting_money, level.starting_error_budget);
        info!(
            level = level.id,
            name = %level.name,
            waves = level.waves.len(),
            "session created"
        );
        Ok(Self {
            level,
            config,
            world,
            scheduler,
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            abilities: Abilities::new(),
            ledger,
            targets: Vec::new(),
            now: Duration::ZERO,
            idle_since: None,
        })
    }

    /// Level the session plays.
    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Resource ledger.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Wave scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    /// Session clock: the sum of every capped step simulated so far.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Summary of the session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            money: self.ledger.money(),
            damage_budget: self.ledger.damage_budget(),
            score: self.ledger.score(),
            current_wave: self.scheduler.waves_started(),
            total_waves: self.scheduler.total_waves(),
            wave_active: self.scheduler.is_active(),
            paused: self.ledger.is_paused(),
            over: self.ledger.outcome() == Outcome::Lost,
            won: self.ledger.outcome() == Outcome::Won,
        }
    }

    /// Score submission for a finished session, or `None` while it runs.
    #[must_use]
    pub fn submission(&self, player_id: &str, name: &str) -> Option<ScoreSubmission> {
        if !self.ledger.is_terminal() {
            return None;
        }
        Some(ScoreSubmission {
            player_id: player_id.to_owned(),
            name: name.to_owned(),
            score: self.ledger.score(),
            level_id: self.level.id,
        })
    }

    /// Describes what placing `kind` on `cell` would do, without mutating
    /// anything.
    #[must_use]
    pub fn preview_placement(&self, kind: TowerKind, cell: CellCoord) -> PlacementPreview {
        let cost = kind.base_stats().cost;
        PlacementPreview::new(
            kind,
            cell,
            query::grid(&self.world).placement_error(cell),
            cost,
            self.ledger.money() >= cost,
        )
    }

    /// Reports whether `kind` could be used right now.
    #[must_use]
    pub fn can_use_ability(&self, kind: AbilityKind) -> bool {
        !self.ledger.is_terminal() && self.abilities.can_use(kind, self.now, self.ledger.money())
    }

    /// Time left before `kind` comes off cooldown.
    #[must_use]
    pub fn ability_cooldown(&self, kind: AbilityKind) -> Duration {
        self.abilities.cooldown_remaining(kind, self.now)
    }

    /// Reports whether the timed effect of `kind` is running.
    #[must_use]
    pub fn ability_active(&self, kind: AbilityKind) -> bool {
        self.abilities.is_active(kind)
    }

    fn ensure_running(&self) -> Result<(), Rejection> {
        if self.ledger.is_terminal() {
            Err(Rejection::SessionOver)
        } else {
            Ok(())
        }
    }

    /// Places a level-one tower of `kind` on `cell`, paying its cost.
    pub fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<TowerId, Rejection> {
        self.ensure_running()?;
        let cost = kind.base_stats().cost;
        let available = self.ledger.money();
        if available < cost && query::grid(&self.world).is_valid_placement(cell) {
            return Err(Rejection::InsufficientFunds { cost, available });
        }

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::PlaceTower { kind, cell },
            &mut events,
        );
        let outcome = match events.first() {
            Some(Event::TowerPlaced { tower, .. }) => {
                let tower = *tower;
                let spent = self.ledger.spend_money(cost, &mut events);
                assert!(spent, "placement of {cost} was not covered");
                Ok(tower)
            }
            Some(Event::TowerPlacementRejected { reason, .. }) => Err((*reason).into()),
            other => unreachable!("unexpected placement outcome {other:?}"),
        };
        out.extend(events);
        outcome
    }

    /// Advances `tower` one level, paying its upgrade cost.
    ///
    /// Returns the level reached.
    pub fn upgrade_tower(
        &mut self,
        tower: TowerId,
        out: &mut Vec<Event>,
    ) -> Result<u32, Rejection> {
        self.ensure_running()?;
        if let Some(snapshot) = query::tower(&self.world, tower) {
            let cost = snapshot.stats.upgrade_cost;
            let available = self.ledger.money();
            if available < cost {
                return Err(Rejection::InsufficientFunds { cost, available });
            }
        }

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::UpgradeTower { tower }, &mut events);
        let outcome = match events.first() {
            Some(Event::TowerUpgraded { level, cost, .. }) => {
                let (level, cost) = (*level, *cost);
                let spent = self.ledger.spend_money(cost, &mut events);
                assert!(spent, "upgrade of {cost} was not covered");
                Ok(level)
            }
            Some(Event::TowerRemovalRejected { reason, .. }) => Err((*reason).into()),
            other => unreachable!("unexpected upgrade outcome {other:?}"),
        };
        out.extend(events);
        outcome
    }

    /// Sells `tower`, freeing its cell. Returns the refund.
    pub fn sell_tower(&mut self, tower: TowerId, out: &mut Vec<Event>) -> Result<u32, Rejection> {
        self.ensure_running()?;
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::SellTower { tower }, &mut events);
        let outcome = match events.first() {
            Some(Event::TowerSold { refund, .. }) => {
                let refund = *refund;
                self.ledger.add_money(refund, &mut events);
                Ok(refund)
            }
            Some(Event::TowerRemovalRejected { reason, .. }) => Err((*reason).into()),
            other => unreachable!("unexpected sale outcome {other:?}"),
        };
        out.extend(events);
        outcome
    }

    /// Starts the next configured wave. Returns its zero-based index.
    pub fn start_next_wave(&mut self, out: &mut Vec<Event>) -> Result<u32, Rejection> {
        self.ensure_running()?;
        let mut events = Vec::new();
        let wave = self.scheduler.start_next_wave(&mut events)?;
        info!(wave, "wave started");
        self.conclude(events, out);
        Ok(wave)
    }

    /// Uses an ability at the current session time, paying its cost.
    pub fn use_ability(
        &mut self,
        kind: AbilityKind,
        out: &mut Vec<Event>,
    ) -> Result<Activation, Rejection> {
        self.ensure_running()?;
        let mut commands = Vec::new();
        let activation = self
            .abilities
            .activate(kind, self.now, self.ledger.money(), &mut commands)?;

        let mut events = Vec::new();
        let spent = self.ledger.spend_money(activation.cost, &mut events);
        assert!(spent, "ability cost {} was not covered", activation.cost);
        events.push(Event::AbilityActivated {
            kind,
            until: activation.until,
        });
        debug!(ability = kind.name(), "ability activated");
        out.extend(events);

        let mut resolved = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut resolved);
        }
        self.conclude(resolved, out);
        Ok(activation)
    }

    /// Suspends ticking. Repeated calls change nothing.
    pub fn pause(&mut self, out: &mut Vec<Event>) -> Result<(), Rejection> {
        self.ensure_running()?;
        if self.ledger.pause(out) {
            debug!("session paused");
        }
        Ok(())
    }

    /// Resumes ticking. Repeated calls change nothing.
    pub fn resume(&mut self, out: &mut Vec<Event>) -> Result<(), Rejection> {
        self.ensure_running()?;
        if self.ledger.resume(out) {
            debug!("session resumed");
        }
        Ok(())
    }

    /// Reinitialises every component from the level, discarding towers,
    /// enemies, projectiles and timers.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        self.world = World::from_level(&self.level);
        self.scheduler = WaveScheduler::new(self.level.waves.clone(), self.level.paths.len());
        self.targeting = TowerTargeting::new();
        self.combat = TowerCombat::new();
        self.abilities = Abilities::new();
        self.ledger = Ledger::new(self.level.starting_money, self.level.starting_error_budget);
        self.targets.clear();
        self.now = Duration::ZERO;
        self.idle_since = None;
        info!(level = self.level.id, "session reset");

        out.push(Event::SessionReset);
        out.push(Event::MoneyChanged {
            money: self.ledger.money(),
        });
        out.push(Event::DamageBudgetChanged {
            damage_budget: self.ledger.damage_budget(),
        });
        out.push(Event::ScoreChanged {
            score: self.ledger.score(),
        });
    }

    /// Executes a host command, appending its events to `out`.
    pub fn apply(
        &mut self,
        command: SessionCommand,
        out: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        let result = match command {
            SessionCommand::PlaceTower { kind, cell } => {
                self.place_tower(kind, cell, out).map(drop)
            }
            SessionCommand::UpgradeTower { tower } => self.upgrade_tower(tower, out).map(drop),
            SessionCommand::SellTower { tower } => self.sell_tower(tower, out).map(drop),
            SessionCommand::StartNextWave => self.start_next_wave(out).map(drop),
            SessionCommand::UseAbility { kind } => self.use_ability(kind, out).map(drop),
            SessionCommand::Pause => self.pause(out),
            SessionCommand::Resume => self.resume(out),
            SessionCommand::Reset => {
                self.reset(out);
                Ok(())
            }
            SessionCommand::Tick { now, dt } => {
                out.extend(self.tick(now, dt));
                Ok(())
            }
        };
        if let Err(rejection) = &result {
            warn!(?command, %rejection, "command rejected");
        }
        result
    }

    /// Advances the simulation by `dt`.
    ///
    /// Nothing happens while paused or after the session ended. `dt` is
    /// capped to the configured maximum and only the capped step moves the
    /// session clock, so cooldowns, ability timers and auto waves never run
    /// ahead of the simulated world. `now` is the driver's own clock and is
    /// only traced.
    pub fn tick(&mut self, now: Duration, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        if self.ledger.is_terminal() || self.ledger.is_paused() {
            return events;
        }

        let dt = dt.min(self.config.max_tick());
        self.now += dt;
        trace!(driver = ?now, session = ?self.now, ?dt, "tick");
        let now = self.now;
        events.push(Event::TimeAdvanced { now, dt });

        self.abilities.handle(now, &mut events);
        self.start_scheduled_wave(&mut events);

        let mut commands = Vec::new();
        self.scheduler.handle(&events, &mut commands);
        commands.push(Command::AdvanceEnemies {
            dt,
            speed_factor: self.abilities.enemy_speed_factor(),
        });

        let mut resolved = Vec::new();
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut resolved);
        }

        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting.handle(&towers, &enemies, &mut self.targets);
        self.combat.handle(
            now,
            self.abilities.attack_speed_factor(),
            &towers,
            &self.targets,
            &mut commands,
        );
        commands.push(Command::AdvanceProjectiles { dt });
        for command in commands {
            world::apply(&mut self.world, command, &mut resolved);
        }

        self.conclude(resolved, &mut events);
        events
    }

    fn start_scheduled_wave(&mut self, out: &mut Vec<Event>) {
        let Some(auto) = self.config.auto_waves else {
            return;
        };
        if self.scheduler.state() != SchedulerState::Idle {
            return;
        }
        let due = match self.idle_since {
            Some(since) => since.saturating_add(auto.interval()),
            None if self.scheduler.waves_started() == 0 => auto.start_delay(),
            None => return,
        };
        if self.now < due {
            return;
        }

        let mut events = Vec::new();
        if let Ok(wave) = self.scheduler.start_next_wave(&mut events) {
            info!(wave, "wave started automatically");
            self.conclude(events, out);
        }
    }

    /// Feeds resolved world events through wave accounting, settles the
    /// ledger and checks for victory.
    fn conclude(&mut self, mut resolved: Vec<Event>, out: &mut Vec<Event>) {
        let mut wave_events = Vec::new();
        self.scheduler.observe(&resolved, &mut wave_events);
        resolved.extend(wave_events);

        let running = !self.ledger.is_terminal();
        let mut ledger_events = Vec::new();
        for event in &resolved {
            if self.ledger.is_terminal() {
                break;
            }
            match event {
                Event::EnemyKilled { reward, .. } => {
                    self.ledger.add_money(*reward, &mut ledger_events);
                    self.ledger.add_score(*reward, &mut ledger_events);
                }
                Event::EnemyEscaped { damage, .. } => {
                    self.ledger.take_damage(*damage, &mut ledger_events);
                }
                Event::WaveCompleted { wave, reward } => {
                    info!(wave, reward, "wave completed");
                    self.idle_since = Some(self.now);
                    self.ledger.add_money(*reward, &mut ledger_events);
                    self.ledger.add_score(*reward, &mut ledger_events);
                }
                Event::AllWavesCompleted => info!("all waves completed"),
                _ => {}
            }
        }
        out.extend(resolved);
        out.extend(ledger_events);

        if self.ledger.is_terminal() {
            if running {
                info!(score = self.ledger.score(), "session lost");
            }
            return;
        }
        if self.scheduler.state() == SchedulerState::AllComplete
            && query::live_enemy_count(&self.world) == 0
        {
            self.ledger.declare_victory(out);
            info!(score = self.ledger.score(), "session won");
        }
    }
}
