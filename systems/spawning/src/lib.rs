#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for emitting enemy spawn commands.
//!
//! Waves are consumed strictly in order. While a wave is active the scheduler
//! plays back its spawn groups against the simulated time reported through
//! [`Event::TimeAdvanced`], and it tracks every enemy of the wave until each
//! one was either killed or escaped. Only then does the wave complete and its
//! reward become claimable.

use std::time::Duration;

use uptime_defence_core::{level::WaveSpec, Command, Event, Rejection};

/// Lifecycle state of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next wave to be started.
    Idle,
    /// A wave is spawning or still has enemies on the map.
    Active,
    /// Every configured wave completed.
    AllComplete,
}

/// Liveness accounting for the active wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveProgress {
    /// Zero-based index of the wave.
    pub wave: u32,
    /// Spawn commands issued so far.
    pub issued: u32,
    /// Enemies confirmed spawned by the world.
    pub spawned: u32,
    /// Enemies of the wave that were killed.
    pub killed: u32,
    /// Enemies of the wave that escaped.
    pub escaped: u32,
    /// Reports whether every group finished spawning.
    pub spawning_finished: bool,
}

impl WaveProgress {
    fn is_resolved(&self) -> bool {
        self.spawning_finished
            && self.spawned == self.issued
            && self.killed + self.escaped == self.spawned
    }
}

#[derive(Debug)]
struct ActiveWave {
    progress: WaveProgress,
    group: usize,
    spawned_in_group: u32,
    timer: Duration,
}

/// Pure system that plays back the configured waves.
#[derive(Debug)]
pub struct WaveScheduler {
    waves: Vec<WaveSpec>,
    path_count: usize,
    started: usize,
    total_issued: u64,
    active: Option<ActiveWave>,
    all_complete: bool,
}

impl WaveScheduler {
    /// Creates a scheduler for `waves`, distributing enemies round-robin over
    /// `path_count` paths.
    #[must_use]
    pub fn new(waves: Vec<WaveSpec>, path_count: usize) -> Self {
        let all_complete = waves.is_empty();
        Self {
            waves,
            path_count: path_count.max(1),
            started: 0,
            total_issued: 0,
            active: None,
            all_complete,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.all_complete {
            SchedulerState::AllComplete
        } else if self.active.is_some() {
            SchedulerState::Active
        } else {
            SchedulerState::Idle
        }
    }

    /// Reports whether a wave is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of waves started so far.
    #[must_use]
    pub fn waves_started(&self) -> u32 {
        self.started as u32
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        self.waves.len() as u32
    }

    /// Accounting for the active wave, if any.
    #[must_use]
    pub fn progress(&self) -> Option<WaveProgress> {
        self.active.as_ref().map(|active| active.progress)
    }

    /// Starts the next configured wave and returns its zero-based index.
    ///
    /// A wave without any enemy to spawn completes immediately, in which case
    /// its completion events follow `WaveStarted` in `out`.
    pub fn start_next_wave(&mut self, out: &mut Vec<Event>) -> Result<u32, Rejection> {
        if self.active.is_some() {
            return Err(Rejection::WaveAlreadyActive);
        }
        if self.started >= self.waves.len() {
            return Err(Rejection::NoWavesRemaining);
        }

        let wave = self.started as u32;
        self.started += 1;
        self.active = Some(ActiveWave {
            progress: WaveProgress {
                wave,
                ..WaveProgress::default()
            },
            group: 0,
            spawned_in_group: 0,
            timer: Duration::ZERO,
        });
        out.push(Event::WaveStarted { wave });

        self.skip_exhausted_groups();
        self.settle(out);
        Ok(wave)
    }

    /// Consumes events and emits spawn commands for elapsed time.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt, .. } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);

        if elapsed.is_zero() {
            return;
        }
        self.advance(elapsed, out);
    }

    fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let Some(spec) = self.waves.get(active.progress.wave as usize) else {
            return;
        };

        active.timer = active.timer.saturating_add(dt);
        while let Some(group) = spec.groups.get(active.group) {
            if active.spawned_in_group >= group.count {
                active.group += 1;
                active.spawned_in_group = 0;
                active.timer = Duration::ZERO;
                continue;
            }
            if active.timer < group.interval {
                break;
            }

            active.timer -= group.interval;
            active.spawned_in_group += 1;
            active.progress.issued += 1;
            let path = (self.total_issued % self.path_count as u64) as usize;
            self.total_issued += 1;
            out.push(Command::SpawnEnemy {
                kind: group.kind,
                wave: active.progress.wave,
                path,
            });
        }

        if active.group >= spec.groups.len() {
            active.progress.spawning_finished = true;
        }
    }

    fn skip_exhausted_groups(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let Some(spec) = self.waves.get(active.progress.wave as usize) else {
            return;
        };
        while spec
            .groups
            .get(active.group)
            .is_some_and(|group| group.count == 0)
        {
            active.group += 1;
        }
        if active.group >= spec.groups.len() {
            active.progress.spawning_finished = true;
        }
    }

    /// Tracks spawns, kills and escapes of the active wave and reports its
    /// completion.
    pub fn observe(&mut self, events: &[Event], out: &mut Vec<Event>) {
        if let Some(active) = self.active.as_mut() {
            let current = active.progress.wave;
            for event in events {
                match event {
                    Event::EnemySpawned { wave, .. } if *wave == current => {
                        active.progress.spawned += 1;
                    }
                    Event::EnemyKilled { wave, .. } if *wave == current => {
                        active.progress.killed += 1;
                    }
                    Event::EnemyEscaped { wave, .. } if *wave == current => {
                        active.progress.escaped += 1;
                    }
                    _ => {}
                }
            }
            assert!(
                active.progress.killed + active.progress.escaped <= active.progress.spawned,
                "wave {current} resolved more enemies than it spawned"
            );
        }
        self.settle(out);
    }

    fn settle(&mut self, out: &mut Vec<Event>) {
        let resolved = self
            .active
            .as_ref()
            .is_some_and(|active| active.progress.is_resolved());
        if !resolved {
            return;
        }
        let Some(active) = self.active.take() else {
            return;
        };

        let wave = active.progress.wave;
        let reward = self
            .waves
            .get(wave as usize)
            .map_or(0, |spec| spec.reward);
        out.push(Event::WaveCompleted { wave, reward });

        if self.started >= self.waves.len() {
            self.all_complete = true;
            out.push(Event::AllWavesCompleted);
        }
    }
}
