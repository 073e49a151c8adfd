#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cooldown- and cost-gated player abilities.
//!
//! Each ability is gated independently. Checking and activating are separate
//! operations so a user interface can preview affordability and cooldowns
//! before attempting a use. Timed effects keep a single deadline per ability:
//! triggering an ability again while its effect is running moves the
//! deadline instead of queueing a second expiry.

use std::time::Duration;

use uptime_defence_core::{AbilityKind, AbilitySpec, Command, Event, Rejection};

/// Multiplier applied to tower attack speed while scale-up is running.
pub const SCALE_UP_ATTACK_SPEED_FACTOR: f32 = 2.0;

/// Multiplier applied to enemy speed while the emergency cache is running.
pub const EMERGENCY_CACHE_SPEED_FACTOR: f32 = 0.5;

/// Result of a successful ability use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Activation {
    /// Ability that was used.
    pub kind: AbilityKind,
    /// Money the caller must deduct from the ledger.
    pub cost: u32,
    /// Session time at which a timed effect ends.
    pub until: Option<Duration>,
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    spec: AbilitySpec,
    last_used: Option<Duration>,
    active_until: Option<Duration>,
}

/// State of every ability in the catalog.
#[derive(Clone, Debug)]
pub struct Abilities {
    slots: [Slot; 3],
}

impl Default for Abilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Abilities {
    /// Creates the ability set with every ability ready.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: AbilityKind::ALL.map(|kind| Slot {
                spec: kind.spec(),
                last_used: None,
                active_until: None,
            }),
        }
    }

    fn slot(&self, kind: AbilityKind) -> &Slot {
        &self.slots[index(kind)]
    }

    /// Time left before `kind` comes off cooldown at session time `now`.
    #[must_use]
    pub fn cooldown_remaining(&self, kind: AbilityKind, now: Duration) -> Duration {
        let slot = self.slot(kind);
        match slot.last_used {
            Some(last_used) => slot
                .spec
                .cooldown
                .saturating_sub(now.saturating_sub(last_used)),
            None => Duration::ZERO,
        }
    }

    /// Checks whether `kind` could be used now with `money` available.
    pub fn check(&self, kind: AbilityKind, now: Duration, money: u32) -> Result<AbilitySpec, Rejection> {
        let spec = self.slot(kind).spec;
        let remaining = self.cooldown_remaining(kind, now);
        if !remaining.is_zero() {
            return Err(Rejection::AbilityOnCooldown { remaining });
        }
        if money < spec.cost {
            return Err(Rejection::InsufficientFunds {
                cost: spec.cost,
                available: money,
            });
        }
        Ok(spec)
    }

    /// Reports whether `kind` could be used now with `money` available.
    #[must_use]
    pub fn can_use(&self, kind: AbilityKind, now: Duration, money: u32) -> bool {
        self.check(kind, now, money).is_ok()
    }

    /// Uses `kind` if it is off cooldown and affordable.
    ///
    /// On success the use is stamped, a timed effect is (re)scheduled and any
    /// world commands the ability implies are appended to `out`. Nothing
    /// changes on failure.
    pub fn activate(
        &mut self,
        kind: AbilityKind,
        now: Duration,
        money: u32,
        out: &mut Vec<Command>,
    ) -> Result<Activation, Rejection> {
        let spec = self.check(kind, now, money)?;
        let slot = &mut self.slots[index(kind)];
        slot.last_used = Some(now);
        let until = spec.duration.map(|duration| now.saturating_add(duration));
        if until.is_some() {
            slot.active_until = until;
        }

        if kind == AbilityKind::SilenceAlerts {
            out.push(Command::ExecuteWeakest);
        }

        Ok(Activation {
            kind,
            cost: spec.cost,
            until,
        })
    }

    /// Ends every timed effect whose deadline is at or before `now`.
    ///
    /// Each effect expires exactly once regardless of how often it was
    /// re-triggered.
    pub fn handle(&mut self, now: Duration, out: &mut Vec<Event>) {
        for slot in &mut self.slots {
            if slot.active_until.is_some_and(|until| until <= now) {
                slot.active_until = None;
                out.push(Event::AbilityExpired {
                    kind: slot.spec.kind,
                });
            }
        }
    }

    /// Reports whether the timed effect of `kind` is running.
    #[must_use]
    pub fn is_active(&self, kind: AbilityKind) -> bool {
        self.slot(kind).active_until.is_some()
    }

    /// Multiplier to apply to tower attack speed.
    #[must_use]
    pub fn attack_speed_factor(&self) -> f32 {
        if self.is_active(AbilityKind::ScaleUp) {
            SCALE_UP_ATTACK_SPEED_FACTOR
        } else {
            1.0
        }
    }

    /// Multiplier to apply to enemy movement speed.
    #[must_use]
    pub fn enemy_speed_factor(&self) -> f32 {
        if self.is_active(AbilityKind::EmergencyCache) {
            EMERGENCY_CACHE_SPEED_FACTOR
        } else {
            1.0
        }
    }
}

const fn index(kind: AbilityKind) -> usize {
    match kind {
        AbilityKind::ScaleUp => 0,
        AbilityKind::EmergencyCache => 1,
        AbilityKind::SilenceAlerts => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_abilities_are_ready() {
        let abilities = Abilities::new();
        for kind in AbilityKind::ALL {
            assert_eq!(abilities.cooldown_remaining(kind, Duration::ZERO), Duration::ZERO);
            assert!(abilities.can_use(kind, Duration::ZERO, 1_000));
            assert!(!abilities.is_active(kind));
        }
        assert_eq!(abilities.attack_speed_factor(), 1.0);
        assert_eq!(abilities.enemy_speed_factor(), 1.0);
    }

    #[test]
    fn slots_follow_catalog_order() {
        let abilities = Abilities::new();
        for kind in AbilityKind::ALL {
            assert_eq!(abilities.slot(kind).spec.kind, kind);
        }
    }

    #[test]
    fn failed_activation_changes_nothing() {
        let mut abilities = Abilities::new();
        let mut commands = Vec::new();

        let result = abilities.activate(AbilityKind::ScaleUp, Duration::ZERO, 149, &mut commands);

        assert_eq!(
            result,
            Err(Rejection::InsufficientFunds {
                cost: 150,
                available: 149,
            })
        );
        assert!(!abilities.is_active(AbilityKind::ScaleUp));
        assert!(abilities.can_use(AbilityKind::ScaleUp, Duration::ZERO, 150));
        assert!(commands.is_empty());
    }
}
