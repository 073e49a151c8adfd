//! Money, damage budget, score and the session's terminal state.

use serde::Serialize;
use uptime_defence_core::Event;

/// Terminal state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The session is still being played.
    Running,
    /// Every wave was cleared.
    Won,
    /// The damage budget ran out.
    Lost,
}

/// Resource ledger owned by the session.
///
/// Once the outcome leaves [`Outcome::Running`] every mutation is a no-op;
/// only rebuilding the ledger brings it back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    money: u32,
    damage_budget: u32,
    score: u32,
    outcome: Outcome,
    paused: bool,
}

impl Ledger {
    /// Creates a running, unpaused ledger.
    #[must_use]
    pub const fn new(money: u32, damage_budget: u32) -> Self {
        Self {
            money,
            damage_budget,
            score: 0,
            outcome: Outcome::Running,
            paused: false,
        }
    }

    /// Money available to the player.
    #[must_use]
    pub const fn money(&self) -> u32 {
        self.money
    }

    /// Remaining damage budget.
    #[must_use]
    pub const fn damage_budget(&self) -> u32 {
        self.damage_budget
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Terminal state of the session.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Reports whether the session ended.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.outcome != Outcome::Running
    }

    /// Reports whether ticking is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Deducts `amount` if the balance covers it.
    ///
    /// Returns `false` without mutating anything otherwise.
    pub fn spend_money(&mut self, amount: u32, out: &mut Vec<Event>) -> bool {
        if self.is_terminal() || self.money < amount {
            return false;
        }
        self.money -= amount;
        out.push(Event::MoneyChanged { money: self.money });
        true
    }

    /// Credits `amount` to the balance.
    pub fn add_money(&mut self, amount: u32, out: &mut Vec<Event>) {
        if self.is_terminal() {
            return;
        }
        self.money = self.money.saturating_add(amount);
        out.push(Event::MoneyChanged { money: self.money });
    }

    /// Adds `amount` to the score.
    pub fn add_score(&mut self, amount: u32, out: &mut Vec<Event>) {
        if self.is_terminal() {
            return;
        }
        self.score = self.score.saturating_add(amount);
        out.push(Event::ScoreChanged { score: self.score });
    }

    /// Consumes damage budget, flooring at zero.
    ///
    /// Reaching zero ends the session in defeat.
    pub fn take_damage(&mut self, amount: u32, out: &mut Vec<Event>) {
        if self.is_terminal() {
            return;
        }
        self.damage_budget = self.damage_budget.saturating_sub(amount);
        out.push(Event::DamageBudgetChanged {
            damage_budget: self.damage_budget,
        });
        if self.damage_budget == 0 {
            self.outcome = Outcome::Lost;
            out.push(Event::SessionLost { score: self.score });
        }
    }

    /// Ends the session in victory.
    pub fn declare_victory(&mut self, out: &mut Vec<Event>) {
        if self.is_terminal() {
            return;
        }
        self.outcome = Outcome::Won;
        out.push(Event::SessionWon { score: self.score });
    }

    /// Suspends ticking. Returns `false` if already paused.
    pub fn pause(&mut self, out: &mut Vec<Event>) -> bool {
        if self.paused {
            return false;
        }
        self.paused = true;
        out.push(Event::Paused);
        true
    }

    /// Resumes ticking. Returns `false` if not paused.
    pub fn resume(&mut self, out: &mut Vec<Event>) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        out.push(Event::Resumed);
        true
    }
}
