//! Interfaces for the persistence and scoring services a host wires around
//! a session. The simulation never calls these itself.

use std::{collections::BTreeMap, error::Error as StdError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uptime_defence_core::level::{Level, LevelError};

/// Failure reported by a [`LevelStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No level is stored under the identifier.
    #[error("level {id} not found")]
    NotFound {
        /// Identifier that was requested.
        id: u32,
    },
    /// The stored or submitted level failed validation.
    #[error("level {id} is invalid")]
    Invalid {
        /// Identifier of the offending level.
        id: u32,
        /// Validation failure.
        #[source]
        source: LevelError,
    },
    /// The storage backend failed.
    #[error("level storage failed")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

/// Loads and saves level data by identifier.
pub trait LevelStore {
    /// Loads the level stored under `id`.
    fn load(&self, id: u32) -> Result<Level, StoreError>;

    /// Stores `level` under its own identifier, replacing any previous one.
    fn save(&mut self, level: &Level) -> Result<(), StoreError>;

    /// Identifiers of every stored level in ascending order.
    fn list(&self) -> Result<Vec<u32>, StoreError>;
}

/// Level store kept in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLevelStore {
    levels: BTreeMap<u32, Level>,
}

impl InMemoryLevelStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the built-in tutorial level.
    #[must_use]
    pub fn with_tutorial() -> Self {
        let tutorial = Level::tutorial();
        let mut levels = BTreeMap::new();
        let _ = levels.insert(tutorial.id, tutorial);
        Self { levels }
    }
}

impl LevelStore for InMemoryLevelStore {
    fn load(&self, id: u32) -> Result<Level, StoreError> {
        self.levels
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    fn save(&mut self, level: &Level) -> Result<(), StoreError> {
        level.validate().map_err(|source| StoreError::Invalid {
            id: level.id,
            source,
        })?;
        let _ = self.levels.insert(level.id, level.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<u32>, StoreError> {
        Ok(self.levels.keys().copied().collect())
    }
}

/// Final result of a session sent to a score service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    /// Identifier of the player.
    pub player_id: String,
    /// Display name of the player.
    pub name: String,
    /// Final score.
    pub score: u32,
    /// Level the score was achieved on.
    pub level_id: u32,
}

/// Failure reported by a [`ScoreSubmitter`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The service refused the submission.
    #[error("score rejected: {0}")]
    Rejected(String),
    /// The service could not be reached or failed.
    #[error("score submission failed")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

/// Accepts final session scores.
pub trait ScoreSubmitter {
    /// Records `submission`.
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError>;
}

/// Score board kept in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryScoreBoard {
    entries: Vec<ScoreSubmission>,
}

impl InMemoryScoreBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Best `limit` submissions for `level_id`, highest score first and
    /// earliest submission first among equal scores.
    #[must_use]
    pub fn top(&self, level_id: u32, limit: usize) -> Vec<&ScoreSubmission> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| entry.level_id == level_id)
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit);
        entries
    }
}

impl ScoreSubmitter for InMemoryScoreBoard {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        if submission.player_id.is_empty() {
            return Err(SubmitError::Rejected("missing player id".to_owned()));
        }
        self.entries.push(submission.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(player: &str, score: u32, level_id: u32) -> ScoreSubmission {
        ScoreSubmission {
            player_id: player.to_owned(),
            name: player.to_uppercase(),
            score,
            level_id,
        }
    }

    #[test]
    fn store_round_trips_valid_levels() {
        let mut store = InMemoryLevelStore::new();
        let mut level = Level::tutorial();
        level.id = 7;

        store.save(&level).expect("valid level saves");

        assert_eq!(store.load(7).expect("stored"), level);
        assert_eq!(store.list().expect("lists"), vec![7]);
        assert!(matches!(store.load(8), Err(StoreError::NotFound { id: 8 })));
    }

    #[test]
    fn store_rejects_invalid_levels() {
        let mut store = InMemoryLevelStore::with_tutorial();
        let mut level = Level::tutorial();
        level.id = 9;
        level.paths.clear();

        let error = store.save(&level).expect_err("invalid level");

        assert!(matches!(
            error,
            StoreError::Invalid {
                id: 9,
                source: LevelError::NoPaths
            }
        ));
        assert_eq!(store.list().expect("lists").len(), 1);
    }

    #[test]
    fn board_ranks_scores_per_level() {
        let mut board = InMemoryScoreBoard::new();
        for entry in [
            submission("ana", 300, 1),
            submission("bo", 500, 1),
            submission("cy", 300, 1),
            submission("di", 900, 2),
        ] {
            board.submit(&entry).expect("accepted");
        }

        let names: Vec<_> = board
            .top(1, 2)
            .into_iter()
            .map(|entry| entry.player_id.as_str())
            .collect();
        assert_eq!(names, vec!["bo", "ana"]);
        assert!(board.submit(&submission("", 1, 1)).is_err());
    }
}
