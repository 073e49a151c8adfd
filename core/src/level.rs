//! Static level description consumed by every simulation component.
//!
//! Levels are plain data. The field names follow the level editor export so
//! that JSON produced there deserialises unchanged; unknown fields such as
//! decorations are ignored.

use std::{collections::BTreeSet, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, EnemyKind, DEFAULT_CELL_SIZE};

/// Largest number of columns or rows a level may declare.
pub const MAX_GRID_SIDE: u32 = 256;

/// Complete description of a playable level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Identifier used by level storage.
    #[serde(default)]
    pub id: u32,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Short description shown by hosts.
    #[serde(default)]
    pub description: String,
    /// Number of grid columns.
    pub grid_width: u32,
    /// Number of grid rows.
    pub grid_height: u32,
    /// Side length of a grid cell in world units.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Cells where enemies enter the map.
    pub spawn_points: Vec<CellCoord>,
    /// Cells enemies try to reach.
    pub target_points: Vec<CellCoord>,
    /// Ordered waypoint lists followed by enemies.
    pub paths: Vec<Vec<CellCoord>>,
    /// Cells that allow construction. Empty means every non-path cell.
    #[serde(default)]
    pub buildable_area: Vec<CellCoord>,
    /// Waves played strictly in order.
    pub waves: Vec<WaveSpec>,
    /// Money available when the session starts.
    pub starting_money: u32,
    /// Damage budget available when the session starts.
    pub starting_error_budget: u32,
}

fn default_cell_size() -> f32 {
    DEFAULT_CELL_SIZE
}

/// Composition of a single wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveSpec {
    /// One-based number displayed by hosts.
    #[serde(default)]
    pub wave_number: u32,
    /// Spawn groups played in order.
    #[serde(rename = "enemies")]
    pub groups: Vec<SpawnGroup>,
    /// Bonus money granted once the wave completes.
    pub reward: u32,
}

/// Batch of identical enemies spawned at a fixed cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Type of enemy spawned by the group.
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    /// Number of enemies in the group.
    pub count: u32,
    /// Time between two spawns, stored as milliseconds.
    #[serde(with = "millis")]
    pub interval: Duration,
}

impl SpawnGroup {
    /// Creates a new spawn group.
    #[must_use]
    pub const fn new(kind: EnemyKind, count: u32, interval: Duration) -> Self {
        Self {
            kind,
            count,
            interval,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Reasons a level is refused before any simulation starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The grid has no cells.
    #[error("grid must have at least one column and one row, got {columns}x{rows}")]
    EmptyGrid {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The grid exceeds [`MAX_GRID_SIDE`] along one of its sides.
    #[error("grid of {columns}x{rows} exceeds the {max}x{max} limit")]
    GridTooLarge {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
        /// Largest accepted side.
        max: u32,
    },
    /// The cell size is not a positive finite number.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    /// The level declares no spawn point.
    #[error("level has no spawn points")]
    NoSpawnPoints,
    /// The level declares no target point.
    #[error("level has no target points")]
    NoTargetPoints,
    /// The level declares no path.
    #[error("level has no paths")]
    NoPaths,
    /// A path cannot form a single segment.
    #[error("path {path} has {len} waypoints, at least 2 are required")]
    PathTooShort {
        /// Index of the offending path.
        path: usize,
        /// Number of waypoints found.
        len: usize,
    },
    /// A cell referenced by the level lies outside the grid.
    #[error("{role} cell {cell} lies outside the {columns}x{rows} grid")]
    CellOutOfBounds {
        /// What the cell was used for.
        role: CellRole,
        /// Offending cell.
        cell: CellCoord,
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The level declares no wave, so it could never be won.
    #[error("level has no waves")]
    NoWaves,
    /// The session would be lost before the first tick.
    #[error("starting error budget must be positive")]
    ZeroErrorBudget,
}

/// Purpose of a cell referenced by a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellRole {
    /// Enemy entry point.
    Spawn,
    /// Enemy destination.
    Target,
    /// Path waypoint.
    Waypoint,
    /// Explicitly buildable cell.
    Buildable,
}

impl std::fmt::Display for CellRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Spawn => "spawn",
            Self::Target => "target",
            Self::Waypoint => "waypoint",
            Self::Buildable => "buildable",
        };
        f.write_str(label)
    }
}

impl Level {
    /// Checks that the level can be simulated.
    pub fn validate(&self) -> Result<(), LevelError> {
        let (columns, rows) = (self.grid_width, self.grid_height);
        if columns == 0 || rows == 0 {
            return Err(LevelError::EmptyGrid { columns, rows });
        }
        if columns > MAX_GRID_SIDE || rows > MAX_GRID_SIDE {
            return Err(LevelError::GridTooLarge {
                columns,
                rows,
                max: MAX_GRID_SIDE,
            });
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(LevelError::InvalidCellSize(self.cell_size));
        }
        if self.spawn_points.is_empty() {
            return Err(LevelError::NoSpawnPoints);
        }
        if self.target_points.is_empty() {
            return Err(LevelError::NoTargetPoints);
        }
        if self.paths.is_empty() {
            return Err(LevelError::NoPaths);
        }

        let check = |role: CellRole, cell: CellCoord| {
            if cell.column() < columns && cell.row() < rows {
                Ok(())
            } else {
                Err(LevelError::CellOutOfBounds {
                    role,
                    cell,
                    columns,
                    rows,
                })
            }
        };

        for cell in &self.spawn_points {
            check(CellRole::Spawn, *cell)?;
        }
        for cell in &self.target_points {
            check(CellRole::Target, *cell)?;
        }
        for (index, path) in self.paths.iter().enumerate() {
            if path.len() < 2 {
                return Err(LevelError::PathTooShort {
                    path: index,
                    len: path.len(),
                });
            }
            for cell in path {
                check(CellRole::Waypoint, *cell)?;
            }
        }
        for cell in &self.buildable_area {
            check(CellRole::Buildable, *cell)?;
        }

        if self.waves.is_empty() {
            return Err(LevelError::NoWaves);
        }
        if self.starting_error_budget == 0 {
            return Err(LevelError::ZeroErrorBudget);
        }
        Ok(())
    }

    /// Every cell enemies walk on, including spawn and target points.
    #[must_use]
    pub fn path_cells(&self) -> BTreeSet<CellCoord> {
        self.paths
            .iter()
            .flatten()
            .chain(self.spawn_points.iter())
            .chain(self.target_points.iter())
            .copied()
            .collect()
    }

    /// Built-in introductory level: a straight lane across a 20x11 grid.
    #[must_use]
    pub fn tutorial() -> Self {
        let lane: Vec<CellCoord> = (0..20).map(|column| CellCoord::new(column, 5)).collect();
        let wave = |number: u32, groups: &[(EnemyKind, u32, u64)], reward: u32| WaveSpec {
            wave_number: number,
            groups: groups
                .iter()
                .map(|&(kind, count, millis)| {
                    SpawnGroup::new(kind, count, Duration::from_millis(millis))
                })
                .collect(),
            reward,
        };

        Self {
            id: 1,
            name: "Tutorial".to_owned(),
            description: "Learn the basics".to_owned(),
            grid_width: 20,
            grid_height: 11,
            cell_size: DEFAULT_CELL_SIZE,
            spawn_points: vec![CellCoord::new(0, 5)],
            target_points: vec![CellCoord::new(19, 5)],
            paths: vec![lane],
            buildable_area: Vec::new(),
            waves: vec![
                wave(1, &[(EnemyKind::TrafficSpike, 6, 1000)], 100),
                wave(
                    2,
                    &[
                        (EnemyKind::TrafficSpike, 4, 800),
                        (EnemyKind::MemoryLeak, 3, 1500),
                    ],
                    150,
                ),
                wave(
                    3,
                    &[(EnemyKind::Ddos, 4, 1000), (EnemyKind::TrafficSpike, 5, 600)],
                    200,
                ),
                wave(
                    4,
                    &[
                        (EnemyKind::MemoryLeak, 4, 1200),
                        (EnemyKind::SlowQuery, 2, 2000),
                    ],
                    250,
                ),
                wave(
                    5,
                    &[
                        (EnemyKind::Ddos, 5, 900),
                        (EnemyKind::MemoryLeak, 3, 1300),
                        (EnemyKind::SlowQuery, 2, 1800),
                    ],
                    300,
                ),
                wave(
                    6,
                    &[
                        (EnemyKind::FridayDeploy, 1, 3000),
                        (EnemyKind::Ddos, 6, 800),
                        (EnemyKind::TrafficSpike, 7, 500),
                    ],
                    400,
                ),
            ],
            starting_money: 500,
            starting_error_budget: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutorial_level_is_valid() {
        let level = Level::tutorial();
        assert_eq!(level.validate(), Ok(()));
        assert_eq!(level.waves.len(), 6);
        assert!(level.path_cells().contains(&CellCoord::new(7, 5)));
    }

    #[test]
    fn editor_export_deserialises() {
        let json = r#"{
            "gridWidth": 6,
            "gridHeight": 4,
            "spawnPoints": [{ "x": 0, "y": 1 }],
            "targetPoints": [{ "x": 5, "y": 1 }],
            "paths": [[{ "x": 0, "y": 1 }, { "x": 5, "y": 1 }]],
            "decorations": [{ "type": "tree", "position": { "x": 2, "y": 3 } }],
            "waves": [
                { "waveNumber": 1, "enemies": [{ "type": "ddos", "count": 2, "interval": 750 }], "reward": 40 }
            ],
            "startingMoney": 300,
            "startingErrorBudget": 50
        }"#;

        let level: Level = serde_json::from_str(json).expect("editor json");

        assert_eq!(level.cell_size, DEFAULT_CELL_SIZE);
        assert_eq!(level.paths[0][1], CellCoord::new(5, 1));
        assert_eq!(
            level.waves[0].groups[0],
            SpawnGroup::new(EnemyKind::Ddos, 2, Duration::from_millis(750))
        );
        assert_eq!(level.validate(), Ok(()));
    }

    #[test]
    fn spawn_interval_serialises_as_milliseconds() {
        let group = SpawnGroup::new(EnemyKind::SlowQuery, 1, Duration::from_millis(1800));
        let json = serde_json::to_value(group).expect("serialise");
        assert_eq!(json["interval"], 1800);
        assert_eq!(json["type"], "slow_query");
    }

    #[test]
    fn rejects_short_paths() {
        let mut level = Level::tutorial();
        level.paths.push(vec![CellCoord::new(1, 1)]);
        assert_eq!(
            level.validate(),
            Err(LevelError::PathTooShort { path: 1, len: 1 })
        );
    }

    #[test]
    fn rejects_waypoints_outside_grid() {
        let mut level = Level::tutorial();
        level.paths[0].push(CellCoord::new(20, 5));
        assert!(matches!(
            level.validate(),
            Err(LevelError::CellOutOfBounds {
                role: CellRole::Waypoint,
                ..
            })
        ));
    }

    #[test]
    fn rejects_oversized_grids() {
        let mut level = Level::tutorial();
        level.grid_width = u32::MAX;
        level.grid_height = u32::MAX;
        assert_eq!(
            level.validate(),
            Err(LevelError::GridTooLarge {
                columns: u32::MAX,
                rows: u32::MAX,
                max: MAX_GRID_SIDE,
            })
        );

        let mut level = Level::tutorial();
        level.grid_height = MAX_GRID_SIDE + 1;
        assert!(matches!(
            level.validate(),
            Err(LevelError::GridTooLarge { .. })
        ));

        level.grid_height = MAX_GRID_SIDE;
        assert_eq!(level.validate(), Ok(()));
    }

    #[test]
    fn rejects_missing_sections() {
        let mut level = Level::tutorial();
        level.paths.clear();
        assert_eq!(level.validate(), Err(LevelError::NoPaths));

        let mut level = Level::tutorial();
        level.waves.clear();
        assert_eq!(level.validate(), Err(LevelError::NoWaves));

        let mut level = Level::tutorial();
        level.starting_error_budget = 0;
        assert_eq!(level.validate(), Err(LevelError::ZeroErrorBudget));

        let mut level = Level::tutorial();
        level.cell_size = 0.0;
        assert_eq!(level.validate(), Err(LevelError::InvalidCellSize(0.0)));
    }

    #[test]
    fn empty_wave_is_accepted() {
        let mut level = Level::tutorial();
        level.waves.push(WaveSpec {
            wave_number: 7,
            groups: Vec::new(),
            reward: 10,
        });
        assert_eq!(level.validate(), Ok(()));
    }
}
