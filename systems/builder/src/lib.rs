#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system that turns cursor input into tower management commands.

use uptime_defence_core::{CellCoord, Event, PlacementError, SessionCommand, TowerId, TowerKind};

/// Declarative placement preview describing a potential tower construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Kind of tower proposed for placement.
    pub kind: TowerKind,
    /// Cell the tower would occupy.
    pub cell: CellCoord,
    /// Reason the cell cannot take the tower, if any.
    pub blocked_by: Option<PlacementError>,
    /// Price of the tower.
    pub cost: u32,
    /// Indicates whether the player can currently afford the tower.
    pub affordable: bool,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub const fn new(
        kind: TowerKind,
        cell: CellCoord,
        blocked_by: Option<PlacementError>,
        cost: u32,
        affordable: bool,
    ) -> Self {
        Self {
            kind,
            cell,
            blocked_by,
            cost,
            affordable,
        }
    }

    /// Indicates whether the cell accepts the tower, ignoring funds.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.blocked_by.is_none()
    }

    /// Indicates whether confirming the preview would succeed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.placeable() && self.affordable
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player requested selling the hovered tower.
    pub remove_action: bool,
    /// Indicates whether the player requested upgrading the hovered tower.
    pub upgrade_action: bool,
    /// Cell currently hovered by the cursor.
    pub cursor_cell: Option<CellCoord>,
}

/// Builder system that translates preview + input into session commands.
#[derive(Debug, Clone)]
pub struct Builder {
    enabled: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self { enabled: true }
    }

    /// Consumes session events and adapter-derived input to emit commands.
    ///
    /// The builder stops emitting once the session is won or lost and
    /// resumes after a reset. The `tower_at` closure should mirror the
    /// semantics of the world's `query::tower_at` helper so the system can
    /// identify the hovered tower.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        preview: Option<PlacementPreview>,
        input: BuilderInput,
        mut tower_at: F,
        out: &mut Vec<SessionCommand>,
    ) where
        F: FnMut(CellCoord) -> Option<TowerId>,
    {
        for event in events {
            match event {
                Event::SessionWon { .. } | Event::SessionLost { .. } => self.enabled = false,
                Event::SessionReset => self.enabled = true,
                _ => {}
            }
        }

        if !self.enabled {
            return;
        }

        if input.confirm_action {
            if let Some(preview) = preview {
                if preview.is_valid() {
                    out.push(SessionCommand::PlaceTower {
                        kind: preview.kind,
                        cell: preview.cell,
                    });
                }
            }
        }

        if !input.remove_action && !input.upgrade_action {
            return;
        }
        let Some(tower) = input.cursor_cell.and_then(&mut tower_at) else {
            return;
        };
        if input.remove_action {
            out.push(SessionCommand::SellTower { tower });
        } else {
            out.push(SessionCommand::UpgradeTower { tower });
        }
    }
}
