//! Discrete cell layout and tower occupancy.

use uptime_defence_core::{
    level::{Level, MAX_GRID_SIDE},
    CellCoord, PlacementError, WorldPoint,
};

/// Flags describing a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridCell {
    occupied: bool,
    is_path: bool,
    is_buildable: bool,
}

impl GridCell {
    /// Reports whether a tower stands on the cell.
    #[must_use]
    pub const fn occupied(&self) -> bool {
        self.occupied
    }

    /// Reports whether enemies walk across the cell.
    #[must_use]
    pub const fn is_path(&self) -> bool {
        self.is_path
    }

    /// Reports whether the level allows construction on the cell.
    #[must_use]
    pub const fn is_buildable(&self) -> bool {
        self.is_buildable
    }
}

/// Dense grid of cells loaded from level data.
///
/// Path and buildable flags are fixed at load time. Only the occupied flag
/// changes afterwards, and only on cells that are buildable and off the
/// path.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Builds the grid described by `level`.
    ///
    /// Cells listed by the level that fall outside the grid are ignored.
    /// Sides longer than [`MAX_GRID_SIDE`] are truncated to it.
    #[must_use]
    pub fn from_level(level: &Level) -> Self {
        let columns = level.grid_width.min(MAX_GRID_SIDE);
        let rows = level.grid_height.min(MAX_GRID_SIDE);
        let len = (columns as usize)
            .checked_mul(rows as usize)
            .unwrap_or_default();
        let everywhere = level.buildable_area.is_empty();
        let mut grid = Self {
            columns,
            rows,
            cell_size: level.cell_size,
            cells: vec![
                GridCell {
                    occupied: false,
                    is_path: false,
                    is_buildable: everywhere,
                };
                len
            ],
        };

        for cell in &level.buildable_area {
            if let Some(index) = grid.index(*cell) {
                grid.cells[index].is_buildable = true;
            }
        }

        for cell in level.path_cells() {
            if let Some(index) = grid.index(cell) {
                grid.cells[index].is_path = true;
                grid.cells[index].is_buildable = false;
            }
        }

        grid
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Flags of the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<GridCell> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Centre of `cell` in world units.
    #[must_use]
    pub fn to_world(&self, cell: CellCoord) -> WorldPoint {
        WorldPoint::new(
            (cell.column() as f32 + 0.5) * self.cell_size,
            (cell.row() as f32 + 0.5) * self.cell_size,
        )
    }

    /// Cell containing `point`, found by floor division by the cell size.
    ///
    /// Negative and non-finite coordinates map to no cell. Points beyond the
    /// far edges map to cells outside the grid, which never pass placement
    /// validation.
    #[must_use]
    pub fn to_grid(&self, point: WorldPoint) -> Option<CellCoord> {
        let column = cell_index(point.x, self.cell_size)?;
        let row = cell_index(point.y, self.cell_size)?;
        Some(CellCoord::new(column, row))
    }

    /// Reason a tower may not be placed on `cell`, if any.
    #[must_use]
    pub fn placement_error(&self, cell: CellCoord) -> Option<PlacementError> {
        let Some(flags) = self.cell(cell) else {
            return Some(PlacementError::OutOfBounds);
        };
        if flags.is_path {
            Some(PlacementError::OnPath)
        } else if !flags.is_buildable {
            Some(PlacementError::NotBuildable)
        } else if flags.occupied {
            Some(PlacementError::Occupied)
        } else {
            None
        }
    }

    /// Reports whether a tower may be placed on `cell`.
    #[must_use]
    pub fn is_valid_placement(&self, cell: CellCoord) -> bool {
        self.placement_error(cell).is_none()
    }

    /// Marks `cell` as occupied. Returns `false` without mutating anything
    /// when the cell is not a valid placement.
    pub fn occupy(&mut self, cell: CellCoord) -> bool {
        if !self.is_valid_placement(cell) {
            return false;
        }
        match self.index(cell) {
            Some(index) => {
                self.cells[index].occupied = true;
                true
            }
            None => false,
        }
    }

    /// Clears the occupied flag of `cell`. Out-of-bounds cells are ignored.
    pub fn free(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            self.cells[index].occupied = false;
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
    }
}

fn cell_index(coordinate: f32, cell_size: f32) -> Option<u32> {
    if !coordinate.is_finite() || coordinate < 0.0 || cell_size <= 0.0 {
        return None;
    }
    let index = (coordinate / cell_size).floor();
    if index >= u32::MAX as f32 {
        return None;
    }
    Some(index as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::from_level(&Level::tutorial())
    }

    #[test]
    fn conversions_use_cell_centres_and_floor_division() {
        let grid = grid();

        assert_eq!(grid.to_world(CellCoord::new(0, 0)), WorldPoint::new(32.0, 32.0));
        assert_eq!(grid.to_world(CellCoord::new(3, 2)), WorldPoint::new(224.0, 160.0));
        assert_eq!(
            grid.to_grid(WorldPoint::new(64.0, 63.9)),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(
            grid.to_grid(grid.to_world(CellCoord::new(7, 9))),
            Some(CellCoord::new(7, 9))
        );
    }

    #[test]
    fn oversized_levels_are_truncated() {
        let mut level = Level::tutorial();
        level.grid_width = u32::MAX;
        level.grid_height = u32::MAX;

        let grid = Grid::from_level(&level);

        assert_eq!(grid.columns(), MAX_GRID_SIDE);
        assert_eq!(grid.rows(), MAX_GRID_SIDE);
        assert!(!grid.contains(CellCoord::new(MAX_GRID_SIDE, 0)));
    }

    #[test]
    fn negative_and_invalid_points_map_to_no_cell() {
        let grid = grid();

        assert_eq!(grid.to_grid(WorldPoint::new(-0.5, 10.0)), None);
        assert_eq!(grid.to_grid(WorldPoint::new(10.0, f32::NAN)), None);
        assert_eq!(grid.to_grid(WorldPoint::new(f32::INFINITY, 10.0)), None);
    }

    #[test]
    fn far_points_fail_placement() {
        let grid = grid();
        let cell = grid
            .to_grid(WorldPoint::new(5000.0, 10.0))
            .expect("positive points map to a cell");

        assert_eq!(
            grid.placement_error(cell),
            Some(PlacementError::OutOfBounds)
        );
    }

    #[test]
    fn path_cells_are_never_buildable() {
        let grid = grid();
        let flags = grid.cell(CellCoord::new(4, 5)).expect("cell in bounds");

        assert!(flags.is_path());
        assert!(!flags.is_buildable());
        assert_eq!(
            grid.placement_error(CellCoord::new(4, 5)),
            Some(PlacementError::OnPath)
        );
    }

    #[test]
    fn explicit_buildable_area_restricts_construction() {
        let mut level = Level::tutorial();
        level.buildable_area = vec![CellCoord::new(2, 2)];
        let grid = Grid::from_level(&level);

        assert!(grid.is_valid_placement(CellCoord::new(2, 2)));
        assert_eq!(
            grid.placement_error(CellCoord::new(3, 2)),
            Some(PlacementError::NotBuildable)
        );
    }

    #[test]
    fn occupy_and_free_toggle_validity() {
        let mut grid = grid();
        let cell = CellCoord::new(2, 2);

        assert!(grid.occupy(cell));
        assert_eq!(grid.placement_error(cell), Some(PlacementError::Occupied));
        assert!(!grid.occupy(cell));

        grid.free(cell);
        assert!(grid.is_valid_placement(cell));
    }

    #[test]
    fn invalid_cells_are_no_ops() {
        let mut grid = grid();

        assert!(!grid.occupy(CellCoord::new(99, 99)));
        assert!(!grid.occupy(CellCoord::new(0, 5)));
        grid.free(CellCoord::new(99, 99));

        assert!(!grid.cell(CellCoord::new(0, 5)).expect("in bounds").occupied());
    }
}
