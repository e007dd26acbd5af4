//! Spatial partitioning data structures
//!
//! Provides the grid index that maps world positions to logical cells and
//! supports area (brush) edits.

mod brush;
mod cell;
mod grid;

pub use brush::BrushIter;
pub use cell::{CellKind, CellOrientation, CellState, GridCell, GridId};
pub use grid::{
    coord_to_id, id_to_coord, orientation_between,
    CellStorage, DenseCells, GridError, GridOrigin, GridSize, GridStorageKind, SparseCells, SpatialGrid,
};
