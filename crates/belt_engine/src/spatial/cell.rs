//! Grid cell records
//!
//! A cell is a small `Copy` value keyed by its linear grid id. Cells are
//! replaced wholesale on edit rather than mutated through references held
//! across edits.

use serde::{Deserialize, Serialize};

/// Linear encoding of a 3D grid coordinate, `-1` when absent
pub type GridId = i32;

/// Whether a structure occupies the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellKind {
    /// Nothing placed here
    #[default]
    Empty,
    /// A conveyor tile occupies the cell
    Occupied,
}

/// Facing of a cell in 90° yaw increments
///
/// The discriminant is the number of quarter turns applied to the tile mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellOrientation {
    /// No rotation
    #[default]
    Left = 0,
    /// One quarter turn
    Up = 1,
    /// Two quarter turns
    Right = 2,
    /// Three quarter turns
    Down = 3,
}

impl CellOrientation {
    /// All orientations in quarter-turn order
    pub const ALL: [CellOrientation; 4] = [
        CellOrientation::Left,
        CellOrientation::Up,
        CellOrientation::Right,
        CellOrientation::Down,
    ];

    /// Number of 90° steps this orientation represents
    pub fn quarter_turns(self) -> u8 {
        self as u8
    }

    /// Yaw in degrees (0, 90, 180, 270)
    pub fn yaw_degrees(self) -> f32 {
        f32::from(self.quarter_turns()) * 90.0
    }
}

/// Transient UI highlight state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    /// Not highlighted
    #[default]
    Default,
    /// Head of the belt line currently being drawn
    Selected,
}

/// One addressable grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// Linear id of the cell's coordinate
    pub grid_id: GridId,
    /// Occupancy
    pub kind: CellKind,
    /// Facing; meaningless while the cell is empty
    pub orientation: CellOrientation,
    /// UI highlight
    pub state: CellState,
}

impl GridCell {
    /// Sentinel returned for cells that have no record
    pub const EMPTY: GridCell = GridCell::new(-1);

    /// Create an empty, unhighlighted cell for the given id
    pub const fn new(grid_id: GridId) -> Self {
        Self {
            grid_id,
            kind: CellKind::Empty,
            orientation: CellOrientation::Left,
            state: CellState::Default,
        }
    }

    /// Whether no structure occupies the cell
    pub fn is_empty(&self) -> bool {
        self.kind == CellKind::Empty
    }

    /// Whether this is the absent-cell sentinel
    pub fn is_sentinel(&self) -> bool {
        self.grid_id < 0
    }

    /// Id usable as an instance-pool key, `None` for the sentinel
    pub fn instance_id(&self) -> Option<u32> {
        u32::try_from(self.grid_id).ok()
    }
}

impl Default for GridCell {
    fn default() -> Self {
        Self::EMPTY
    }
}
