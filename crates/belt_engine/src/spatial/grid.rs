//! Spatial grid mapping world positions to logical cells
//!
//! The grid is a fixed-size box of cells addressed by a linear id
//! (`x + y*sx + z*sx*sy`). Cell records live behind a pluggable
//! [`CellStorage`]: a dense array that is fully initialized up front, or a
//! sparse map that creates records on first write. Both expose the same
//! `get`/`set`/`world_to_cell` contract.

use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::brush::BrushIter;
use super::cell::{CellKind, CellOrientation, CellState, GridCell, GridId};
use crate::foundation::math::{IVec3, Vec3};

/// Errors produced by grid lookups
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// A world position falls outside the grid footprint
    #[error("world position ({x:.3}, {z:.3}) is outside the grid footprint")]
    OutOfBounds {
        /// World X of the rejected position
        x: f32,
        /// World Z of the rejected position
        z: f32,
    },

    /// Grid dimensions are unusable
    #[error("invalid grid size {0}: every axis must be positive and the cell count must fit an i32")]
    InvalidSize(GridSize),
}

/// Cell counts along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Columns
    pub x: i32,
    /// Layers
    pub y: i32,
    /// Rows
    pub z: i32,
}

impl GridSize {
    /// Create a grid size
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Total number of cells, `None` if an axis is non-positive or the
    /// product does not fit a [`GridId`]
    pub fn checked_cell_count(&self) -> Option<usize> {
        if self.x <= 0 || self.y <= 0 || self.z <= 0 {
            return None;
        }
        let count = self.x.checked_mul(self.y)?.checked_mul(self.z)?;
        usize::try_from(count).ok()
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        (self.x as usize) * (self.y as usize) * (self.z as usize)
    }

    /// Whether a coordinate lies inside these bounds
    pub fn contains(&self, coord: IVec3) -> bool {
        coord.x >= 0 && coord.x < self.x
            && coord.y >= 0 && coord.y < self.y
            && coord.z >= 0 && coord.z < self.z
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

impl From<[i32; 3]> for GridSize {
    fn from(v: [i32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// How world space is anchored to the grid
///
/// The two conventions use different rounding rules and must not be mixed
/// within one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridOrigin {
    /// Footprint centered on the world origin, positions rounded to the nearest cell
    #[default]
    Centered,
    /// Cell (0, 0, 0) starts at the world origin, positions floored
    Anchored,
}

/// Backing store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridStorageKind {
    /// Array of every cell, built eagerly by a parallel pass
    #[default]
    Dense,
    /// Hash map of written cells only
    Sparse,
}

/// Linear id of a coordinate
#[inline]
pub fn coord_to_id(coord: IVec3, size: GridSize) -> GridId {
    coord.x + coord.y * size.x + coord.z * size.x * size.y
}

/// Coordinate of a linear id; exact inverse of [`coord_to_id`]
#[inline]
pub fn id_to_coord(id: GridId, size: GridSize) -> IVec3 {
    let layer = size.x * size.y;
    let z = id / layer;
    let y = (id % layer) / size.x;
    let x = id % size.x;
    IVec3::new(x, y, z)
}

/// Facing that points from `to` toward `from`
///
/// With `d = from - to`: `+x → Left`, `-x → Right`, `+z → Down`, `-z → Up`.
/// Pairs that are not exactly one unit apart along exactly one axis fall
/// back to `Up`.
pub fn orientation_between(from: IVec3, to: IVec3) -> CellOrientation {
    let d = from - to;
    let manhattan = d.x.abs() + d.y.abs() + d.z.abs();
    if manhattan != 1 {
        log::trace!("Non-adjacent cells {:?} -> {:?}, defaulting to Up", from, to);
        return CellOrientation::Up;
    }

    match (d.x, d.z) {
        (1, _) => CellOrientation::Left,
        (-1, _) => CellOrientation::Right,
        (_, 1) => CellOrientation::Down,
        (_, -1) => CellOrientation::Up,
        // Vertical neighbours have no horizontal facing
        _ => CellOrientation::Up,
    }
}

/// Backing store for cell records
pub trait CellStorage: Send + Sync {
    /// Record for an id, `None` when no record exists
    fn get(&self, id: GridId) -> Option<GridCell>;

    /// Insert or replace the record keyed by `cell.grid_id`
    fn set(&mut self, cell: GridCell);

    /// Number of stored records
    fn len(&self) -> usize;

    /// Whether no records are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate stored records
    fn iter(&self) -> Box<dyn Iterator<Item = GridCell> + '_>;

    /// Which backing this is
    fn kind(&self) -> GridStorageKind;
}

/// Array-backed storage holding every cell of the grid
#[derive(Debug, Clone)]
pub struct DenseCells {
    cells: Vec<GridCell>,
}

impl DenseCells {
    /// Allocate and initialize `cell_count` empty cells
    ///
    /// Each worker writes only the cell at its own index.
    pub fn new(cell_count: usize) -> Self {
        let mut cells = Vec::new();
        (0..cell_count)
            .into_par_iter()
            .map(|index| GridCell::new(index as GridId))
            .collect_into_vec(&mut cells);
        Self { cells }
    }
}

impl CellStorage for DenseCells {
    fn get(&self, id: GridId) -> Option<GridCell> {
        usize::try_from(id).ok().and_then(|index| self.cells.get(index)).copied()
    }

    fn set(&mut self, cell: GridCell) {
        if let Some(slot) = usize::try_from(cell.grid_id).ok().and_then(|index| self.cells.get_mut(index)) {
            *slot = cell;
        }
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = GridCell> + '_> {
        Box::new(self.cells.iter().copied())
    }

    fn kind(&self) -> GridStorageKind {
        GridStorageKind::Dense
    }
}

/// Map-backed storage holding only cells that have been written
#[derive(Debug, Clone, Default)]
pub struct SparseCells {
    cells: HashMap<GridId, GridCell>,
}

impl SparseCells {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl CellStorage for SparseCells {
    fn get(&self, id: GridId) -> Option<GridCell> {
        self.cells.get(&id).copied()
    }

    fn set(&mut self, cell: GridCell) {
        self.cells.insert(cell.grid_id, cell);
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = GridCell> + '_> {
        Box::new(self.cells.values().copied())
    }

    fn kind(&self) -> GridStorageKind {
        GridStorageKind::Sparse
    }
}

/// Fixed-size grid of cells with world-space conversion and brush edits
pub struct SpatialGrid {
    size: GridSize,
    origin: GridOrigin,
    storage: Box<dyn CellStorage>,
}

impl fmt::Debug for SpatialGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("size", &self.size)
            .field("origin", &self.origin)
            .field("storage", &self.storage.kind())
            .field("records", &self.storage.len())
            .finish()
    }
}

impl SpatialGrid {
    /// Create a grid, running the initialization pass for dense storage
    pub fn new(size: GridSize, storage: GridStorageKind, origin: GridOrigin) -> Result<Self, GridError> {
        let cell_count = size.checked_cell_count().ok_or(GridError::InvalidSize(size))?;

        let storage: Box<dyn CellStorage> = match storage {
            GridStorageKind::Dense => Box::new(DenseCells::new(cell_count)),
            GridStorageKind::Sparse => Box::new(SparseCells::new()),
        };

        log::info!(
            "Initialized {:?} grid {} ({} cells, {:?} origin)",
            storage.kind(),
            size,
            cell_count,
            origin
        );

        Ok(Self { size, origin, storage })
    }

    /// Grid dimensions
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// World anchoring convention
    pub fn origin(&self) -> GridOrigin {
        self.origin
    }

    /// Backing store in use
    pub fn storage_kind(&self) -> GridStorageKind {
        self.storage.kind()
    }

    /// Total number of addressable cells
    pub fn cell_count(&self) -> usize {
        self.size.cell_count()
    }

    /// Whether a coordinate is inside the grid
    pub fn contains(&self, coord: IVec3) -> bool {
        self.size.contains(coord)
    }

    /// Whether an id addresses a cell of this grid
    pub fn contains_id(&self, id: GridId) -> bool {
        id >= 0 && (id as usize) < self.cell_count()
    }

    /// Linear id of a coordinate
    pub fn coord_to_id(&self, coord: IVec3) -> GridId {
        coord_to_id(coord, self.size)
    }

    /// Coordinate of a linear id
    pub fn id_to_coord(&self, id: GridId) -> IVec3 {
        id_to_coord(id, self.size)
    }

    /// Ground-layer coordinate under a world position
    pub fn world_to_coord(&self, world: Vec3) -> Result<IVec3, GridError> {
        let out_of_bounds = GridError::OutOfBounds { x: world.x, z: world.z };

        let (x, z) = match self.origin {
            GridOrigin::Centered => {
                let sx = self.size.x as f32;
                let sz = self.size.z as f32;
                let percent_x = (world.x + sx * 0.5) / sx;
                let percent_z = (world.z + sz * 0.5) / sz;

                if !(0.0..=1.0).contains(&percent_x) || !(0.0..=1.0).contains(&percent_z) {
                    return Err(out_of_bounds);
                }

                (
                    ((sx - 1.0) * percent_x).round() as i32,
                    ((sz - 1.0) * percent_z).round() as i32,
                )
            }
            GridOrigin::Anchored => {
                if !world.x.is_finite() || !world.z.is_finite() {
                    return Err(out_of_bounds);
                }
                let x = world.x.floor();
                let z = world.z.floor();
                if x < 0.0 || z < 0.0 || x >= self.size.x as f32 || z >= self.size.z as f32 {
                    return Err(out_of_bounds);
                }
                (x as i32, z as i32)
            }
        };

        Ok(IVec3::new(x, 0, z))
    }

    /// Cell under a world position
    ///
    /// Cells without a record (sparse storage) come back as a fresh empty
    /// cell carrying the resolved id.
    pub fn world_to_cell(&self, world: Vec3) -> Result<GridCell, GridError> {
        let id = self.coord_to_id(self.world_to_coord(world)?);
        Ok(self.cell_or_new(id))
    }

    /// World position of a cell's horizontal center
    pub fn cell_to_world_pos(&self, id: GridId) -> Vec3 {
        let coord = self.id_to_coord(id);
        match self.origin {
            GridOrigin::Centered => Vec3::new(
                coord.x as f32 - self.size.x as f32 * 0.5 + 0.5,
                coord.y as f32,
                coord.z as f32 - self.size.z as f32 * 0.5 + 0.5,
            ),
            GridOrigin::Anchored => Vec3::new(
                coord.x as f32 + 0.5,
                coord.y as f32,
                coord.z as f32 + 0.5,
            ),
        }
    }

    /// Cell record for an id, [`GridCell::EMPTY`] when no record exists
    ///
    /// Out-of-range ids are a programming error.
    pub fn get(&self, id: GridId) -> GridCell {
        debug_assert!(self.contains_id(id), "grid id {id} outside {} grid", self.size);
        self.storage.get(id).unwrap_or(GridCell::EMPTY)
    }

    /// Cell record for an id, or a fresh empty cell with that id
    pub fn cell_or_new(&self, id: GridId) -> GridCell {
        debug_assert!(self.contains_id(id), "grid id {id} outside {} grid", self.size);
        self.storage.get(id).unwrap_or_else(|| GridCell::new(id))
    }

    /// Insert or replace a cell record
    ///
    /// Out-of-range ids are a programming error.
    pub fn set(&mut self, cell: GridCell) {
        debug_assert!(self.contains_id(cell.grid_id), "grid id {} outside {} grid", cell.grid_id, self.size);
        self.storage.set(cell);
    }

    /// Ids covered by a brush, in deterministic order
    pub fn brush(&self, center: IVec3, radius: u32) -> BrushIter {
        BrushIter::new(self.size, center, radius)
    }

    /// Apply `f` to every cell covered by a brush and store the results
    ///
    /// Only cells that `f` changed are written back, so sparse storage does
    /// not grow when a brush passes over untouched ground. Returns the
    /// number of cells visited.
    pub fn apply_brush<F>(&mut self, center: IVec3, radius: u32, mut f: F) -> usize
    where
        F: FnMut(&mut GridCell),
    {
        let mut visited = 0;
        for id in self.brush(center, radius) {
            let before = self.cell_or_new(id);
            let mut cell = before;
            f(&mut cell);
            cell.grid_id = id;
            if cell != before {
                self.storage.set(cell);
            }
            visited += 1;
        }
        visited
    }

    /// Facing from `to` toward `from`; see [`orientation_between`]
    pub fn infer_orientation(&self, from: &GridCell, to: &GridCell) -> CellOrientation {
        orientation_between(self.id_to_coord(from.grid_id), self.id_to_coord(to.grid_id))
    }

    /// Read-only view of stored cells for debug overlays
    pub fn cells(&self) -> impl Iterator<Item = (GridId, CellState)> + '_ {
        self.storage.iter().map(|cell| (cell.grid_id, cell.state))
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.storage.iter().filter(|cell| cell.kind == CellKind::Occupied).count()
    }

    /// Number of stored records (all cells for dense storage)
    pub fn record_count(&self) -> usize {
        self.storage.len()
    }
}
