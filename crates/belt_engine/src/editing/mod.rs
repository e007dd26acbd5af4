//! Grid Editing
//!
//! Turns brush strokes into grid mutations and instance pool updates.
//!
//! Painting lays a belt line: each newly occupied cell becomes the selected
//! head of the line, and when the next cell is painted the previous head is
//! turned to face it. The orientation carries over to the new head, so a
//! drag across the grid produces a continuously oriented conveyor.

use thiserror::Error;

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::instancing::{InstancePool, MeshType, PoolError};
use crate::spatial::{CellKind, CellOrientation, CellState, GridCell, GridError, GridId, SpatialGrid};

/// Errors that abort an edit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// The brush center is outside the grid
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The instance pool rejected an update
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl EditError {
    /// Whether the edit was simply aimed off the grid
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, EditError::Grid(GridError::OutOfBounds { .. }))
    }
}

/// Brush action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Lay belt tiles on empty cells
    Paint,
    /// Clear occupied cells
    Erase,
}

/// One brush stroke sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditInput {
    /// World-space point under the cursor
    pub hit_point: Vec3,
    /// Brush radius in cells (0 = single cell)
    pub radius: u32,
    /// Paint or erase
    pub mode: EditMode,
}

impl EditInput {
    /// Paint stroke sample
    pub fn paint(hit_point: Vec3, radius: u32) -> Self {
        Self { hit_point, radius, mode: EditMode::Paint }
    }

    /// Erase stroke sample
    pub fn erase(hit_point: Vec3, radius: u32) -> Self {
        Self { hit_point, radius, mode: EditMode::Erase }
    }
}

/// What one edit changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    /// Cells that became occupied
    pub painted: usize,
    /// Occupied cells that were cleared
    pub erased: usize,
    /// Line heads whose facing changed to follow the line
    pub reoriented: usize,
}

impl EditReport {
    /// Whether the edit changed nothing
    pub fn is_empty(&self) -> bool {
        self.painted == 0 && self.erased == 0 && self.reoriented == 0
    }
}

/// Model matrix for a tile: cell center translation times a clockwise quarter-turn yaw
pub fn instance_matrix(grid: &SpatialGrid, cell: &GridCell) -> Mat4 {
    let yaw = -utils::deg_to_rad(cell.orientation.yaw_degrees());
    Mat4::from_translation_yaw(grid.cell_to_world_pos(cell.grid_id), yaw)
}

/// Brush editor holding the transient belt-line state of a drag
#[derive(Debug, Clone)]
pub struct GridEditor {
    selected: Option<GridId>,
    belt_orientation: CellOrientation,
    paint_mesh: MeshType,
}

impl GridEditor {
    /// Create an editor painting with `paint_mesh`
    pub fn new(paint_mesh: MeshType) -> Self {
        Self {
            selected: None,
            belt_orientation: CellOrientation::default(),
            paint_mesh,
        }
    }

    /// Apply one stroke sample to the grid and the pool
    ///
    /// An out-of-bounds hit point returns [`EditError::Grid`] without
    /// touching anything; callers are expected to ignore it.
    pub fn apply(
        &mut self,
        grid: &mut SpatialGrid,
        pool: &mut InstancePool,
        input: &EditInput,
    ) -> Result<EditReport, EditError> {
        let report = match input.mode {
            EditMode::Paint => self.paint(grid, pool, input)?,
            EditMode::Erase => self.erase(grid, pool, input)?,
        };

        log::debug!("{:?} at {:?} (r = {}): {:?}", input.mode, input.hit_point, input.radius, report);
        Ok(report)
    }

    fn paint(
        &mut self,
        grid: &mut SpatialGrid,
        pool: &mut InstancePool,
        input: &EditInput,
    ) -> Result<EditReport, EditError> {
        let center = grid.world_to_coord(input.hit_point)?;
        let mut report = EditReport::default();

        // Collected up front: the loop writes to the grid
        let ids: Vec<GridId> = grid.brush(center, input.radius).collect();
        for id in ids {
            let mut cell = grid.cell_or_new(id);
            if !cell.is_empty() || self.selected == Some(id) {
                continue;
            }
            let Some(key) = cell.instance_id() else { continue };

            let previous = self.selected.map(|previous_id| grid.cell_or_new(previous_id));
            let orientation = previous
                .as_ref()
                .map_or(self.belt_orientation, |previous| grid.infer_orientation(previous, &cell));

            cell.kind = CellKind::Occupied;
            cell.orientation = orientation;
            cell.state = CellState::Selected;

            // A full pool leaves the line head and belt facing as they were
            pool.upsert(self.paint_mesh, key, instance_matrix(grid, &cell))?;
            self.belt_orientation = orientation;

            if let Some(mut previous) = previous.filter(|previous| !previous.is_empty()) {
                if previous.orientation != orientation {
                    report.reoriented += 1;
                }
                previous.orientation = orientation;
                previous.state = CellState::Default;

                if let Some(previous_key) = previous.instance_id() {
                    let mesh = pool.mesh_type_of(previous_key).unwrap_or(self.paint_mesh);
                    pool.upsert(mesh, previous_key, instance_matrix(grid, &previous))?;
                }
                grid.set(previous);
            }

            grid.set(cell);
            self.selected = Some(id);
            report.painted += 1;
        }

        Ok(report)
    }

    fn erase(
        &mut self,
        grid: &mut SpatialGrid,
        pool: &mut InstancePool,
        input: &EditInput,
    ) -> Result<EditReport, EditError> {
        let center = grid.world_to_coord(input.hit_point)?;
        let mut report = EditReport::default();
        let mut failure = None;

        grid.apply_brush(center, input.radius, |cell| {
            if cell.is_empty() {
                return;
            }
            if let Some(key) = cell.instance_id() {
                match pool.remove(key) {
                    Ok(()) => {}
                    Err(PoolError::NotFound(_)) => {
                        log::trace!("Erased cell {} had no instance", cell.grid_id);
                    }
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                }
            }
            *cell = GridCell::new(cell.grid_id);
            report.erased += 1;
        });

        self.clear_selection(grid);

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(report),
        }
    }

    /// End the current drag: the line head loses its highlight
    pub fn release(&mut self, grid: &mut SpatialGrid) {
        self.clear_selection(grid);
    }

    fn clear_selection(&mut self, grid: &mut SpatialGrid) {
        if let Some(id) = self.selected.take() {
            let mut cell = grid.cell_or_new(id);
            if cell.state == CellState::Selected {
                cell.state = CellState::Default;
                grid.set(cell);
            }
        }
    }

    /// Current head of the belt line
    pub fn selected(&self) -> Option<GridId> {
        self.selected
    }

    /// Facing given to the next painted cell
    pub fn belt_orientation(&self) -> CellOrientation {
        self.belt_orientation
    }

    /// Mesh type used for new tiles
    pub fn paint_mesh(&self) -> MeshType {
        self.paint_mesh
    }

    /// Change the mesh type used for new tiles
    pub fn set_paint_mesh(&mut self, mesh: MeshType) {
        self.paint_mesh = mesh;
    }
}
