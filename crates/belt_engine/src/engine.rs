//! Core engine implementation

use thiserror::Error;

use crate::core::{ApplicationConfig, ConfigError};
use crate::editing::{EditError, EditInput, EditReport, GridEditor};
use crate::render::{
    Camera, DrawBackend, FrameStats, InstancePool, InstanceRenderer, MaterialHandle, MeshDescriptor, MeshType,
    PoolError,
};
use crate::spatial::{GridError, SpatialGrid};

/// Main engine struct
///
/// Owns the grid, the instance pool, the brush editor and the renderer.
/// Edits submitted during a tick are applied immediately, so the next
/// [`render_frame`](Self::render_frame) sees them.
#[derive(Debug)]
pub struct Engine {
    grid: SpatialGrid,
    pool: InstancePool,
    editor: GridEditor,
    renderer: InstanceRenderer,
    config: ApplicationConfig,
    frames: u64,
    running: bool,
}

impl Engine {
    /// Build every subsystem from configuration
    ///
    /// `meshes[i]` describes mesh type `i`; exactly `config.pool.mesh_count`
    /// descriptors are required.
    pub fn new(
        config: ApplicationConfig,
        meshes: Vec<MeshDescriptor>,
        material: MaterialHandle,
    ) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");

        config.validate().map_err(ConfigError::Invalid)?;
        if meshes.len() != config.pool.mesh_count {
            return Err(EngineError::MeshCountMismatch {
                expected: config.pool.mesh_count,
                actual: meshes.len(),
            });
        }

        let grid = SpatialGrid::new(config.grid.grid_size(), config.grid.storage, config.grid.origin)?;

        // Any cell id must be usable as an instance key, whatever the per-mesh capacity
        let cell_count = grid.cell_count();
        let pool = InstancePool::with_id_limit(
            config.pool.mesh_count,
            config.pool.capacity_for(cell_count),
            cell_count,
        )?;

        let editor = GridEditor::new(MeshType(config.editing.paint_mesh));
        let renderer = InstanceRenderer::new(meshes, material, &config.culling);

        log::info!("Engine ready");
        Ok(Self {
            grid,
            pool,
            editor,
            renderer,
            config,
            frames: 0,
            running: true,
        })
    }

    /// Apply one brush sample
    ///
    /// Samples aimed off the grid are dropped with a warning and report no
    /// change. Pool capacity violations are returned as errors.
    pub fn apply_edit(&mut self, input: &EditInput) -> Result<EditReport, EngineError> {
        match self.editor.apply(&mut self.grid, &mut self.pool, input) {
            Ok(report) => Ok(report),
            Err(e) if e.is_out_of_bounds() => {
                log::warn!("Ignoring edit: {}", e);
                Ok(EditReport::default())
            }
            Err(e) => {
                log::error!("Edit failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// End the current brush drag
    pub fn release_brush(&mut self) {
        self.editor.release(&mut self.grid);
    }

    /// Cull and submit the current instances
    pub fn render_frame(&mut self, camera: &Camera, backend: &mut dyn DrawBackend) -> FrameStats {
        let stats = self.renderer.render(&self.pool, camera, backend);
        self.frames += 1;

        if let Some(limit) = self.config.engine.frame_limit {
            if self.frames >= limit && self.running {
                log::info!("Frame limit {} reached", limit);
                self.running = false;
            }
        }
        stats
    }

    /// Whether the host loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Request shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Configured brush radius
    pub fn brush_radius(&self) -> u32 {
        self.config.editing.brush_radius
    }

    /// Grid state
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Instance pool state
    pub fn pool(&self) -> &InstancePool {
        &self.pool
    }

    /// Brush editor
    pub fn editor(&self) -> &GridEditor {
        &self.editor
    }

    /// Brush editor, for changing the paint mesh
    pub fn editor_mut(&mut self) -> &mut GridEditor {
        &mut self.editor
    }

    /// Renderer
    pub fn renderer(&self) -> &InstanceRenderer {
        &self.renderer
    }

    /// Renderer, for runtime culling toggles
    pub fn renderer_mut(&mut self) -> &mut InstanceRenderer {
        &mut self.renderer
    }

    /// Configuration the engine was built from
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration failed to load or validate
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Grid could not be created
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Instance pool rejected an operation
    #[error("Instance pool error: {0}")]
    Pool(#[from] PoolError),

    /// Edit failed
    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    /// Mesh descriptors do not match the configured mesh count
    #[error("Expected {expected} mesh descriptors, got {actual}")]
    MeshCountMismatch {
        /// Configured mesh count
        expected: usize,
        /// Descriptors supplied
        actual: usize,
    },
}

impl EngineError {
    /// Whether a mesh type ran out of instance slots
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            EngineError::Pool(PoolError::CapacityExceeded { .. })
                | EngineError::Edit(EditError::Pool(PoolError::CapacityExceeded { .. }))
        )
    }
}
