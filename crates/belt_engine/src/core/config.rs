//! # Engine Configuration
//!
//! All configuration structures for the grid, the instance pools, culling
//! and editing, grouped under [`ApplicationConfig`].
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging, debug features, frame limits
//! - **Grid Config**: dimensions, storage strategy and world anchoring
//! - **Pool Config**: mesh type count and per-mesh capacity
//! - **Culling Config**: frustum culling switches and tuning
//! - **Edit Config**: default brush parameters

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::spatial::{GridOrigin, GridSize, GridStorageKind};

/// # Engine Configuration
///
/// Core engine behavior including logging and debug features.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
    /// Stop after this many frames (unlimited when unset)
    pub frame_limit: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            frame_limit: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Stop after `frames` frames
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Grid Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell counts along x, y, z
    pub size: [i32; 3],
    /// Dense array or sparse map
    pub storage: GridStorageKind,
    /// Centered or anchored world mapping
    pub origin: GridOrigin,
}

impl GridConfig {
    /// Create a grid configuration with default storage and origin
    pub fn new(size: [i32; 3]) -> Self {
        Self {
            size,
            storage: GridStorageKind::default(),
            origin: GridOrigin::default(),
        }
    }

    /// Set storage strategy
    pub fn with_storage(mut self, storage: GridStorageKind) -> Self {
        self.storage = storage;
        self
    }

    /// Set world anchoring
    pub fn with_origin(mut self, origin: GridOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Dimensions as a [`GridSize`]
    pub fn grid_size(&self) -> GridSize {
        GridSize::from(self.size)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let size = self.grid_size();
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return Err(format!("Grid size must be positive on every axis, got {size}"));
        }
        if size.checked_cell_count().is_none() {
            return Err(format!("Grid {size} has more cells than a cell id can address"));
        }
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new([64, 1, 64])
    }
}

/// # Instance Pool Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of mesh types
    pub mesh_count: usize,
    /// Instances per mesh type; the grid's cell count when unset
    pub capacity_per_mesh: Option<usize>,
}

impl PoolConfig {
    /// Create a pool configuration sized from the grid
    pub fn new(mesh_count: usize) -> Self {
        Self { mesh_count, capacity_per_mesh: None }
    }

    /// Fix the per-mesh capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity_per_mesh = Some(capacity);
        self
    }

    /// Capacity to allocate for a grid of `cell_count` cells
    pub fn capacity_for(&self, cell_count: usize) -> usize {
        self.capacity_per_mesh.unwrap_or(cell_count)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.mesh_count == 0 {
            return Err("Mesh count must be at least 1".to_string());
        }
        if self.capacity_per_mesh == Some(0) {
            return Err("Capacity per mesh must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(2)
    }
}

/// # Culling Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Frustum culling on or off; when off every instance is drawn
    pub enabled: bool,
    /// Instance count from which a mesh type is culled on worker threads
    pub parallel_threshold: usize,
    /// Camera change below which frustum planes are reused
    pub camera_epsilon: f32,
}

impl CullingConfig {
    /// Create a culling configuration with default tuning
    pub fn new() -> Self {
        Self {
            enabled: true,
            parallel_threshold: 4096,
            camera_epsilon: 1e-4,
        }
    }

    /// Enable or disable culling
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the parallel threshold
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.camera_epsilon.is_nan() || self.camera_epsilon < 0.0 {
            return Err(format!("Camera epsilon must be non-negative, got {}", self.camera_epsilon));
        }
        Ok(())
    }
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Edit Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Default brush radius in cells
    pub brush_radius: u32,
    /// Mesh type used for painted tiles
    pub paint_mesh: usize,
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Grid configuration
    pub grid: GridConfig,
    /// Instance pool configuration
    pub pool: PoolConfig,
    /// Culling configuration
    pub culling: CullingConfig,
    /// Edit configuration
    pub editing: EditConfig,
}

impl ApplicationConfig {
    /// Load a configuration file and validate it
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        log::info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.grid.validate()?;
        self.pool.validate()?;
        self.culling.validate()?;

        if self.editing.paint_mesh >= self.pool.mesh_count {
            return Err(format!(
                "Paint mesh {} is outside the {} configured mesh types",
                self.editing.paint_mesh, self.pool.mesh_count
            ));
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}
