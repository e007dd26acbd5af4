//! # Belt Engine
//!
//! Grid-based conveyor belt placement with batched, frustum-culled instanced
//! rendering.
//!
//! ## Features
//!
//! - **Spatial Grid**: dense or sparse cell storage with world-space lookup and brush edits
//! - **Instance Pools**: O(1) add, update and remove of per-mesh-type transforms
//! - **Frustum Culling**: camera-gated plane extraction and parallel culling of large ranges
//! - **Belt Editing**: paint and erase strokes with automatic belt-line orientation
//! - **Update Scheduling**: explicit per-frame callback registry
//!
//! ## Quick Start
//!
//! ```rust
//! use belt_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let meshes = vec![
//!         MeshDescriptor::new(MeshHandle(0), Aabb::tile(0.2)),
//!         MeshDescriptor::new(MeshHandle(1), Aabb::tile(0.2)),
//!     ];
//!     let mut engine = Engine::new(config, meshes, MaterialHandle(0))?;
//!
//!     engine.apply_edit(&EditInput::paint(Vec3::new(0.0, 0.0, 0.0), 2))?;
//!     engine.release_brush();
//!
//!     let mut backend = CountingBackend::default();
//!     let stats = engine.render_frame(&Camera::default(), &mut backend);
//!     assert_eq!(stats.draw_calls, 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;
pub mod foundation;
pub mod spatial;
pub mod render;
pub mod editing;
pub mod scheduler;

mod engine;

pub use engine::{Engine, EngineError};

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineError,
        core::config::{ApplicationConfig, Config, CullingConfig, EditConfig, EngineConfig, GridConfig, PoolConfig},
        editing::{EditInput, EditMode, EditReport, GridEditor},
        foundation::math::{IVec3, Mat4, Vec3},
        render::{
            Aabb, Camera, CountingBackend, DrawBackend, DrawBatch, FrameStats, InstancePool, MaterialHandle,
            MeshDescriptor, MeshHandle, MeshType,
        },
        scheduler::{CallbackId, TickInfo, UpdateScheduler},
        spatial::{CellOrientation, GridCell, GridOrigin, GridSize, GridStorageKind, SpatialGrid},
    };
}
