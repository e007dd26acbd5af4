//! Rendering system
//!
//! Instance storage, frustum culling and the per-frame draw driver. GPU
//! submission itself sits behind the [`DrawBackend`] trait.

pub mod backend;
pub mod camera;
pub mod culling;
pub mod instancing;
pub mod renderer;

pub use backend::{CountingBackend, DrawBackend, DrawBatch, MaterialHandle, MeshHandle};
pub use camera::Camera;
pub use culling::{Aabb, Frustum, FrustumCuller, Plane};
pub use instancing::{InstanceData, InstancePool, MeshType, PoolError};
pub use renderer::{FrameStats, InstanceRenderer, MeshDescriptor};
