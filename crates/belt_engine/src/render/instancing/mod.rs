//! Instanced rendering storage
//!
//! Dense per-mesh-type transform pools and the packed records uploaded for
//! instanced draws.

pub mod instance_data;
pub mod mesh_type;
pub mod pool;

pub use instance_data::InstanceData;
pub use mesh_type::MeshType;
pub use pool::{InstancePool, PoolError, PoolStats};
