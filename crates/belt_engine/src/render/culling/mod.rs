//! Frustum culling
//!
//! Plane extraction, conservative bounding boxes and the per-mesh-type cull
//! pass that filters instance ranges before each draw.

pub mod append_buffer;
pub mod culler;
pub mod frustum;

pub use append_buffer::AppendBuffer;
pub use culler::{CullStats, FrustumCuller};
pub use frustum::{Aabb, Frustum, Plane};
