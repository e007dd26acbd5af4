//! Mesh Type Identifiers
//!
//! Each mesh type owns one contiguous range of the instance pool and is
//! drawn with a single batched call.

use serde::{Deserialize, Serialize};

/// Index of a mesh type inside an [`InstancePool`](super::InstancePool)
///
/// Mesh types are dense indices `0..mesh_count` assigned at setup, in the
/// order the mesh descriptors were registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MeshType(pub usize);

impl MeshType {
    /// Position of this mesh type's range inside the pool
    pub fn index(self) -> usize {
        self.0
    }

    /// Iterate the first `count` mesh types
    pub fn all(count: usize) -> impl Iterator<Item = MeshType> {
        (0..count).map(MeshType)
    }
}

impl std::fmt::Display for MeshType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

impl From<usize> for MeshType {
    fn from(index: usize) -> Self {
        MeshType(index)
    }
}
