//! Draw submission interface
//!
//! The renderer hands each non-empty, culled mesh type to a [`DrawBackend`]
//! as one batch. GPU resource creation and command recording live behind
//! this trait.

use crate::foundation::math::Mat4;
use crate::render::instancing::MeshType;

/// Handle to a mesh resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Handle to a material resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// One instanced draw: a mesh, its material and the visible transforms
#[derive(Debug, Clone, Copy)]
pub struct DrawBatch<'a> {
    /// Pool range the transforms were culled from
    pub mesh_type: MeshType,
    /// Mesh to draw
    pub mesh: MeshHandle,
    /// Material shared by every instance
    pub material: MaterialHandle,
    /// Model matrices of the visible instances, never empty
    pub transforms: &'a [Mat4],
}

impl DrawBatch<'_> {
    /// Number of instances in the draw
    pub fn instance_count(&self) -> usize {
        self.transforms.len()
    }
}

/// Receiver of batched instanced draws
///
/// Submission cannot fail from the renderer's point of view; backends deal
/// with their own device errors.
pub trait DrawBackend {
    /// Record one instanced draw call
    fn draw_instanced(&mut self, batch: DrawBatch<'_>);
}

/// Backend that only counts what it receives
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CountingBackend {
    /// Draw calls received
    pub draw_calls: usize,
    /// Instances received across all draws
    pub instances: usize,
    /// Mesh types drawn, in submission order
    pub mesh_types: Vec<MeshType>,
}

impl CountingBackend {
    /// Forget everything recorded so far
    pub fn reset(&mut self) {
        self.draw_calls = 0;
        self.instances = 0;
        self.mesh_types.clear();
    }
}

impl DrawBackend for CountingBackend {
    fn draw_instanced(&mut self, batch: DrawBatch<'_>) {
        self.draw_calls += 1;
        self.instances += batch.instance_count();
        self.mesh_types.push(batch.mesh_type);
    }
}
