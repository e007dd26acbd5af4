//! Instance Renderer
//!
//! Drives one frame of instanced drawing: refresh the frustum if the camera
//! moved, cull each mesh type's dense range and submit one batched draw per
//! mesh type that has visible instances.
//!
//! # Architecture
//!
//! ```text
//! InstancePool ──dense ranges──▶ FrustumCuller ──visible──▶ DrawBackend
//!                                      ▲
//!                                   Camera
//! ```

use super::backend::{DrawBackend, DrawBatch, MaterialHandle, MeshHandle};
use super::camera::Camera;
use super::culling::{Aabb, FrustumCuller};
use super::instancing::{InstancePool, MeshType};
use crate::core::CullingConfig;
use crate::foundation::math::Mat4;

/// Backend mesh and local bounds of one mesh type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDescriptor {
    /// Backend mesh drawn for this mesh type
    pub mesh: MeshHandle,
    /// Mesh bounds in model space
    pub local_bounds: Aabb,
}

impl MeshDescriptor {
    /// Create a descriptor
    pub fn new(mesh: MeshHandle, local_bounds: Aabb) -> Self {
        Self { mesh, local_bounds }
    }
}

/// Per-frame rendering statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame counter, starting at 1
    pub frame: u64,
    /// Number of draw calls issued this frame
    pub draw_calls: usize,
    /// Instances that survived culling
    pub visible_instances: usize,
    /// Live instances across all mesh types
    pub total_instances: usize,
    /// Whether the frustum planes were recomputed
    pub planes_recomputed: bool,
}

impl FrameStats {
    /// Share of live instances that were culled, in `[0, 1]`
    pub fn culled_ratio(&self) -> f32 {
        if self.total_instances == 0 {
            return 0.0;
        }
        1.0 - self.visible_instances as f32 / self.total_instances as f32
    }
}

/// Per-mesh-type cull and draw driver
#[derive(Debug)]
pub struct InstanceRenderer {
    meshes: Vec<MeshDescriptor>,
    material: MaterialHandle,
    culler: FrustumCuller,
    visible: Vec<Mat4>,
    frame: u64,
}

impl InstanceRenderer {
    /// Create a renderer for the given mesh types
    ///
    /// `meshes[i]` describes [`MeshType`]`(i)`.
    pub fn new(meshes: Vec<MeshDescriptor>, material: MaterialHandle, culling: &CullingConfig) -> Self {
        log::info!("Creating InstanceRenderer with {} mesh types", meshes.len());

        Self {
            meshes,
            material,
            culler: FrustumCuller::new(culling),
            visible: Vec::new(),
            frame: 0,
        }
    }

    /// Cull and submit every mesh type of `pool`
    pub fn render(&mut self, pool: &InstancePool, camera: &Camera, backend: &mut dyn DrawBackend) -> FrameStats {
        self.frame += 1;
        let mut stats = FrameStats {
            frame: self.frame,
            planes_recomputed: self.culler.update(camera),
            total_instances: pool.total_count(),
            ..FrameStats::default()
        };

        for (index, descriptor) in self.meshes.iter().enumerate().take(pool.mesh_count()) {
            let mesh_type = MeshType(index);
            let matrices = pool.matrices(mesh_type);
            if matrices.is_empty() {
                continue;
            }

            self.visible.clear();
            let visible = self.culler.cull_into(matrices, &descriptor.local_bounds, &mut self.visible);
            if visible == 0 {
                continue;
            }

            backend.draw_instanced(DrawBatch {
                mesh_type,
                mesh: descriptor.mesh,
                material: self.material,
                transforms: &self.visible,
            });
            stats.draw_calls += 1;
            stats.visible_instances += visible;
        }

        log::debug!(
            "Frame {}: {} draws, {}/{} instances visible",
            stats.frame,
            stats.draw_calls,
            stats.visible_instances,
            stats.total_instances
        );
        stats
    }

    /// Registered mesh descriptors
    pub fn meshes(&self) -> &[MeshDescriptor] {
        &self.meshes
    }

    /// Material shared by every draw
    pub fn material(&self) -> MaterialHandle {
        self.material
    }

    /// Frustum culler
    pub fn culler(&self) -> &FrustumCuller {
        &self.culler
    }

    /// Frustum culler, for runtime toggles
    pub fn culler_mut(&mut self) -> &mut FrustumCuller {
        &mut self.culler
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use crate::render::backend::CountingBackend;

    fn renderer(culling: &CullingConfig) -> InstanceRenderer {
        let bounds = Aabb::tile(0.2);
        InstanceRenderer::new(
            vec![
                MeshDescriptor::new(MeshHandle(1), bounds),
                MeshDescriptor::new(MeshHandle(2), bounds),
                MeshDescriptor::new(MeshHandle(3), bounds),
            ],
            MaterialHandle(7),
            culling,
        )
    }

    fn camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 10.0, 10.0), 60.0, 1.0, 0.1, 100.0)
    }

    fn at(x: f32, z: f32) -> Mat4 {
        Mat4::from_translation_yaw(Vec3::new(x, 0.0, z), 0.0)
    }

    #[test]
    fn test_one_draw_per_visible_mesh_type() {
        let mut pool = InstancePool::new(3, 8).unwrap();
        pool.upsert(MeshType(0), 0, at(0.0, 0.0)).unwrap();
        pool.upsert(MeshType(0), 1, at(1.0, 0.0)).unwrap();
        pool.upsert(MeshType(2), 2, at(0.0, 1.0)).unwrap();

        let mut backend = CountingBackend::default();
        let stats = renderer(&CullingConfig::default()).render(&pool, &camera(), &mut backend);

        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.visible_instances, 3);
        assert_eq!(backend.mesh_types, vec![MeshType(0), MeshType(2)]);
        assert!(stats.planes_recomputed);
    }

    #[test]
    fn test_fully_culled_mesh_type_emits_no_draw() {
        let mut pool = InstancePool::new(3, 8).unwrap();
        pool.upsert(MeshType(0), 0, at(0.0, 0.0)).unwrap();
        // Behind the camera
        pool.upsert(MeshType(1), 1, at(0.0, 40.0)).unwrap();

        let mut backend = CountingBackend::default();
        let stats = renderer(&CullingConfig::default()).render(&pool, &camera(), &mut backend);

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.total_instances, 2);
        assert_eq!(backend.mesh_types, vec![MeshType(0)]);
        assert_eq!(stats.culled_ratio(), 0.5);
    }

    #[test]
    fn test_planes_reused_for_static_camera() {
        let pool = InstancePool::new(3, 8).unwrap();
        let mut renderer = renderer(&CullingConfig::default());
        let mut backend = CountingBackend::default();

        assert!(renderer.render(&pool, &camera(), &mut backend).planes_recomputed);
        let second = renderer.render(&pool, &camera(), &mut backend);
        assert!(!second.planes_recomputed);
        assert_eq!(second.frame, 2);
        assert_eq!(backend.draw_calls, 0);
    }

    #[test]
    fn test_disabled_culling_draws_everything() {
        let mut pool = InstancePool::new(3, 8).unwrap();
        pool.upsert(MeshType(1), 1, at(0.0, 40.0)).unwrap();

        let mut backend = CountingBackend::default();
        let stats = renderer(&CullingConfig::default().with_enabled(false)).render(&pool, &camera(), &mut backend);

        assert_eq!(stats.visible_instances, 1);
        assert_eq!(backend.instances, 1);
    }
}
