//! Per-mesh-type frustum culling over dense instance ranges
//!
//! Planes are extracted from the camera once and reused until the camera
//! moves. Each cull pass reads one mesh type's contiguous matrix range and
//! appends the survivors to a caller-owned buffer; large ranges are tested
//! on `rayon` workers that reserve output positions through an atomic
//! counter.

use rayon::prelude::*;

use super::append_buffer::AppendBuffer;
use super::frustum::{Aabb, Frustum};
use crate::core::CullingConfig;
use crate::foundation::math::Mat4;
use crate::render::Camera;

/// Counters for monitoring culling work
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Frustum plane recomputations
    pub plane_updates: u64,
    /// Passes run on worker threads
    pub parallel_passes: u64,
    /// Passes run on the calling thread
    pub serial_passes: u64,
}

/// Frustum culler with camera-gated plane extraction
#[derive(Debug)]
pub struct FrustumCuller {
    frustum: Frustum,
    last_camera: Option<Camera>,
    enabled: bool,
    parallel_threshold: usize,
    camera_epsilon: f32,
    survivors: AppendBuffer,
    stats: CullStats,
}

impl FrustumCuller {
    /// Create a culler; planes are unbounded until the first [`update`](Self::update)
    pub fn new(config: &CullingConfig) -> Self {
        log::debug!(
            "Creating frustum culler (enabled: {}, parallel threshold: {})",
            config.enabled,
            config.parallel_threshold
        );

        Self {
            frustum: Frustum::unbounded(),
            last_camera: None,
            enabled: config.enabled,
            parallel_threshold: config.parallel_threshold.max(1),
            camera_epsilon: config.camera_epsilon,
            survivors: AppendBuffer::default(),
            stats: CullStats::default(),
        }
    }

    /// Recompute the planes if the camera changed since the last recompute
    ///
    /// Returns whether the planes were recomputed.
    pub fn update(&mut self, camera: &Camera) -> bool {
        let moved = self
            .last_camera
            .as_ref()
            .map_or(true, |last| last.differs_from(camera, self.camera_epsilon));
        if !moved {
            return false;
        }

        self.frustum = Frustum::from_view_projection(&camera.view_projection_matrix());
        self.last_camera = Some(camera.clone());
        self.stats.plane_updates += 1;
        log::trace!("Recomputed frustum planes for camera at {:?}", camera.position);
        true
    }

    /// Append the matrices whose transformed bounds touch the frustum to `out`
    ///
    /// `out` is not cleared; capacity for every input matrix is reserved
    /// before the pass. Returns the number of matrices appended. Survivor
    /// order is unspecified for parallel passes.
    pub fn cull_into(&mut self, matrices: &[Mat4], local_bounds: &Aabb, out: &mut Vec<Mat4>) -> usize {
        out.reserve(matrices.len());

        if !self.enabled {
            out.extend_from_slice(matrices);
            return matrices.len();
        }

        let before = out.len();
        let frustum = &self.frustum;

        if matrices.len() < self.parallel_threshold {
            out.extend(
                matrices
                    .iter()
                    .filter(|matrix| frustum.intersects_aabb(&local_bounds.transformed(matrix))),
            );
            self.stats.serial_passes += 1;
        } else {
            self.survivors.reset(matrices.len());
            let survivors = &self.survivors;

            // for_each returns only after every worker has finished
            matrices.par_iter().enumerate().for_each(|(index, matrix)| {
                if frustum.intersects_aabb(&local_bounds.transformed(matrix)) {
                    survivors.push(index as u32);
                }
            });

            out.extend(survivors.iter().map(|index| matrices[index as usize]));
            self.stats.parallel_passes += 1;
        }

        out.len() - before
    }

    /// Current frustum
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Whether culling is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn culling on or off at runtime
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::info!("Frustum culling {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    /// Work counters
    pub fn stats(&self) -> &CullStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};

    fn camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0)
    }

    fn unit_bounds() -> Aabb {
        Aabb::new(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5))
    }

    fn row_of_instances(count: usize) -> Vec<Mat4> {
        // Alternate between in front of and behind the camera
        (0..count)
            .map(|i| {
                let z = if i % 2 == 0 { 0.0 } else { 30.0 };
                Mat4::from_translation_yaw(Vec3::new((i % 7) as f32 - 3.0, 0.0, z), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_update_is_gated_on_camera_change() {
        let mut culler = FrustumCuller::new(&CullingConfig::default());
        let mut cam = camera();

        assert!(culler.update(&cam));
        assert!(!culler.update(&cam));

        cam.set_position(Vec3::new(0.0, 1.0, 10.0));
        assert!(culler.update(&cam));
        assert_eq!(culler.stats().plane_updates, 2);
    }

    #[test]
    fn test_serial_cull_keeps_front_drops_behind() {
        let mut culler = FrustumCuller::new(&CullingConfig::default());
        culler.update(&camera());

        let instances = row_of_instances(10);
        let mut visible = Vec::new();
        let kept = culler.cull_into(&instances, &unit_bounds(), &mut visible);

        assert_eq!(kept, 5);
        assert!(visible.iter().all(|m| m[(2, 3)] == 0.0));
        assert_eq!(culler.stats().serial_passes, 1);
    }

    #[test]
    fn test_parallel_cull_matches_serial() {
        let instances = row_of_instances(5_000);

        let mut serial = FrustumCuller::new(&CullingConfig::default().with_parallel_threshold(usize::MAX));
        let mut parallel = FrustumCuller::new(&CullingConfig::default().with_parallel_threshold(64));
        serial.update(&camera());
        parallel.update(&camera());

        let mut expected = Vec::new();
        let mut actual = Vec::new();
        serial.cull_into(&instances, &unit_bounds(), &mut expected);
        parallel.cull_into(&instances, &unit_bounds(), &mut actual);

        assert_eq!(parallel.stats().parallel_passes, 1);
        assert_eq!(actual.len(), expected.len());

        let key = |m: &Mat4| (m[(0, 3)].to_bits(), m[(2, 3)].to_bits());
        let mut expected_keys: Vec<_> = expected.iter().map(key).collect();
        let mut actual_keys: Vec<_> = actual.iter().map(key).collect();
        expected_keys.sort_unstable();
        actual_keys.sort_unstable();
        assert_eq!(actual_keys, expected_keys);
    }

    #[test]
    fn test_disabled_culling_keeps_everything() {
        let mut culler = FrustumCuller::new(&CullingConfig::default().with_enabled(false));
        culler.update(&camera());

        let instances = row_of_instances(10);
        let mut visible = Vec::new();
        assert_eq!(culler.cull_into(&instances, &unit_bounds(), &mut visible), 10);
        assert_eq!(visible, instances);
    }

    #[test]
    fn test_cull_appends_without_clearing() {
        let mut culler = FrustumCuller::new(&CullingConfig::default());
        culler.update(&camera());

        let mut visible = vec![Mat4::identity()];
        culler.cull_into(&row_of_instances(4), &unit_bounds(), &mut visible);
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_empty_range() {
        let mut culler = FrustumCuller::new(&CullingConfig::default().with_parallel_threshold(1));
        culler.update(&camera());

        let mut visible = Vec::new();
        assert_eq!(culler.cull_into(&[], &unit_bounds(), &mut visible), 0);
    }
}
