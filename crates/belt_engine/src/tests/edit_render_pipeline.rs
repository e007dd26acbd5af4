//! Editing through the engine and drawing the result
//!
//! Checks that grid state, pool contents and submitted draws stay in step
//! across paint and erase strokes.

use crate::core::{ApplicationConfig, GridConfig, PoolConfig};
use crate::editing::{instance_matrix, EditInput};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::{
    Aabb, Camera, CountingBackend, DrawBackend, DrawBatch, MaterialHandle, MeshDescriptor, MeshHandle, MeshType,
};
use crate::spatial::{CellKind, GridOrigin, GridStorageKind};
use crate::{Engine, EngineError};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    /// Backend that keeps a copy of every submitted transform
    #[derive(Default)]
    struct RecordingBackend {
        batches: Vec<(MeshType, MeshHandle, MaterialHandle, Vec<Mat4>)>,
    }

    impl DrawBackend for RecordingBackend {
        fn draw_instanced(&mut self, batch: DrawBatch<'_>) {
            self.batches.push((batch.mesh_type, batch.mesh, batch.material, batch.transforms.to_vec()));
        }
    }

    fn meshes(count: usize) -> Vec<MeshDescriptor> {
        (0..count)
            .map(|i| MeshDescriptor::new(MeshHandle(100 + i as u64), Aabb::tile(0.25)))
            .collect()
    }

    fn config(storage: GridStorageKind) -> ApplicationConfig {
        ApplicationConfig {
            grid: GridConfig::new([16, 1, 16]).with_storage(storage).with_origin(GridOrigin::Centered),
            ..ApplicationConfig::default()
        }
    }

    fn engine(storage: GridStorageKind) -> Engine {
        Engine::new(config(storage), meshes(2), MaterialHandle(9)).unwrap()
    }

    /// High camera that sees the whole 16x16 footprint
    fn overview_camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 40.0, 0.1), 60.0, 1.0, 0.1, 200.0)
    }

    fn assert_grid_matches_pool(engine: &Engine) {
        let grid = engine.grid();
        let pool = engine.pool();
        pool.assert_consistent();

        let mut occupied = 0;
        for id in 0..grid.cell_count() as i32 {
            let cell = grid.get(id);
            if cell.kind == CellKind::Occupied {
                occupied += 1;
                let matrix = pool.matrix_of(id as u32).expect("occupied cell without instance");
                assert_eq!(*matrix, instance_matrix(grid, &cell));
            } else {
                assert!(!pool.contains(id as u32), "empty cell {id} still drawn");
            }
        }
        assert_eq!(pool.total_count(), occupied);
    }

    #[test]
    fn test_painted_row_is_drawn_in_one_batch() {
        let mut engine = engine(GridStorageKind::Dense);

        for x in -3..=3 {
            engine.apply_edit(&EditInput::paint(Vec3::new(x as f32, 0.0, 0.0), 0)).unwrap();
        }
        engine.release_brush();

        let mut backend = RecordingBackend::default();
        let stats = engine.render_frame(&overview_camera(), &mut backend);

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.visible_instances, engine.pool().total_count());
        let (mesh_type, mesh, material, transforms) = &backend.batches[0];
        assert_eq!(*mesh_type, MeshType(0));
        assert_eq!(*mesh, MeshHandle(100));
        assert_eq!(*material, MaterialHandle(9));
        assert_eq!(transforms.len(), engine.grid().occupied_count());
        assert_grid_matches_pool(&engine);
    }

    #[test]
    fn test_erase_removes_draws() {
        let mut engine = engine(GridStorageKind::Dense);
        engine.apply_edit(&EditInput::paint(Vec3::zeros(), 2)).unwrap();
        engine.apply_edit(&EditInput::erase(Vec3::zeros(), 4)).unwrap();

        let mut backend = CountingBackend::default();
        let stats = engine.render_frame(&overview_camera(), &mut backend);

        assert_eq!(stats.draw_calls, 0);
        assert_eq!(backend.draw_calls, 0);
        assert_eq!(engine.pool().total_count(), 0);
    }

    #[test]
    fn test_each_mesh_type_gets_its_own_draw() {
        let mut engine = engine(GridStorageKind::Sparse);
        engine.apply_edit(&EditInput::paint(Vec3::new(-4.0, 0.0, -4.0), 1)).unwrap();
        engine.release_brush();

        engine.editor_mut().set_paint_mesh(MeshType(1));
        engine.apply_edit(&EditInput::paint(Vec3::new(4.0, 0.0, 4.0), 0)).unwrap();

        let mut backend = CountingBackend::default();
        let stats = engine.render_frame(&overview_camera(), &mut backend);

        assert_eq!(stats.draw_calls, 2);
        assert_eq!(backend.mesh_types, vec![MeshType(0), MeshType(1)]);
        assert_eq!(engine.pool().count(MeshType(0)), 9);
        assert_eq!(engine.pool().count(MeshType(1)), 1);
    }

    #[test]
    fn test_camera_facing_away_draws_nothing() {
        let mut engine = engine(GridStorageKind::Dense);
        engine.apply_edit(&EditInput::paint(Vec3::zeros(), 3)).unwrap();

        let mut camera = Camera::perspective(Vec3::new(0.0, 5.0, 0.0), 60.0, 1.0, 0.1, 200.0);
        camera.set_target(Vec3::new(0.0, 50.0, 1.0));

        let mut backend = CountingBackend::default();
        let stats = engine.render_frame(&camera, &mut backend);

        assert_eq!(stats.draw_calls, 0);
        assert_eq!(stats.total_instances, 49);
    }

    #[test]
    fn test_out_of_bounds_edit_is_ignored() {
        let mut engine = engine(GridStorageKind::Dense);
        let report = engine.apply_edit(&EditInput::paint(Vec3::new(50.0, 0.0, 0.0), 2)).unwrap();

        assert!(report.is_empty());
        assert_eq!(engine.pool().total_count(), 0);
    }

    #[test]
    fn test_capacity_exceeded_surfaces_through_engine() {
        let config = ApplicationConfig {
            pool: PoolConfig::new(2).with_capacity(3),
            ..config(GridStorageKind::Dense)
        };
        let mut engine = Engine::new(config, meshes(2), MaterialHandle(0)).unwrap();

        let err = engine.apply_edit(&EditInput::paint(Vec3::zeros(), 1)).unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(engine.pool().count(MeshType(0)), 3);
    }

    #[test]
    fn test_mesh_descriptor_count_must_match() {
        let result = Engine::new(config(GridStorageKind::Dense), meshes(3), MaterialHandle(0));
        assert!(matches!(result, Err(EngineError::MeshCountMismatch { expected: 2, actual: 3 })));
    }

    #[test]
    fn test_random_strokes_keep_grid_and_pool_in_step() {
        let mut dense = engine(GridStorageKind::Dense);
        let mut sparse = engine(GridStorageKind::Sparse);
        let mut rng = StdRng::seed_from_u64(42);

        for stroke in 0..300 {
            let hit = Vec3::new(rng.gen_range(-9.0..9.0), 0.0, rng.gen_range(-9.0..9.0));
            let radius = rng.gen_range(0..3);
            let input = if rng.gen_bool(0.7) {
                EditInput::paint(hit, radius)
            } else {
                EditInput::erase(hit, radius)
            };

            let a = dense.apply_edit(&input).unwrap();
            let b = sparse.apply_edit(&input).unwrap();
            assert_eq!(a, b, "stroke {stroke} diverged");

            if rng.gen_bool(0.2) {
                dense.release_brush();
                sparse.release_brush();
            }
        }

        assert_grid_matches_pool(&dense);
        assert_grid_matches_pool(&sparse);

        let occupied = |engine: &Engine| -> BTreeSet<i32> {
            (0..engine.grid().cell_count() as i32)
                .filter(|id| !engine.grid().get(*id).is_empty())
                .collect()
        };
        assert_eq!(occupied(&dense), occupied(&sparse));
    }
}
