//! Scripted brush input
//!
//! Stands in for mouse input: produces drags that walk across the grid one
//! cell at a time, with the occasional erase sweep and mesh change.

use belt_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What the script wants done this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeAction {
    /// Apply a brush sample
    Edit(EditInput),
    /// Let go of the mouse button
    Release,
    /// Switch the mesh used for new tiles
    SwitchMesh(MeshType),
    /// Nothing this tick
    Idle,
}

/// Random-walk drag generator over a grid footprint
pub struct StrokeScript {
    rng: StdRng,
    min: Vec3,
    max: Vec3,
    cell: f32,
    mesh_count: usize,
    brush_radius: u32,
    cursor: Vec3,
    direction: (f32, f32),
    remaining: u32,
    mode: EditMode,
}

impl StrokeScript {
    /// Create a script that starts its drags inside `grid`'s footprint
    pub fn new(seed: u64, grid: &SpatialGrid, mesh_count: usize, brush_radius: u32) -> Self {
        let size = grid.size();
        let extent = Vec3::new(size.x as f32, 0.0, size.z as f32);
        let min = match grid.origin() {
            GridOrigin::Centered => -extent * 0.5,
            GridOrigin::Anchored => Vec3::zeros(),
        };

        Self {
            rng: StdRng::seed_from_u64(seed),
            min,
            max: min + extent,
            cell: 1.0,
            mesh_count,
            brush_radius,
            cursor: Vec3::zeros(),
            direction: (1.0, 0.0),
            remaining: 0,
            mode: EditMode::Paint,
        }
    }

    /// World-space center of the footprint
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Action for the next tick
    pub fn next_action(&mut self) -> StrokeAction {
        if self.remaining == 0 {
            return self.begin_drag();
        }
        self.remaining -= 1;

        // Turn a corner now and then so belt lines bend
        if self.rng.gen_bool(0.15) {
            self.direction = match self.rng.gen_range(0..4) {
                0 => (1.0, 0.0),
                1 => (-1.0, 0.0),
                2 => (0.0, 1.0),
                _ => (0.0, -1.0),
            };
        }
        self.cursor.x += self.direction.0 * self.cell;
        self.cursor.z += self.direction.1 * self.cell;

        let radius = match self.mode {
            EditMode::Paint => 0,
            EditMode::Erase => self.brush_radius + 1,
        };
        StrokeAction::Edit(EditInput { hit_point: self.cursor, radius, mode: self.mode })
    }

    fn begin_drag(&mut self) -> StrokeAction {
        self.remaining = self.rng.gen_range(8..40);
        self.cursor = Vec3::new(
            self.rng.gen_range(self.min.x..self.max.x),
            0.0,
            self.rng.gen_range(self.min.z..self.max.z),
        );
        self.mode = if self.rng.gen_bool(0.2) { EditMode::Erase } else { EditMode::Paint };

        if self.mesh_count > 1 && self.rng.gen_bool(0.25) {
            return StrokeAction::SwitchMesh(MeshType(self.rng.gen_range(0..self.mesh_count)));
        }
        if self.rng.gen_bool(0.1) {
            return StrokeAction::Idle;
        }
        StrokeAction::Release
    }
}
