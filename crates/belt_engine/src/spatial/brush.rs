//! Square brush footprint over one grid layer

use super::cell::GridId;
use super::grid::{coord_to_id, GridSize};
use crate::foundation::math::IVec3;

/// Iterator over the ids of every in-bounds cell inside a brush
///
/// The footprint is the `(2r+1) x (2r+1)` square on the center's layer,
/// clipped to the grid. Iteration is z-major then x, so the same call
/// always visits cells in the same order. The iterator copies the grid
/// size and does not borrow the grid.
#[derive(Debug, Clone)]
pub struct BrushIter {
    size: GridSize,
    y: i32,
    x_min: i32,
    x_max: i32,
    z_max: i32,
    x: i32,
    z: i32,
}

impl BrushIter {
    /// Build the clipped footprint for `center` and `radius`
    pub fn new(size: GridSize, center: IVec3, radius: u32) -> Self {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);

        let x_min = center.x.saturating_sub(r).max(0);
        let x_max = center.x.saturating_add(r).min(size.x - 1);
        let z_min = center.z.saturating_sub(r).max(0);
        let mut z_max = center.z.saturating_add(r).min(size.z - 1);

        // A center on a layer outside the grid has no footprint at all
        if center.y < 0 || center.y >= size.y || x_min > x_max {
            z_max = z_min - 1;
        }

        Self {
            size,
            y: center.y,
            x_min,
            x_max,
            z_max,
            x: x_min,
            z: z_min,
        }
    }
}

impl Iterator for BrushIter {
    type Item = GridId;

    fn next(&mut self) -> Option<GridId> {
        if self.z > self.z_max {
            return None;
        }

        let id = coord_to_id(IVec3::new(self.x, self.y, self.z), self.size);

        self.x += 1;
        if self.x > self.x_max {
            self.x = self.x_min;
            self.z += 1;
        }

        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.z > self.z_max {
            return (0, Some(0));
        }
        let width = (self.x_max - self.x_min + 1) as usize;
        let full_rows = (self.z_max - self.z) as usize;
        let remaining = full_rows * width + (self.x_max - self.x + 1) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BrushIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::grid::id_to_coord;

    #[test]
    fn test_brush_clipped_at_grid_corner() {
        let size = GridSize::new(5, 1, 5);
        let ids: Vec<GridId> = BrushIter::new(size, IVec3::zeros(), 10).collect();

        assert_eq!(ids.len(), 25);
        for id in ids {
            let coord = id_to_coord(id, size);
            assert!(coord.x >= 0 && coord.z >= 0);
            assert!(coord.x < 5 && coord.z < 5);
        }
    }

    #[test]
    fn test_brush_interior_footprint() {
        let size = GridSize::new(10, 1, 10);
        let brush = BrushIter::new(size, IVec3::new(5, 0, 5), 1);
        assert_eq!(brush.len(), 9);

        let ids: Vec<GridId> = brush.collect();
        // z-major then x
        assert_eq!(ids[0], coord_to_id(IVec3::new(4, 0, 4), size));
        assert_eq!(ids[1], coord_to_id(IVec3::new(5, 0, 4), size));
        assert_eq!(ids[3], coord_to_id(IVec3::new(4, 0, 5), size));
        assert_eq!(ids[8], coord_to_id(IVec3::new(6, 0, 6), size));
    }

    #[test]
    fn test_radius_zero_is_single_cell() {
        let size = GridSize::new(4, 2, 4);
        let ids: Vec<GridId> = BrushIter::new(size, IVec3::new(2, 1, 3), 0).collect();
        assert_eq!(ids, vec![coord_to_id(IVec3::new(2, 1, 3), size)]);
    }

    #[test]
    fn test_brush_stays_on_center_layer() {
        let size = GridSize::new(3, 3, 3);
        for id in BrushIter::new(size, IVec3::new(1, 2, 1), 5) {
            assert_eq!(id_to_coord(id, size).y, 2);
        }
    }

    #[test]
    fn test_center_outside_layers_is_empty() {
        let size = GridSize::new(3, 1, 3);
        assert_eq!(BrushIter::new(size, IVec3::new(1, 4, 1), 2).count(), 0);
    }
}
