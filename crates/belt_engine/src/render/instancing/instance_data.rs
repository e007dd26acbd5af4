//! GPU-facing instance records
//!
//! Backends that upload per-instance vertex buffers pack the visible matrices
//! of a draw batch into [`InstanceData`] and copy the bytes directly.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Mat4;

/// Instance data structure for GPU upload
/// Must match the instanced vertex layout of the tile shader
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Model transformation matrix (column major)
    pub model_matrix: [[f32; 4]; 4],
    /// Normal transformation matrix (3x3, padded to 4x4 for alignment)
    pub normal_matrix: [[f32; 4]; 4],
}

impl InstanceData {
    /// Create instance data from a model matrix
    pub fn from_matrix(model_matrix: &Mat4) -> Self {
        Self {
            model_matrix: (*model_matrix).into(),
            normal_matrix: Self::calculate_normal_matrix(model_matrix),
        }
    }

    fn calculate_normal_matrix(model_matrix: &Mat4) -> [[f32; 4]; 4] {
        // Inverse transpose of the upper 3x3; tiles are rigid so this is usually the rotation itself
        let mat3 = model_matrix.fixed_view::<3, 3>(0, 0);
        let normal_mat3 = mat3.try_inverse().unwrap_or_else(|| mat3.clone_owned()).transpose();

        [
            [normal_mat3[(0, 0)], normal_mat3[(1, 0)], normal_mat3[(2, 0)], 0.0],
            [normal_mat3[(0, 1)], normal_mat3[(1, 1)], normal_mat3[(2, 1)], 0.0],
            [normal_mat3[(0, 2)], normal_mat3[(1, 2)], normal_mat3[(2, 2)], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    /// Pack a batch of transforms into `out`, replacing its contents
    pub fn pack_into(transforms: &[Mat4], out: &mut Vec<InstanceData>) {
        out.clear();
        out.extend(transforms.iter().map(Self::from_matrix));
    }

    /// Raw bytes of a packed batch, ready for a buffer copy
    pub fn as_bytes(instances: &[InstanceData]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}
