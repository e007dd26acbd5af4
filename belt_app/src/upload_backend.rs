//! Headless draw backend
//!
//! Packs every batch into GPU instance records exactly as a real backend
//! would before a buffer copy, and keeps totals instead of submitting.

use belt_engine::render::instancing::InstanceData;
use belt_engine::render::{DrawBackend, DrawBatch};

/// Draw backend that stages instance data and counts what it would upload
#[derive(Debug, Default)]
pub struct UploadBackend {
    staging: Vec<InstanceData>,
    /// Draw calls received
    pub draw_calls: u64,
    /// Instances received
    pub instances: u64,
    /// Bytes that would have been copied to instance buffers
    pub bytes_uploaded: u64,
}

impl DrawBackend for UploadBackend {
    fn draw_instanced(&mut self, batch: DrawBatch<'_>) {
        InstanceData::pack_into(batch.transforms, &mut self.staging);
        let bytes = InstanceData::as_bytes(&self.staging);

        log::trace!(
            "Draw {} (mesh {:?}, material {:?}): {} instances, {} bytes",
            batch.mesh_type,
            batch.mesh,
            batch.material,
            batch.instance_count(),
            bytes.len()
        );

        self.draw_calls += 1;
        self.instances += batch.instance_count() as u64;
        self.bytes_uploaded += bytes.len() as u64;
    }
}
