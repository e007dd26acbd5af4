//! Instance Pool
//!
//! Per-mesh-type dense storage of instance transforms with O(1) insert,
//! in-place update and removal.
//!
//! # Layout
//!
//! All mesh types share one matrix array. Mesh type `m` owns the range
//! `[m * capacity, (m + 1) * capacity)` and its live instances always form
//! the gap-free prefix `[m * capacity, m * capacity + count_m)`, so a draw
//! call can consume the prefix directly.
//!
//! Two tables keep the external-id ⇄ slot bijection:
//!
//! - `external_to_slot[external_id]` — slot currently holding the id, or unset
//! - `slot_to_external[slot]` — id currently stored in a live slot
//!
//! Removal moves the last live instance of the same mesh type into the
//! freed slot (swap-remove) and repoints that instance's entry, so only one
//! other id ever changes slot.

use thiserror::Error;

use super::mesh_type::MeshType;
use crate::foundation::math::Mat4;

const UNSET: u32 = u32::MAX;

/// Errors that can occur during instance pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The mesh type's pre-allocated range is full
    #[error("{mesh_type} is full ({capacity} instances); provision capacity for the grid's maximum instance count")]
    CapacityExceeded {
        /// Mesh type whose range is full
        mesh_type: MeshType,
        /// Per-mesh-type capacity
        capacity: usize,
    },

    /// Removal of an id that has no live instance
    #[error("no instance registered for external id {0}")]
    NotFound(u32),

    /// Mesh type index beyond the pool's mesh count
    #[error("unknown {mesh_type} (pool holds {mesh_count} mesh types)")]
    UnknownMeshType {
        /// Requested mesh type
        mesh_type: MeshType,
        /// Number of mesh types in the pool
        mesh_count: usize,
    },

    /// Upsert of a live id under a different mesh type
    #[error("external id {external_id} is drawn as {current}, not {requested}; remove it before re-adding")]
    MeshTypeMismatch {
        /// Id being upserted
        external_id: u32,
        /// Mesh type that currently owns the id
        current: MeshType,
        /// Mesh type the caller asked for
        requested: MeshType,
    },

    /// External id beyond the index table
    #[error("external id {external_id} exceeds the index table ({limit} entries)")]
    ExternalIdOutOfRange {
        /// Rejected id
        external_id: u32,
        /// Size of the index table
        limit: usize,
    },

    /// Pool dimensions are unusable
    #[error("invalid pool layout: {0}")]
    InvalidLayout(String),
}

impl PoolError {
    /// Whether this is the benign double-remove case
    pub fn is_not_found(&self) -> bool {
        matches!(self, PoolError::NotFound(_))
    }
}

/// Counters for monitoring pool churn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// New instances added
    pub inserts: u64,
    /// In-place matrix updates
    pub updates: u64,
    /// Instances removed
    pub removals: u64,
    /// Removals of ids that had no instance
    pub missed_removals: u64,
}

/// Dense per-mesh-type instance storage
///
/// # Performance Characteristics
///
/// - **Insert / update / remove**: O(1)
/// - **Memory**: fixed at construction, no reallocation afterwards
/// - **Draw input**: one contiguous slice per mesh type
///
/// # Usage
///
/// ```rust
/// use belt_engine::foundation::math::Mat4;
/// use belt_engine::render::instancing::{InstancePool, MeshType};
///
/// let mut pool = InstancePool::new(2, 16).unwrap();
/// pool.upsert(MeshType(0), 3, Mat4::identity()).unwrap();
/// pool.upsert(MeshType(1), 9, Mat4::identity()).unwrap();
/// assert_eq!(pool.dense_range(MeshType(1)), (16, 1));
///
/// pool.remove(3).unwrap();
/// assert_eq!(pool.count(MeshType(0)), 0);
/// ```
#[derive(Debug, Clone)]
pub struct InstancePool {
    mesh_count: usize,
    capacity: usize,
    matrices: Vec<Mat4>,
    counts: Vec<usize>,
    external_to_slot: Vec<u32>,
    slot_to_external: Vec<u32>,
    stats: PoolStats,
}

impl InstancePool {
    /// Create a pool whose index table covers the total slot count
    pub fn new(mesh_count: usize, capacity_per_mesh: usize) -> Result<Self, PoolError> {
        let total = Self::total_slots(mesh_count, capacity_per_mesh)?;
        Self::with_id_limit(mesh_count, capacity_per_mesh, total)
    }

    /// Create a pool accepting external ids in `0..external_id_limit`
    pub fn with_id_limit(
        mesh_count: usize,
        capacity_per_mesh: usize,
        external_id_limit: usize,
    ) -> Result<Self, PoolError> {
        let total = Self::total_slots(mesh_count, capacity_per_mesh)?;
        if external_id_limit > UNSET as usize {
            return Err(PoolError::InvalidLayout(format!(
                "external id limit {external_id_limit} exceeds the u32 id space"
            )));
        }

        log::info!(
            "Created instance pool: {} mesh types x {} instances ({} slots, {} external ids)",
            mesh_count,
            capacity_per_mesh,
            total,
            external_id_limit
        );

        Ok(Self {
            mesh_count,
            capacity: capacity_per_mesh,
            matrices: vec![Mat4::identity(); total],
            counts: vec![0; mesh_count],
            external_to_slot: vec![UNSET; external_id_limit],
            slot_to_external: vec![UNSET; total],
            stats: PoolStats::default(),
        })
    }

    fn total_slots(mesh_count: usize, capacity_per_mesh: usize) -> Result<usize, PoolError> {
        if mesh_count == 0 || capacity_per_mesh == 0 {
            return Err(PoolError::InvalidLayout(format!(
                "{mesh_count} mesh types x {capacity_per_mesh} instances"
            )));
        }
        mesh_count
            .checked_mul(capacity_per_mesh)
            .filter(|total| *total < UNSET as usize)
            .ok_or_else(|| PoolError::InvalidLayout(format!(
                "{mesh_count} mesh types x {capacity_per_mesh} instances overflows the slot space"
            )))
    }

    fn mesh_index(&self, mesh_type: MeshType) -> Result<usize, PoolError> {
        if mesh_type.index() < self.mesh_count {
            Ok(mesh_type.index())
        } else {
            Err(PoolError::UnknownMeshType { mesh_type, mesh_count: self.mesh_count })
        }
    }

    fn table_index(&self, external_id: u32) -> Result<usize, PoolError> {
        let index = external_id as usize;
        if index < self.external_to_slot.len() {
            Ok(index)
        } else {
            Err(PoolError::ExternalIdOutOfRange { external_id, limit: self.external_to_slot.len() })
        }
    }

    /// Add an instance, or overwrite the matrix of a live one in place
    ///
    /// Returns the slot now holding the instance. A live id keeps its mesh
    /// type; changing it requires [`remove`](Self::remove) first.
    pub fn upsert(&mut self, mesh_type: MeshType, external_id: u32, matrix: Mat4) -> Result<usize, PoolError> {
        let mesh = self.mesh_index(mesh_type)?;
        let key = self.table_index(external_id)?;

        match self.external_to_slot[key] {
            UNSET => {
                let count = self.counts[mesh];
                if count == self.capacity {
                    return Err(PoolError::CapacityExceeded { mesh_type, capacity: self.capacity });
                }

                let slot = mesh * self.capacity + count;
                self.matrices[slot] = matrix;
                self.slot_to_external[slot] = external_id;
                self.external_to_slot[key] = slot as u32;
                self.counts[mesh] = count + 1;
                self.stats.inserts += 1;
                Ok(slot)
            }
            slot => {
                let slot = slot as usize;
                let current = MeshType(slot / self.capacity);
                if current != mesh_type {
                    return Err(PoolError::MeshTypeMismatch { external_id, current, requested: mesh_type });
                }

                self.matrices[slot] = matrix;
                self.stats.updates += 1;
                Ok(slot)
            }
        }
    }

    /// Remove an instance by swapping the last live instance of its mesh type into its slot
    ///
    /// Removing an id without an instance returns [`PoolError::NotFound`]
    /// and leaves the pool untouched.
    pub fn remove(&mut self, external_id: u32) -> Result<(), PoolError> {
        let key = self.table_index(external_id)?;

        let slot = self.external_to_slot[key];
        if slot == UNSET {
            self.stats.missed_removals += 1;
            return Err(PoolError::NotFound(external_id));
        }

        let slot = slot as usize;
        let mesh = slot / self.capacity;
        let last = mesh * self.capacity + self.counts[mesh] - 1;

        // When slot == last every step below is a self-assignment
        self.matrices[slot] = self.matrices[last];
        let moved = self.slot_to_external[last];
        self.slot_to_external[slot] = moved;
        self.external_to_slot[moved as usize] = slot as u32;

        self.external_to_slot[key] = UNSET;
        self.slot_to_external[last] = UNSET;
        self.counts[mesh] -= 1;
        self.stats.removals += 1;
        Ok(())
    }

    /// Live instance count of a mesh type (0 for unknown mesh types)
    pub fn count(&self, mesh_type: MeshType) -> usize {
        self.counts.get(mesh_type.index()).copied().unwrap_or(0)
    }

    /// `(start, count)` of a mesh type's live prefix in [`all_matrices`](Self::all_matrices)
    pub fn dense_range(&self, mesh_type: MeshType) -> (usize, usize) {
        (mesh_type.index() * self.capacity, self.count(mesh_type))
    }

    /// Live matrices of one mesh type
    pub fn matrices(&self, mesh_type: MeshType) -> &[Mat4] {
        let (start, count) = self.dense_range(mesh_type);
        if count == 0 {
            return &[];
        }
        &self.matrices[start..start + count]
    }

    /// External ids of one mesh type, parallel to [`matrices`](Self::matrices)
    pub fn external_ids(&self, mesh_type: MeshType) -> &[u32] {
        let (start, count) = self.dense_range(mesh_type);
        if count == 0 {
            return &[];
        }
        &self.slot_to_external[start..start + count]
    }

    /// The whole matrix array, live and unused slots alike
    pub fn all_matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Slot currently holding an id
    pub fn slot_of(&self, external_id: u32) -> Option<usize> {
        match self.external_to_slot.get(external_id as usize) {
            Some(&slot) if slot != UNSET => Some(slot as usize),
            _ => None,
        }
    }

    /// Id stored in a live slot
    pub fn external_at(&self, slot: usize) -> Option<u32> {
        let mesh = slot / self.capacity;
        if mesh >= self.mesh_count || slot - mesh * self.capacity >= self.counts[mesh] {
            return None;
        }
        Some(self.slot_to_external[slot])
    }

    /// Mesh type currently drawing an id
    pub fn mesh_type_of(&self, external_id: u32) -> Option<MeshType> {
        self.slot_of(external_id).map(|slot| MeshType(slot / self.capacity))
    }

    /// Matrix currently drawn for an id
    pub fn matrix_of(&self, external_id: u32) -> Option<&Mat4> {
        self.slot_of(external_id).map(|slot| &self.matrices[slot])
    }

    /// Whether an id has a live instance
    pub fn contains(&self, external_id: u32) -> bool {
        self.slot_of(external_id).is_some()
    }

    /// Live instances across all mesh types
    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of mesh types
    pub fn mesh_count(&self) -> usize {
        self.mesh_count
    }

    /// Instances each mesh type can hold
    pub fn capacity_per_mesh(&self) -> usize {
        self.capacity
    }

    /// Size of the external id table
    pub fn external_id_limit(&self) -> usize {
        self.external_to_slot.len()
    }

    /// Churn counters
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Drop every instance, keeping the allocation
    pub fn clear(&mut self) {
        for mesh in 0..self.mesh_count {
            let start = mesh * self.capacity;
            for slot in start..start + self.counts[mesh] {
                let external = self.slot_to_external[slot];
                self.external_to_slot[external as usize] = UNSET;
                self.slot_to_external[slot] = UNSET;
            }
            self.counts[mesh] = 0;
        }
        log::debug!("Cleared instance pool");
    }

    /// Panics if the bijection or the gap-free prefix invariant is broken
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        for mesh in 0..self.mesh_count {
            let start = mesh * self.capacity;
            assert!(self.counts[mesh] <= self.capacity);
            for slot in start..start + self.counts[mesh] {
                let external = self.slot_to_external[slot];
                assert_ne!(external, UNSET, "gap at slot {slot}");
                assert!(seen.insert(external), "duplicate id {external}");
                assert_eq!(self.external_to_slot[external as usize] as usize, slot);
            }
        }

        let mapped = self.external_to_slot.iter().filter(|&&slot| slot != UNSET).count();
        assert_eq!(mapped, seen.len(), "index table maps ids outside the live ranges");
    }
}
