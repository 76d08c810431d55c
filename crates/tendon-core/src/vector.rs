//! Per-node vector storage: the seam to the distributed-storage collaborator.
//!
//! Positions and forces are `dim` components per node, addressed by
//! [`DistributedIndex`]. A process owns a contiguous range of distributed
//! indices and may hold ghost copies of remote nodes; filling ghosts before
//! a force computation and reducing ghost forces afterwards is the
//! collaborator's job.

use std::ops::Range;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::id::{DistributedIndex, MapVersion};

/// Read access to a node vector.
pub trait NodeVectorReader {
    /// Components per node.
    fn dim(&self) -> usize;

    /// Version of the numbering the vector is laid out in.
    fn map_version(&self) -> MapVersion;

    /// Components of one node, or `None` if the index has no local or ghost slot.
    fn node(&self, index: DistributedIndex) -> Option<&[f64]>;
}

/// Write access to a node vector.
pub trait NodeVectorWriter {
    /// Components per node.
    fn dim(&self) -> usize;

    /// Version of the numbering the vector is laid out in.
    fn map_version(&self) -> MapVersion;

    /// Mutable components of one node, or `None` if the index has no slot.
    fn node_mut(&mut self, index: DistributedIndex) -> Option<&mut [f64]>;
}

/// A ghosted node vector: one contiguous owned range plus ghost slots.
///
/// Owned nodes occupy the first `owned.len() * dim` entries of the backing
/// buffer; ghosts follow in the order they were added.
///
/// # Examples
///
/// ```
/// use tendon_core::{DistributedIndex, MapVersion, NodeVector, NodeVectorReader};
///
/// let mut x = NodeVector::new(2, MapVersion(0), DistributedIndex(4)..DistributedIndex(6)).unwrap();
/// x.add_ghost(DistributedIndex(9));
/// x.set(DistributedIndex(9), &[1.0, 2.0]);
///
/// assert_eq!(x.node(DistributedIndex(9)), Some(&[1.0, 2.0][..]));
/// assert_eq!(x.node(DistributedIndex(7)), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct NodeVector {
    dim: usize,
    version: MapVersion,
    owned: Range<u32>,
    ghosts: IndexMap<DistributedIndex, usize>,
    data: Vec<f64>,
}

impl NodeVector {
    /// Create a zeroed vector owning the distributed range `owned`.
    ///
    /// Fails if `dim` is zero or the range is reversed.
    pub fn new(
        dim: usize,
        version: MapVersion,
        owned: Range<DistributedIndex>,
    ) -> Result<Self, ConfigError> {
        if dim == 0 {
            return Err(ConfigError::InvalidValue {
                reason: "node vector dimension must be at least 1".into(),
            });
        }
        if owned.end < owned.start {
            return Err(ConfigError::InvalidValue {
                reason: format!(
                    "owned range {}..{} is reversed",
                    owned.start, owned.end
                ),
            });
        }
        let owned = owned.start.0..owned.end.0;
        let len = owned.len() * dim;
        Ok(Self {
            dim,
            version,
            owned,
            ghosts: IndexMap::new(),
            data: vec![0.0; len],
        })
    }

    /// Components per node.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Version of the numbering the vector is laid out in.
    pub fn map_version(&self) -> MapVersion {
        self.version
    }

    /// The owned distributed range.
    pub fn owned(&self) -> Range<DistributedIndex> {
        DistributedIndex(self.owned.start)..DistributedIndex(self.owned.end)
    }

    /// Whether `index` is in the owned range.
    pub fn owns(&self, index: DistributedIndex) -> bool {
        self.owned.contains(&index.0)
    }

    /// Add a zeroed ghost slot for a remote node. No-op if it already has a slot.
    pub fn add_ghost(&mut self, index: DistributedIndex) {
        if self.owns(index) || self.ghosts.contains_key(&index) {
            return;
        }
        let slot = self.owned.len() + self.ghosts.len();
        self.ghosts.insert(index, slot);
        self.data.extend(std::iter::repeat_n(0.0, self.dim));
    }

    /// Ghost indices with their current values, in the order they were added.
    pub fn ghosts(&self) -> impl Iterator<Item = (DistributedIndex, &[f64])> + '_ {
        self.ghosts
            .iter()
            .map(|(&idx, &slot)| (idx, &self.data[slot * self.dim..(slot + 1) * self.dim]))
    }

    /// Number of nodes with a slot (owned plus ghosts).
    pub fn node_count(&self) -> usize {
        self.owned.len() + self.ghosts.len()
    }

    /// Overwrite one node's components. Returns `false` if it has no slot.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != self.dim()`.
    pub fn set(&mut self, index: DistributedIndex, values: &[f64]) -> bool {
        match self.slot_range(index) {
            Some(range) => {
                self.data[range].copy_from_slice(values);
                true
            }
            None => false,
        }
    }

    /// Zero every component, owned and ghost.
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// The owned portion of the backing buffer.
    pub fn owned_values(&self) -> &[f64] {
        &self.data[..self.owned.len() * self.dim]
    }

    /// The full backing buffer (owned then ghosts).
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn slot_range(&self, index: DistributedIndex) -> Option<Range<usize>> {
        let slot = if self.owns(index) {
            (index.0 - self.owned.start) as usize
        } else {
            *self.ghosts.get(&index)?
        };
        Some(slot * self.dim..(slot + 1) * self.dim)
    }
}

impl NodeVectorReader for NodeVector {
    fn dim(&self) -> usize {
        self.dim
    }

    fn map_version(&self) -> MapVersion {
        self.version
    }

    fn node(&self, index: DistributedIndex) -> Option<&[f64]> {
        let range = self.slot_range(index)?;
        Some(&self.data[range])
    }
}

impl NodeVectorWriter for NodeVector {
    fn dim(&self) -> usize {
        self.dim
    }

    fn map_version(&self) -> MapVersion {
        self.version
    }

    fn node_mut(&mut self, index: DistributedIndex) -> Option<&mut [f64]> {
        let range = self.slot_range(index)?;
        Some(&mut self.data[range])
    }
}
