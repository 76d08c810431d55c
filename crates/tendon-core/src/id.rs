//! Strongly-typed identifiers for nodes, levels, kernels, and stash types.

use std::fmt;

/// A node's stable identifier, assigned at structure-definition time.
///
/// Native indices are independent of how nodes are partitioned across
/// processes and never change when the hierarchy is regridded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeIndex(pub u32);

impl NativeIndex {
    /// Shift this index by a signed offset.
    ///
    /// Returns `None` if the result falls outside the `u32` range.
    pub fn checked_offset(self, offset: i64) -> Option<Self> {
        let shifted = i64::from(self.0).checked_add(offset)?;
        u32::try_from(shifted).ok().map(Self)
    }
}

impl fmt::Display for NativeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NativeIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A node's position within the current cross-process numbering.
///
/// Only meaningful together with the [`MapVersion`] of the map that
/// produced it; any redistribution invalidates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistributedIndex(pub u32);

impl fmt::Display for DistributedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DistributedIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// One refinement layer of the adaptive mesh hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelNumber(pub u32);

impl fmt::Display for LevelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LevelNumber {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Selects the force kernel used by a spring connection.
///
/// `KernelId(0)` is reserved for the default linear spring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(pub u32);

impl KernelId {
    /// The id under which the default linear-spring kernel is registered.
    pub const DEFAULT: Self = Self(0);
}

impl Default for KernelId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for KernelId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a record type in a migration stream.
///
/// Assigned by a stash type registry owned by the application and
/// injected into each factory; the same type must map to the same id
/// on every process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StashTypeId(pub u32);

impl fmt::Display for StashTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StashTypeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Version of a native↔distributed numbering.
///
/// Bumped by the ownership collaborator on every redistribution, so
/// data built under one numbering can be detected as stale under the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapVersion(pub u64);

impl MapVersion {
    /// The version that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for MapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MapVersion {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
