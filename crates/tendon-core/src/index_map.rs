//! The versioned native↔distributed node numbering.

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::id::{DistributedIndex, MapVersion, NativeIndex};

/// A bijective map between native and distributed node indices.
///
/// Produced by the ownership collaborator for one level at one point in
/// time. Consumers read it during the call it is passed to and keep only
/// its [`version`](Self::version); the distributed half is invalid after
/// the next redistribution.
///
/// # Examples
///
/// ```
/// use tendon_core::{DistributedIndex, MapVersion, NativeIndex, NodeIndexMap};
///
/// let map = NodeIndexMap::from_pairs(
///     MapVersion(3),
///     [(NativeIndex(10), DistributedIndex(0)), (NativeIndex(4), DistributedIndex(1))],
/// )
/// .unwrap();
///
/// assert_eq!(map.distributed(NativeIndex(4)), Some(DistributedIndex(1)));
/// assert_eq!(map.native(DistributedIndex(0)), Some(NativeIndex(10)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct NodeIndexMap {
    version: MapVersion,
    to_distributed: IndexMap<NativeIndex, DistributedIndex>,
    to_native: IndexMap<DistributedIndex, NativeIndex>,
}

impl NodeIndexMap {
    /// Build a map from `(native, distributed)` pairs.
    ///
    /// Fails with [`ConfigError::NonBijectiveMap`] if either index appears
    /// twice.
    pub fn from_pairs(
        version: MapVersion,
        pairs: impl IntoIterator<Item = (NativeIndex, DistributedIndex)>,
    ) -> Result<Self, ConfigError> {
        let pairs = pairs.into_iter();
        let (lower, _) = pairs.size_hint();
        let mut to_distributed = IndexMap::with_capacity(lower);
        let mut to_native = IndexMap::with_capacity(lower);

        for (native, distributed) in pairs {
            if let Some(prev) = to_distributed.insert(native, distributed) {
                return Err(ConfigError::NonBijectiveMap {
                    reason: format!(
                        "native {native} mapped to both {prev} and {distributed}"
                    ),
                });
            }
            if let Some(prev) = to_native.insert(distributed, native) {
                return Err(ConfigError::NonBijectiveMap {
                    reason: format!(
                        "distributed {distributed} claimed by both {prev} and {native}"
                    ),
                });
            }
        }

        Ok(Self {
            version,
            to_distributed,
            to_native,
        })
    }

    /// Identity numbering `native i ↔ distributed i` for `0..count`.
    pub fn identity(version: MapVersion, count: u32) -> Self {
        let to_distributed = (0..count)
            .map(|i| (NativeIndex(i), DistributedIndex(i)))
            .collect();
        let to_native = (0..count)
            .map(|i| (DistributedIndex(i), NativeIndex(i)))
            .collect();
        Self {
            version,
            to_distributed,
            to_native,
        }
    }

    /// The numbering version this map describes.
    pub fn version(&self) -> MapVersion {
        self.version
    }

    /// Distributed index of a native node, if mapped.
    pub fn distributed(&self, native: NativeIndex) -> Option<DistributedIndex> {
        self.to_distributed.get(&native).copied()
    }

    /// Native index of a distributed slot, if mapped.
    pub fn native(&self, distributed: DistributedIndex) -> Option<NativeIndex> {
        self.to_native.get(&distributed).copied()
    }

    /// Number of mapped nodes.
    pub fn len(&self) -> usize {
        self.to_distributed.len()
    }

    /// Whether the map has no nodes.
    pub fn is_empty(&self) -> bool {
        self.to_distributed.is_empty()
    }

    /// Iterate `(native, distributed)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NativeIndex, DistributedIndex)> + '_ {
        self.to_distributed.iter().map(|(&n, &d)| (n, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn duplicate_native_rejected() {
        let result = NodeIndexMap::from_pairs(
            MapVersion(0),
            [
                (NativeIndex(1), DistributedIndex(0)),
                (NativeIndex(1), DistributedIndex(1)),
            ],
        );
        assert!(matches!(result, Err(ConfigError::NonBijectiveMap { .. })));
    }

    #[test]
    fn duplicate_distributed_rejected() {
        let result = NodeIndexMap::from_pairs(
            MapVersion(0),
            [
                (NativeIndex(1), DistributedIndex(5)),
                (NativeIndex(2), DistributedIndex(5)),
            ],
        );
        assert!(matches!(result, Err(ConfigError::NonBijectiveMap { .. })));
    }

    #[test]
    fn identity_maps_both_ways() {
        let map = NodeIndexMap::identity(MapVersion(2), 4);
        assert_eq!(map.len(), 4);
        assert_eq!(map.version(), MapVersion(2));
        for i in 0..4 {
            assert_eq!(map.distributed(NativeIndex(i)), Some(DistributedIndex(i)));
            assert_eq!(map.native(DistributedIndex(i)), Some(NativeIndex(i)));
        }
        assert_eq!(map.distributed(NativeIndex(4)), None);
    }

    proptest! {
        #[test]
        fn permutation_round_trips(n in 1u32..64, rotate in 0u32..64) {
            // Rotating the distributed numbering is always a bijection.
            let pairs = (0..n).map(|i| (NativeIndex(i), DistributedIndex((i + rotate) % n)));
            let map = NodeIndexMap::from_pairs(MapVersion(1), pairs).unwrap();
            for (native, distributed) in map.iter() {
                prop_assert_eq!(map.native(distributed), Some(native));
            }
        }
    }
}
