//! Benchmark profiles for the Tendon spring force core.
//!
//! Provides pre-built lattice structures for benchmarking:
//!
//! - [`reference_profile`]: 100x100 lattice (10K nodes, ~20K springs)
//! - [`stress_profile`]: 316x316 lattice (~100K nodes)
//! - [`lattice_profile`]: any size, deterministic via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tendon_core::{
    ConfigError, DistributedIndex, LevelNumber, MapVersion, NativeIndex, NodeIndexMap, NodeVector,
    SpringConnection,
};
use tendon_force::{LevelDescriptor, LevelSprings};
use tendon_test_utils::{place_nodes, shuffled_map};

/// A structure ready to initialize and compute on a single process.
pub struct SpringProfile {
    /// Native → distributed numbering (shuffled).
    pub map: NodeIndexMap,
    /// Connectivity keyed by master node.
    pub springs: LevelSprings,
    /// The level owning every node.
    pub level: LevelDescriptor,
    /// Node positions in the distributed numbering.
    pub positions: NodeVector,
}

impl SpringProfile {
    /// Total number of connections across all masters.
    pub fn connection_count(&self) -> usize {
        self.springs.values().map(|spec| spec.len()).sum()
    }

    /// A zeroed force vector matching [`positions`](Self::positions).
    pub fn force_vector(&self) -> Result<NodeVector, ConfigError> {
        NodeVector::new(
            self.positions.dim(),
            self.positions.map_version(),
            self.positions.owned(),
        )
    }
}

/// Build a reference benchmark profile: 100x100 lattice (10K nodes).
pub fn reference_profile(seed: u64) -> Result<SpringProfile, ConfigError> {
    lattice_profile(100, seed)
}

/// Build a stress benchmark profile: 316x316 lattice (~100K nodes).
pub fn stress_profile(seed: u64) -> Result<SpringProfile, ConfigError> {
    lattice_profile(316, seed)
}

/// A `side` x `side` 2D lattice with unit rest-length springs to the right
/// and upper neighbours, nodes jittered off the grid by up to 0.1.
pub fn lattice_profile(side: u32, seed: u64) -> Result<SpringProfile, ConfigError> {
    let count = side * side;
    let node = |col: u32, row: u32| NativeIndex(row * side + col);

    let mut springs = LevelSprings::with_capacity(count as usize);
    for row in 0..side {
        for col in 0..side {
            let spec = springs.entry(node(col, row)).or_default();
            if col + 1 < side {
                spec.push(SpringConnection::linear(node(col + 1, row), 10.0, 1.0));
            }
            if row + 1 < side {
                spec.push(SpringConnection::linear(node(col, row + 1), 10.0, 1.0));
            }
        }
    }
    springs.retain(|_, spec| !spec.is_empty());

    let map = shuffled_map(MapVersion(0), count, seed);
    let level = LevelDescriptor::new(LevelNumber(0), DistributedIndex(0)..DistributedIndex(count));
    let mut positions = NodeVector::new(2, map.version(), level.owned.clone())?;
    place_nodes(&mut positions, &map, |n| {
        let (col, row) = (n.0 % side, n.0 / side);
        vec![
            f64::from(col) + jitter(seed, u64::from(n.0) * 2),
            f64::from(row) + jitter(seed, u64::from(n.0) * 2 + 1),
        ]
    });

    Ok(SpringProfile {
        map,
        springs,
        level,
        positions,
    })
}

fn jitter(seed: u64, i: u64) -> f64 {
    let h = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(i.wrapping_mul(1442695040888963407));
    ((h >> 11) as f64 / (1u64 << 53) as f64 - 0.5) * 0.2
}
