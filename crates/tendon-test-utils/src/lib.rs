//! Test utilities for Tendon development.
//!
//! Builders for small spring structures and node numberings, helpers that
//! lay out ghosted position/force vectors, and probe kernels in
//! [`fixtures`] for observing what the force engine passes to kernels.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::ops::Range;

use indexmap::IndexMap;
use tendon_core::{
    DistributedIndex, MapVersion, NativeIndex, NodeIndexMap, NodeVector, SpringConnection,
    SpringSpec,
};

/// Spring connectivity of one level, keyed by master node.
pub type Springs = IndexMap<NativeIndex, SpringSpec>;

/// An open chain `0 - 1 - ... - (count-1)`, each node the master of the
/// link to its successor.
pub fn chain(count: u32, stiffness: f64, rest_length: f64) -> Springs {
    (0..count.saturating_sub(1))
        .map(|i| {
            let spec = [SpringConnection::linear(NativeIndex(i + 1), stiffness, rest_length)]
                .into_iter()
                .collect();
            (NativeIndex(i), spec)
        })
        .collect()
}

/// A closed ring: [`chain`] plus the link from the last node back to 0.
pub fn ring(count: u32, stiffness: f64, rest_length: f64) -> Springs {
    let mut springs = chain(count, stiffness, rest_length);
    if count > 2 {
        springs
            .entry(NativeIndex(count - 1))
            .or_default()
            .push(SpringConnection::linear(NativeIndex(0), stiffness, rest_length));
    }
    springs
}

/// A deterministic permutation of `0..count` mixed by `seed`, used as a
/// native → distributed numbering that is not the identity.
pub fn shuffled_map(version: MapVersion, count: u32, seed: u64) -> NodeIndexMap {
    let mut order: Vec<u32> = (0..count).collect();
    let mut state = seed;
    for i in (1..order.len()).rev() {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let j = ((state >> 33) % (i as u64 + 1)) as usize;
        order.swap(i, j);
    }
    let pairs = order
        .into_iter()
        .enumerate()
        .map(|(native, distributed)| (NativeIndex(native as u32), DistributedIndex(distributed)));
    match NodeIndexMap::from_pairs(version, pairs) {
        Ok(map) => map,
        Err(e) => panic!("permutation is always bijective: {e}"),
    }
}

/// A zeroed vector owning `owned` with ghost slots for `ghosts`.
pub fn ghosted_vector(
    dim: usize,
    version: MapVersion,
    owned: Range<u32>,
    ghosts: &[u32],
) -> NodeVector {
    let mut v = match NodeVector::new(
        dim,
        version,
        DistributedIndex(owned.start)..DistributedIndex(owned.end),
    ) {
        Ok(v) => v,
        Err(e) => panic!("invalid test vector layout: {e}"),
    };
    for &g in ghosts {
        v.add_ghost(DistributedIndex(g));
    }
    v
}

/// Fill a position vector so that the node with native index `i` sits at
/// `place(i)`, for every slot the vector holds.
pub fn place_nodes(
    x: &mut NodeVector,
    map: &NodeIndexMap,
    mut place: impl FnMut(NativeIndex) -> Vec<f64>,
) {
    for (native, distributed) in map.iter() {
        x.set(distributed, &place(native));
    }
}

/// Sum of every owned component, per dimension.
pub fn owned_total(f: &NodeVector) -> Vec<f64> {
    let dim = f.dim();
    let mut total = vec![0.0; dim];
    for node in f.owned_values().chunks(dim) {
        for (t, v) in total.iter_mut().zip(node) {
            *t += v;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_and_ring_shapes() {
        let c = chain(4, 1.0, 0.5);
        assert_eq!(c.len(), 3);
        assert_eq!(c[&NativeIndex(2)].connections()[0].partner, NativeIndex(3));

        let r = ring(4, 1.0, 0.5);
        assert_eq!(r.len(), 4);
        assert_eq!(r[&NativeIndex(3)].connections()[0].partner, NativeIndex(0));
        assert!(chain(1, 1.0, 0.0).is_empty());
    }

    #[test]
    fn shuffled_map_is_deterministic_permutation() {
        let a = shuffled_map(MapVersion(0), 50, 7);
        let b = shuffled_map(MapVersion(0), 50, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert!(a.iter().any(|(n, d)| n.0 != d.0));
    }

    #[test]
    fn ghosted_vector_has_slots() {
        let v = ghosted_vector(2, MapVersion(1), 0..3, &[7, 9]);
        assert_eq!(v.node_count(), 5);
        assert_eq!(owned_total(&v), vec![0.0, 0.0]);
    }
}
