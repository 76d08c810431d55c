//! Per-level spring connectivity.
//!
//! [`LevelForceData`] is built once per hierarchy level from the springs
//! owned by that level's local nodes and the index map valid at build time.
//! It stores one entry per connection in parallel arrays, plus a
//! [`DisplacementOperator`] that computes every connection's displacement
//! in one sweep over the position vector.

use std::ops::Range;

use indexmap::IndexMap;
use tendon_core::{
    ConfigError, DistributedIndex, ForceError, KernelId, LevelNumber, MapVersion, NativeIndex,
    NodeIndexMap, NodeVectorReader, SpringConnection, SpringSpec,
};
use tendon_kernel::KernelRegistry;

use crate::config::Reaction;

/// Springs owned by the local nodes of one level, keyed by master node.
pub type LevelSprings = IndexMap<NativeIndex, SpringSpec>;

/// Whether a level initialization may replace existing data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitMode {
    /// First initialization. Fails if the level is already initialized.
    Fresh,
    /// Rebuild after a regrid or redistribution, replacing existing data.
    Reinitialize,
}

/// One hierarchy level as seen by this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDescriptor {
    /// The level number.
    pub number: LevelNumber,
    /// Distributed indices owned by this process on the level.
    pub owned: Range<DistributedIndex>,
}

impl LevelDescriptor {
    /// Describe level `number` owning the distributed range `owned`.
    pub fn new(number: LevelNumber, owned: Range<DistributedIndex>) -> Self {
        Self { number, owned }
    }

    /// Whether this process owns `index` on the level.
    pub fn owns(&self, index: DistributedIndex) -> bool {
        self.owned.contains(&index)
    }

    /// Number of locally owned nodes.
    pub fn local_nodes(&self) -> usize {
        self.owned.end.0.saturating_sub(self.owned.start.0) as usize
    }
}

// ── DisplacementOperator ───────────────────────────────────────────

/// Sparse operator `D` with one row per connection: `-1` in the master
/// column, `+1` in the slave column, so `D x` yields every connection's
/// `x_slave - x_master` at once.
///
/// Columns are distributed indices, not offsets into the level's owned
/// range. Master columns always fall inside that range; slave columns of
/// remote partners lie outside it and resolve through the position
/// vector's ghost slots.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplacementOperator {
    rows: Vec<[(DistributedIndex, f64); 2]>,
    local_nodes: usize,
}

impl DisplacementOperator {
    fn new(local_nodes: usize, capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            local_nodes,
        }
    }

    fn push_row(&mut self, master: DistributedIndex, slave: DistributedIndex) {
        self.rows.push([(master, -1.0), (slave, 1.0)]);
    }

    /// `(rows, owned nodes)`. The second component counts the level's owned
    /// nodes; it does not bound the column indices returned by
    /// [`row`](Self::row).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.local_nodes)
    }

    /// Stored entries.
    pub fn nnz(&self) -> usize {
        self.rows.len() * 2
    }

    /// Entries of one row as `(column, coefficient)`.
    pub fn row(&self, row: usize) -> Option<&[(DistributedIndex, f64); 2]> {
        self.rows.get(row)
    }

    /// Compute `out = D x` with `dim` components per row.
    ///
    /// Fails with [`ForceError::MissingNode`] if a column has no slot in `x`.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != rows * dim`.
    pub fn apply(
        &self,
        x: &dyn NodeVectorReader,
        dim: usize,
        out: &mut [f64],
    ) -> Result<(), ForceError> {
        assert_eq!(out.len(), self.rows.len() * dim, "output length mismatch");
        out.fill(0.0);
        for (row, entries) in self.rows.iter().enumerate() {
            let dst = &mut out[row * dim..(row + 1) * dim];
            for &(col, coeff) in entries {
                let node = x.node(col).ok_or(ForceError::MissingNode { index: col })?;
                for (o, v) in dst.iter_mut().zip(node) {
                    *o += coeff * v;
                }
            }
        }
        Ok(())
    }
}

// ── LevelForceData ─────────────────────────────────────────────────

/// One connection of a level, gathered from the parallel arrays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionView {
    /// Master endpoint `(native, distributed)`.
    pub master: (NativeIndex, DistributedIndex),
    /// Slave endpoint `(native, distributed)`.
    pub slave: (NativeIndex, DistributedIndex),
    /// Spring constant.
    pub stiffness: f64,
    /// Rest length.
    pub rest_length: f64,
    /// Kernel id.
    pub kernel: KernelId,
}

/// What a level initialization produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSummary {
    /// The level that was initialized.
    pub level: LevelNumber,
    /// Version of the index map the data was built from.
    pub map_version: MapVersion,
    /// Connections stored.
    pub connections: usize,
    /// Stored connections whose slave is not owned locally.
    pub remote_partners: usize,
    /// Exact duplicate connections that were dropped.
    pub duplicates_dropped: usize,
    /// Mirrored connections (B→A alongside A→B) that were dropped.
    pub mirrored_dropped: usize,
}

/// Spring connectivity of one hierarchy level.
///
/// The seven per-connection arrays always have equal length. Distributed
/// indices are valid only under [`map_version`](Self::map_version).
#[derive(Clone, Debug, PartialEq)]
pub struct LevelForceData {
    level: LevelNumber,
    map_version: MapVersion,
    master_native: Vec<NativeIndex>,
    master_distributed: Vec<DistributedIndex>,
    slave_native: Vec<NativeIndex>,
    slave_distributed: Vec<DistributedIndex>,
    stiffness: Vec<f64>,
    rest_length: Vec<f64>,
    kernel: Vec<KernelId>,
    displacement: DisplacementOperator,
    initialized: bool,
}

/// Dedup key: endpoints, bit patterns of the parameters, kernel.
type ConnectionKey = (NativeIndex, NativeIndex, u64, u64, KernelId);

impl LevelForceData {
    /// Build the level's connectivity.
    ///
    /// Masters are visited in ascending native index, partners in their
    /// [`SpringSpec`] order. Every master must be mapped and owned on
    /// `level`; every partner must be mapped; every kernel id must be
    /// registered.
    pub fn build(
        level: &LevelDescriptor,
        map: &NodeIndexMap,
        springs: &LevelSprings,
        registry: &KernelRegistry,
        reaction: Reaction,
    ) -> Result<(Self, LevelSummary), ConfigError> {
        let mut masters: Vec<NativeIndex> = springs.keys().copied().collect();
        masters.sort_unstable();

        let capacity: usize = springs.values().map(SpringSpec::len).sum();
        let mut data = Self {
            level: level.number,
            map_version: map.version(),
            master_native: Vec::with_capacity(capacity),
            master_distributed: Vec::with_capacity(capacity),
            slave_native: Vec::with_capacity(capacity),
            slave_distributed: Vec::with_capacity(capacity),
            stiffness: Vec::with_capacity(capacity),
            rest_length: Vec::with_capacity(capacity),
            kernel: Vec::with_capacity(capacity),
            displacement: DisplacementOperator::new(level.local_nodes(), capacity),
            initialized: false,
        };
        let mut summary = LevelSummary {
            level: level.number,
            map_version: map.version(),
            connections: 0,
            remote_partners: 0,
            duplicates_dropped: 0,
            mirrored_dropped: 0,
        };

        // key → master that first listed it
        let mut seen: IndexMap<ConnectionKey, NativeIndex> = IndexMap::with_capacity(capacity);

        for master in masters {
            let master_d = map
                .distributed(master)
                .ok_or(ConfigError::UnmappedNode { node: master })?;
            if !level.owns(master_d) {
                return Err(ConfigError::MasterNotLocal {
                    node: master,
                    distributed: master_d,
                    level: level.number,
                });
            }

            let Some(spec) = springs.get(&master) else {
                continue;
            };
            for conn in spec.connections() {
                validate_connection(master, conn, registry)?;
                let slave_d = map
                    .distributed(conn.partner)
                    .ok_or(ConfigError::UnmappedNode { node: conn.partner })?;

                let key = connection_key(master, conn, reaction);
                if let Some(&first) = seen.get(&key) {
                    if first == master {
                        summary.duplicates_dropped += 1;
                    } else {
                        summary.mirrored_dropped += 1;
                    }
                    continue;
                }
                seen.insert(key, master);

                if !level.owns(slave_d) {
                    summary.remote_partners += 1;
                }
                data.master_native.push(master);
                data.master_distributed.push(master_d);
                data.slave_native.push(conn.partner);
                data.slave_distributed.push(slave_d);
                data.stiffness.push(conn.stiffness);
                data.rest_length.push(conn.rest_length);
                data.kernel.push(conn.kernel);
                data.displacement.push_row(master_d, slave_d);
            }
        }

        data.initialized = true;
        summary.connections = data.len();
        Ok((data, summary))
    }

    /// The level this data describes.
    pub fn level(&self) -> LevelNumber {
        self.level
    }

    /// Version of the index map the distributed indices come from.
    pub fn map_version(&self) -> MapVersion {
        self.map_version
    }

    /// Whether the data may be used for force computation.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_uninitialized(&mut self) {
        self.initialized = false;
    }

    /// Number of connections.
    pub fn len(&self) -> usize {
        self.kernel.len()
    }

    /// Whether the level has no connections.
    pub fn is_empty(&self) -> bool {
        self.kernel.is_empty()
    }

    /// Master native indices, one per connection.
    pub fn master_native(&self) -> &[NativeIndex] {
        &self.master_native
    }

    /// Master distributed indices, one per connection.
    pub fn master_distributed(&self) -> &[DistributedIndex] {
        &self.master_distributed
    }

    /// Slave native indices, one per connection.
    pub fn slave_native(&self) -> &[NativeIndex] {
        &self.slave_native
    }

    /// Slave distributed indices, one per connection.
    pub fn slave_distributed(&self) -> &[DistributedIndex] {
        &self.slave_distributed
    }

    /// Spring constants, one per connection.
    pub fn stiffness(&self) -> &[f64] {
        &self.stiffness
    }

    /// Rest lengths, one per connection.
    pub fn rest_length(&self) -> &[f64] {
        &self.rest_length
    }

    /// Kernel ids, one per connection.
    pub fn kernel(&self) -> &[KernelId] {
        &self.kernel
    }

    /// The batched displacement operator.
    pub fn displacement(&self) -> &DisplacementOperator {
        &self.displacement
    }

    /// Gather connection `i`.
    pub fn connection(&self, i: usize) -> Option<ConnectionView> {
        if i >= self.len() {
            return None;
        }
        Some(ConnectionView {
            master: (self.master_native[i], self.master_distributed[i]),
            slave: (self.slave_native[i], self.slave_distributed[i]),
            stiffness: self.stiffness[i],
            rest_length: self.rest_length[i],
            kernel: self.kernel[i],
        })
    }

    /// Iterate all connections in stored order.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionView> + '_ {
        (0..self.len()).filter_map(move |i| self.connection(i))
    }
}

fn validate_connection(
    master: NativeIndex,
    conn: &SpringConnection,
    registry: &KernelRegistry,
) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSpring {
        master,
        partner: conn.partner,
        reason,
    };
    if conn.partner == master {
        return Err(invalid("spring connects a node to itself".into()));
    }
    if !conn.stiffness.is_finite() {
        return Err(invalid(format!("stiffness {} is not finite", conn.stiffness)));
    }
    if !conn.rest_length.is_finite() || conn.rest_length < 0.0 {
        return Err(invalid(format!(
            "rest length {} must be finite and non-negative",
            conn.rest_length
        )));
    }
    if !registry.contains(conn.kernel) {
        return Err(ConfigError::UnregisteredKernel { id: conn.kernel });
    }
    Ok(())
}

fn connection_key(
    master: NativeIndex,
    conn: &SpringConnection,
    reaction: Reaction,
) -> ConnectionKey {
    let (a, b) = match reaction {
        Reaction::Symmetric if conn.partner < master => (conn.partner, master),
        _ => (master, conn.partner),
    };
    (
        a,
        b,
        conn.stiffness.to_bits(),
        conn.rest_length.to_bits(),
        conn.kernel,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn n(i: u32) -> NativeIndex {
        NativeIndex(i)
    }

    fn d(i: u32) -> DistributedIndex {
        DistributedIndex(i)
    }

    fn springs(entries: &[(u32, &[SpringConnection])]) -> LevelSprings {
        entries
            .iter()
            .map(|&(m, conns)| (n(m), conns.iter().copied().collect()))
            .collect()
    }

    fn all_local(count: u32) -> LevelDescriptor {
        LevelDescriptor::new(LevelNumber(0), d(0)..d(count))
    }

    #[test]
    fn parallel_arrays_have_equal_length() {
        let map = NodeIndexMap::identity(MapVersion(1), 4);
        let s = springs(&[
            (0, &[SpringConnection::linear(n(1), 1.0, 0.0)]),
            (2, &[
                SpringConnection::linear(n(3), 2.0, 0.5),
                SpringConnection::linear(n(1), 3.0, 0.5),
            ]),
        ]);
        let (data, summary) =
            LevelForceData::build(&all_local(4), &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap();

        assert_eq!(summary.connections, 3);
        for len in [
            data.master_native().len(),
            data.master_distributed().len(),
            data.slave_native().len(),
            data.slave_distributed().len(),
            data.stiffness().len(),
            data.rest_length().len(),
            data.kernel().len(),
        ] {
            assert_eq!(len, 3);
        }
        assert_eq!(data.displacement().shape(), (3, 4));
        assert_eq!(data.displacement().nnz(), 6);
        assert!(data.is_initialized());
    }

    #[test]
    fn masters_sorted_partners_in_spec_order() {
        let map = NodeIndexMap::identity(MapVersion(0), 5);
        let s = springs(&[
            (3, &[SpringConnection::linear(n(4), 1.0, 0.0)]),
            (1, &[
                SpringConnection::linear(n(4), 1.0, 0.0),
                SpringConnection::linear(n(0), 1.0, 0.0),
            ]),
        ]);
        let (data, _) =
            LevelForceData::build(&all_local(5), &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap();
        assert_eq!(data.master_native(), &[n(1), n(1), n(3)]);
        assert_eq!(data.slave_native(), &[n(4), n(0), n(4)]);
    }

    #[test]
    fn distributed_indices_follow_the_map() {
        let map = NodeIndexMap::from_pairs(
            MapVersion(7),
            [(n(10), d(1)), (n(20), d(0)), (n(30), d(5))],
        )
        .unwrap();
        let level = LevelDescriptor::new(LevelNumber(2), d(0)..d(2));
        let s = springs(&[(10, &[SpringConnection::linear(n(30), 1.0, 0.0)])]);
        let (data, summary) =
            LevelForceData::build(&level, &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap();

        let c = data.connection(0).unwrap();
        assert_eq!(c.master, (n(10), d(1)));
        assert_eq!(c.slave, (n(30), d(5)));
        assert_eq!(summary.remote_partners, 1);
        assert_eq!(data.map_version(), MapVersion(7));
        assert_eq!(data.level(), LevelNumber(2));
    }

    #[test]
    fn unmapped_partner_rejected() {
        let map = NodeIndexMap::identity(MapVersion(0), 2);
        let s = springs(&[(0, &[SpringConnection::linear(n(9), 1.0, 0.0)])]);
        let err =
            LevelForceData::build(&all_local(2), &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap_err();
        assert_eq!(err, ConfigError::UnmappedNode { node: n(9) });
    }

    #[test]
    fn remote_master_rejected() {
        let map = NodeIndexMap::identity(MapVersion(0), 4);
        let level = LevelDescriptor::new(LevelNumber(1), d(0)..d(2));
        let s = springs(&[(3, &[SpringConnection::linear(n(0), 1.0, 0.0)])]);
        let err = LevelForceData::build(&level, &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MasterNotLocal { node, .. } if node == n(3)));
    }

    #[test]
    fn unregistered_kernel_rejected_at_build() {
        let map = NodeIndexMap::identity(MapVersion(0), 2);
        let conn = SpringConnection {
            partner: n(1),
            stiffness: 1.0,
            rest_length: 0.0,
            kernel: KernelId(42),
        };
        let s = springs(&[(0, &[conn])]);
        let err =
            LevelForceData::build(&all_local(2), &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap_err();
        assert_eq!(err, ConfigError::UnregisteredKernel { id: KernelId(42) });
    }

    #[test]
    fn invalid_parameters_rejected() {
        let map = NodeIndexMap::identity(MapVersion(0), 2);
        let registry = KernelRegistry::new();
        for conn in [
            SpringConnection::linear(n(0), 1.0, 0.0),
            SpringConnection::linear(n(1), f64::NAN, 0.0),
            SpringConnection::linear(n(1), 1.0, -0.5),
            SpringConnection::linear(n(1), 1.0, f64::INFINITY),
        ] {
            let s = springs(&[(0, &[conn])]);
            let err = LevelForceData::build(&all_local(2), &map, &s, &registry, Reaction::Symmetric)
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSpring { .. }), "{conn:?}");
        }
    }

    #[test]
    fn exact_duplicates_dropped() {
        let map = NodeIndexMap::identity(MapVersion(0), 2);
        let c = SpringConnection::linear(n(1), 1.0, 0.25);
        let s = springs(&[(0, &[c, c])]);
        let (data, summary) =
            LevelForceData::build(&all_local(2), &map, &s, &KernelRegistry::new(), Reaction::MasterOnly)
                .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(summary.duplicates_dropped, 1);
    }

    #[test]
    fn mirrored_connections_dropped_only_when_symmetric() {
        let map = NodeIndexMap::identity(MapVersion(0), 2);
        let s = springs(&[
            (0, &[SpringConnection::linear(n(1), 1.0, 0.25)]),
            (1, &[SpringConnection::linear(n(0), 1.0, 0.25)]),
        ]);
        let registry = KernelRegistry::new();

        let (sym, sym_summary) =
            LevelForceData::build(&all_local(2), &map, &s, &registry, Reaction::Symmetric).unwrap();
        assert_eq!(sym.len(), 1);
        assert_eq!(sym_summary.mirrored_dropped, 1);

        let (one_sided, summary) =
            LevelForceData::build(&all_local(2), &map, &s, &registry, Reaction::MasterOnly).unwrap();
        assert_eq!(one_sided.len(), 2);
        assert_eq!(summary.mirrored_dropped, 0);
    }

    #[test]
    fn mirrored_with_different_stiffness_kept() {
        let map = NodeIndexMap::identity(MapVersion(0), 2);
        let s = springs(&[
            (0, &[SpringConnection::linear(n(1), 1.0, 0.0)]),
            (1, &[SpringConnection::linear(n(0), 2.0, 0.0)]),
        ]);
        let (data, _) =
            LevelForceData::build(&all_local(2), &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn operator_computes_slave_minus_master() {
        use tendon_core::NodeVector;

        let map = NodeIndexMap::identity(MapVersion(0), 3);
        let s = springs(&[(0, &[
            SpringConnection::linear(n(1), 1.0, 0.0),
            SpringConnection::linear(n(2), 1.0, 0.0),
        ])]);
        let (data, _) =
            LevelForceData::build(&all_local(3), &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap();

        let mut x = NodeVector::new(2, MapVersion(0), d(0)..d(3)).unwrap();
        x.set(d(0), &[1.0, 1.0]);
        x.set(d(1), &[4.0, 5.0]);
        x.set(d(2), &[0.0, -1.0]);

        let mut out = vec![0.0; 4];
        data.displacement().apply(&x, 2, &mut out).unwrap();
        assert_eq!(out, vec![3.0, 4.0, -1.0, -2.0]);
    }

    #[test]
    fn operator_columns_are_distributed_indices() {
        let map = NodeIndexMap::from_pairs(
            MapVersion(0),
            [(n(0), d(4)), (n(1), d(5)), (n(2), d(7))],
        )
        .unwrap();
        let level = LevelDescriptor::new(LevelNumber(0), d(4)..d(6));
        let s = springs(&[(1, &[SpringConnection::linear(n(2), 1.0, 0.0)])]);
        let (data, summary) =
            LevelForceData::build(&level, &map, &s, &KernelRegistry::new(), Reaction::Symmetric)
                .unwrap();

        let op = data.displacement();
        assert_eq!(op.shape(), (1, 2));
        assert_eq!(summary.remote_partners, 1);
        let row = op.row(0).unwrap();
        assert_eq!(row, &[(d(5), -1.0), (d(7), 1.0)]);
        assert!(row.iter().all(|&(col, _)| col.0 as usize >= op.shape().1));
        assert!(level.owns(row[0].0));
        assert!(!level.owns(row[1].0));
    }

    proptest! {
        #[test]
        fn distributed_indices_resolve_uniquely(
            count in 2u32..24,
            rotate in 0u32..24,
            edges in prop::collection::vec((0u32..24, 0u32..24), 0..40),
        ) {
            let map = NodeIndexMap::from_pairs(
                MapVersion(3),
                (0..count).map(|i| (n(i), d((i + rotate) % count))),
            ).unwrap();
            let level = LevelDescriptor::new(LevelNumber(0), d(0)..d(count));

            let mut s = LevelSprings::new();
            for (a, b) in edges {
                let (a, b) = (a % count, b % count);
                if a != b {
                    s.entry(n(a)).or_default().push(SpringConnection::linear(n(b), 1.0, 0.0));
                }
            }

            let (data, _) = LevelForceData::build(
                &level, &map, &s, &KernelRegistry::new(), Reaction::Symmetric,
            ).unwrap();

            for c in data.connections() {
                prop_assert_eq!(map.native(c.master.1), Some(c.master.0));
                prop_assert_eq!(map.native(c.slave.1), Some(c.slave.0));
            }
        }
    }
}
