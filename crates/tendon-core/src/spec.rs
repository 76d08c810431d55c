//! Per-node spring connection records.

use smallvec::SmallVec;

use crate::id::{KernelId, NativeIndex};

/// One spring from the owning (master) node to a partner (slave) node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConnection {
    /// Native index of the partner node.
    pub partner: NativeIndex,
    /// Spring constant.
    pub stiffness: f64,
    /// Length at which the spring exerts no force.
    pub rest_length: f64,
    /// Kernel that turns displacement into force.
    pub kernel: KernelId,
}

impl SpringConnection {
    /// A connection evaluated by the default linear-spring kernel.
    pub fn linear(partner: NativeIndex, stiffness: f64, rest_length: f64) -> Self {
        Self {
            partner,
            stiffness,
            rest_length,
            kernel: KernelId::DEFAULT,
        }
    }
}

/// The ordered spring connections owned by one node.
///
/// Travels with the node when it migrates to another process; see the
/// `tendon-stash` crate for the wire format.
///
/// # Examples
///
/// ```
/// use tendon_core::{KernelId, NativeIndex, SpringConnection, SpringSpec};
///
/// let mut spec = SpringSpec::new();
/// spec.push(SpringConnection::linear(NativeIndex(1), 2.0, 0.5));
/// spec.push(SpringConnection {
///     partner: NativeIndex(7),
///     stiffness: 1.0,
///     rest_length: 0.0,
///     kernel: KernelId(3),
/// });
///
/// assert_eq!(spec.len(), 2);
/// assert_eq!(spec.connections()[1].kernel, KernelId(3));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpringSpec {
    connections: SmallVec<[SpringConnection; 4]>,
}

impl SpringSpec {
    /// An empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connection, keeping insertion order.
    pub fn push(&mut self, connection: SpringConnection) {
        self.connections.push(connection);
    }

    /// The connections in order.
    pub fn connections(&self) -> &[SpringConnection] {
        &self.connections
    }

    /// Number of connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the spec has no connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl FromIterator<SpringConnection> for SpringSpec {
    fn from_iter<I: IntoIterator<Item = SpringConnection>>(iter: I) -> Self {
        Self {
            connections: iter.into_iter().collect(),
        }
    }
}

impl Extend<SpringConnection> for SpringSpec {
    fn extend<I: IntoIterator<Item = SpringConnection>>(&mut self, iter: I) {
        self.connections.extend(iter);
    }
}
