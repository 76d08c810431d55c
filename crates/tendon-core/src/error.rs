//! Error types for the Tendon spring force core.
//!
//! Organized by subsystem: setup and integration ([`ConfigError`]),
//! migration streams ([`StashError`]), and per-level force computation
//! ([`ForceError`]). All of them signal bugs in the caller's setup or
//! corrupt input; none are retried.

use std::error::Error;
use std::fmt;
use std::io;

use crate::id::{DistributedIndex, KernelId, LevelNumber, MapVersion, NativeIndex, StashTypeId};

/// Setup and integration errors.
///
/// Raised while registering kernels, building level data, or configuring
/// factories. Always fatal.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A connection or lookup referenced a kernel id that was never registered.
    UnregisteredKernel {
        /// The unknown kernel id.
        id: KernelId,
    },
    /// A kernel id is already bound to a different kernel.
    KernelConflict {
        /// The contested kernel id.
        id: KernelId,
        /// Name of the kernel already registered under `id`.
        existing: String,
        /// Name of the kernel that was rejected.
        rejected: String,
    },
    /// A level was initialized again without requesting re-initialization.
    LevelAlreadyInitialized {
        /// The level in question.
        level: LevelNumber,
    },
    /// A node referenced by a spring has no entry in the index map.
    UnmappedNode {
        /// The unmapped node.
        node: NativeIndex,
    },
    /// A spring's master node is not owned by this process on the level.
    MasterNotLocal {
        /// The master node.
        node: NativeIndex,
        /// Its distributed index under the supplied map.
        distributed: DistributedIndex,
        /// The level being initialized.
        level: LevelNumber,
    },
    /// A spring connection carries unusable parameters.
    InvalidSpring {
        /// Master node of the offending connection.
        master: NativeIndex,
        /// Partner node of the offending connection.
        partner: NativeIndex,
        /// Description of what is wrong.
        reason: String,
    },
    /// The native↔distributed map is not one-to-one.
    NonBijectiveMap {
        /// Description of the duplicate mapping.
        reason: String,
    },
    /// A factory was assigned a second, different stash type id.
    StashTypeConflict {
        /// The id already assigned.
        existing: StashTypeId,
        /// The id that was rejected.
        requested: StashTypeId,
    },
    /// A configuration value is outside its valid range.
    InvalidValue {
        /// Description of the invalid value.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnregisteredKernel { id } => write!(f, "kernel id {id} is not registered"),
            Self::KernelConflict {
                id,
                existing,
                rejected,
            } => write!(
                f,
                "kernel id {id} already bound to '{existing}', cannot bind '{rejected}'"
            ),
            Self::LevelAlreadyInitialized { level } => write!(
                f,
                "level {level} is already initialized; request re-initialization explicitly"
            ),
            Self::UnmappedNode { node } => {
                write!(f, "node {node} has no entry in the index map")
            }
            Self::MasterNotLocal {
                node,
                distributed,
                level,
            } => write!(
                f,
                "master node {node} (distributed {distributed}) is not owned on level {level}"
            ),
            Self::InvalidSpring {
                master,
                partner,
                reason,
            } => write!(f, "invalid spring {master}->{partner}: {reason}"),
            Self::NonBijectiveMap { reason } => write!(f, "index map is not bijective: {reason}"),
            Self::StashTypeConflict {
                existing,
                requested,
            } => write!(
                f,
                "stash type id already set to {existing}, cannot change to {requested}"
            ),
            Self::InvalidValue { reason } => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Errors from decoding a migration stream.
///
/// Fatal to the single unpack call; the caller decides whether to abort
/// the migration batch or skip the record.
#[derive(Debug)]
pub enum StashError {
    /// The record's type tag does not match the factory's type id.
    TypeMismatch {
        /// The id the factory is configured with.
        expected: StashTypeId,
        /// The tag found in the stream.
        found: StashTypeId,
    },
    /// The stream ended in the middle of a record.
    Truncated {
        /// Which part of the record was being read.
        context: &'static str,
    },
    /// A partner index moved outside the native index range after offsetting.
    IndexOutOfRange {
        /// The index as stored in the stream.
        stored: NativeIndex,
        /// The offset that was applied.
        offset: i64,
    },
    /// The factory has no stash type id yet.
    Unconfigured,
    /// An I/O error other than end-of-stream.
    Io(io::Error),
}

impl fmt::Display for StashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "stash type mismatch: expected {expected}, found {found}")
            }
            Self::Truncated { context } => write!(f, "truncated record while reading {context}"),
            Self::IndexOutOfRange { stored, offset } => write!(
                f,
                "partner index {stored} with offset {offset} is out of range"
            ),
            Self::Unconfigured => write!(f, "factory has no stash type id"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl Error for StashError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StashError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors from computing forces on one level.
///
/// Every variant aborts the step; no partial forces are accumulated.
#[derive(Clone, Debug, PartialEq)]
pub enum ForceError {
    /// A setup error surfaced during computation.
    Config(ConfigError),
    /// Forces were requested for a level that has no initialized data.
    LevelNotInitialized {
        /// The level in question.
        level: LevelNumber,
    },
    /// A node vector was laid out under a different numbering than the level data.
    StaleIndexMap {
        /// The level in question.
        level: LevelNumber,
        /// Version the level data was built from.
        built: MapVersion,
        /// Version of the vector that was supplied.
        supplied: MapVersion,
    },
    /// A node vector has the wrong number of components per node.
    DimensionMismatch {
        /// Components per node the engine is configured for.
        expected: usize,
        /// Components per node of the supplied vector.
        found: usize,
    },
    /// A node vector has no local or ghost slot for a distributed index.
    MissingNode {
        /// The unreachable distributed index.
        index: DistributedIndex,
    },
    /// A kernel produced a NaN or infinite force component.
    NonFiniteForce {
        /// Position of the connection in the level's arrays.
        connection: usize,
        /// The kernel that produced it.
        kernel: KernelId,
    },
}

impl fmt::Display for ForceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::LevelNotInitialized { level } => {
                write!(f, "level {level} has not been initialized")
            }
            Self::StaleIndexMap {
                level,
                built,
                supplied,
            } => write!(
                f,
                "level {level} was built from index map v{built}, vector uses v{supplied}"
            ),
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "node vector has {found} components per node, expected {expected}"
            ),
            Self::MissingNode { index } => {
                write!(f, "distributed index {index} has no local or ghost slot")
            }
            Self::NonFiniteForce { connection, kernel } => write!(
                f,
                "kernel {kernel} produced a non-finite force for connection {connection}"
            ),
        }
    }
}

impl Error for ForceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ForceError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
