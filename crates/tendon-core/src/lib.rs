//! Core types for the Tendon spring force core.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! vocabulary shared by the rest of the workspace: node, level, kernel and
//! stash identifiers, the versioned native↔distributed [`NodeIndexMap`],
//! the [`NodeVectorReader`]/[`NodeVectorWriter`] storage seam, the per-node
//! [`SpringSpec`] record, and the error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod index_map;
pub mod spec;
pub mod vector;

pub use error::{ConfigError, ForceError, StashError};
pub use id::{DistributedIndex, KernelId, LevelNumber, MapVersion, NativeIndex, StashTypeId};
pub use index_map::NodeIndexMap;
pub use spec::{SpringConnection, SpringSpec};
pub use vector::{NodeVector, NodeVectorReader, NodeVectorWriter};
