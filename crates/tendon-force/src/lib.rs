//! Spring force computation for Tendon.
//!
//! Each hierarchy level's spring connectivity is flattened once into a
//! [`LevelForceData`], with parallel per-connection arrays and a sparse
//! [`DisplacementOperator`]. [`SpringForceGen`] then evaluates every
//! connection's kernel from the current node positions and accumulates the
//! resulting forces.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod level;

pub use config::{ForceGenConfig, Reaction};
pub use engine::{compute_level_forces, ForceSummary, SpringForceGen};
pub use level::{
    ConnectionView, DisplacementOperator, InitMode, LevelDescriptor, LevelForceData,
    LevelSprings, LevelSummary,
};
