//! Tendon: spring forces for immersed structures on adaptive mesh hierarchies.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Tendon sub-crates. For most users, adding `tendon` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tendon::prelude::*;
//!
//! // A custom kernel: a linear spring that only pulls, never pushes.
//! struct CableKernel;
//! impl SpringKernel for CableKernel {
//!     fn name(&self) -> &str { "cable" }
//!     fn force(&self, input: &SpringInput<'_>, out: &mut [f64]) {
//!         let r = input.displacement.iter().map(|d| d * d).sum::<f64>().sqrt();
//!         let scale = if r > input.rest_length {
//!             input.stiffness * (1.0 - input.rest_length / r)
//!         } else {
//!             0.0
//!         };
//!         for (f, d) in out.iter_mut().zip(input.displacement) {
//!             *f = scale * d;
//!         }
//!     }
//! }
//!
//! let mut registry = KernelRegistry::new();
//! registry.register(KernelId(1), Arc::new(CableKernel)).unwrap();
//! let mut engine = SpringForceGen::new(ForceGenConfig::with_dim(2), Arc::new(registry)).unwrap();
//!
//! // Node 0 holds a cable of rest length 2 to node 1.
//! let mut springs = LevelSprings::new();
//! springs.insert(
//!     NativeIndex(0),
//!     [SpringConnection { partner: NativeIndex(1), stiffness: 1.0, rest_length: 2.0, kernel: KernelId(1) }]
//!         .into_iter()
//!         .collect(),
//! );
//! let map = NodeIndexMap::identity(MapVersion(0), 2);
//! let level = LevelDescriptor::new(LevelNumber(0), DistributedIndex(0)..DistributedIndex(2));
//! engine.initialize_level(&level, &map, &springs, 0.0, true, InitMode::Fresh).unwrap();
//!
//! // Slack cable: no force.
//! let mut x = NodeVector::new(2, MapVersion(0), level.owned.clone()).unwrap();
//! x.set(DistributedIndex(1), &[1.0, 0.0]);
//! let mut f = NodeVector::new(2, MapVersion(0), level.owned.clone()).unwrap();
//! engine.compute_forces(LevelNumber(0), &x, &mut f, 0.0, true).unwrap();
//! assert_eq!(f.as_slice(), &[0.0, 0.0, 0.0, 0.0]);
//!
//! // Taut cable: pulls the ends together.
//! x.set(DistributedIndex(1), &[4.0, 0.0]);
//! engine.compute_forces(LevelNumber(0), &x, &mut f, 0.1, false).unwrap();
//! assert_eq!(f.as_slice(), &[2.0, 0.0, -2.0, 0.0]);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tendon-core` | IDs, index maps, node vectors, `SpringSpec`, errors |
//! | [`kernel`] | `tendon-kernel` | `SpringKernel` trait, default linear spring, registry |
//! | [`force`] | `tendon-force` | Level data, displacement operator, force generator |
//! | [`stash`] | `tendon-stash` | Migration wire format and factories |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, IDs, and errors (`tendon-core`).
///
/// Contains the versioned [`types::NodeIndexMap`], the
/// [`types::NodeVectorReader`]/[`types::NodeVectorWriter`] storage seam, and
/// the [`types::SpringSpec`] record.
pub use tendon_core as types;

/// Spring kernels and their registry (`tendon-kernel`).
///
/// The [`kernel::SpringKernel`] trait is the extension point for
/// user-defined force laws.
pub use tendon_kernel as kernel;

/// Per-level spring data and force computation (`tendon-force`).
///
/// [`force::SpringForceGen`] drives initialization and computation per level.
pub use tendon_force as force;

/// Migration records (`tendon-stash`).
///
/// Pack with [`stash::pack`], rebuild with [`stash::SpringSpecFactory`].
pub use tendon_stash as stash;

/// Common imports for typical Tendon usage.
///
/// ```rust
/// use tendon::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tendon_core::{
        DistributedIndex, KernelId, LevelNumber, MapVersion, NativeIndex, NodeIndexMap,
        NodeVector, NodeVectorReader, NodeVectorWriter, SpringConnection, SpringSpec,
        StashTypeId,
    };

    // Errors
    pub use tendon_core::{ConfigError, ForceError, StashError};

    // Kernels
    pub use tendon_kernel::{KernelOptions, KernelRegistry, LinearSpring, SpringInput, SpringKernel};

    // Force generation
    pub use tendon_force::{
        ForceGenConfig, InitMode, LevelDescriptor, LevelSprings, Reaction, SpringForceGen,
    };

    // Migration
    pub use tendon_stash::{SpringSpecFactory, StashTypeRegistry, Stashable};
}
