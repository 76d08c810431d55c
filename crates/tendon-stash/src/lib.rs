//! Migration support for Tendon spring records.
//!
//! When adaptive regridding moves a node to another process, its
//! [`SpringSpec`](tendon_core::SpringSpec) travels as one self-describing
//! binary record (see [`codec`]). The receiving side rebuilds it with a
//! [`SpringSpecFactory`] configured with the type id handed out by a
//! [`StashTypeRegistry`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod factory;
pub mod types;

pub use codec::{pack, packed_len};
pub use factory::{SpringSpecFactory, StashFactory, Stashable};
pub use types::StashTypeRegistry;
