//! Spring force kernels and the kernel registry for Tendon.
//!
//! The [`SpringKernel`] trait is the extension point for user-defined force
//! laws. Kernels are registered under small integer [`KernelId`]s in a
//! caller-owned [`KernelRegistry`]; id 0 always holds [`LinearSpring`].
//!
//! [`KernelId`]: tendon_core::KernelId

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod kernel;
pub mod registry;

pub use kernel::{FnKernel, LinearSpring, SpringInput, SpringKernel};
pub use registry::{KernelEntry, KernelOptions, KernelRegistry};
