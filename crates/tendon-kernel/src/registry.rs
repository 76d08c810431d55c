//! The kernel registry: kernel id → [`SpringKernel`].
//!
//! A [`KernelRegistry`] is owned by the caller, populated during setup, and
//! then handed to the force engine behind an `Arc`, after which it can no
//! longer be mutated.

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use tendon_core::{ConfigError, KernelId};
use tracing::debug;

use crate::kernel::{LinearSpring, SpringKernel};

/// Per-kernel parameters supplied at registration, option name → value.
pub type KernelOptions = IndexMap<String, f64>;

/// A registered kernel together with its registration options.
#[derive(Clone)]
pub struct KernelEntry {
    kernel: Arc<dyn SpringKernel>,
    options: KernelOptions,
}

impl KernelEntry {
    /// The kernel itself.
    pub fn kernel(&self) -> &Arc<dyn SpringKernel> {
        &self.kernel
    }

    /// Options passed to every evaluation of this kernel.
    pub fn options(&self) -> &KernelOptions {
        &self.options
    }

    fn same_as(&self, kernel: &Arc<dyn SpringKernel>, options: &KernelOptions) -> bool {
        same_kernel(&self.kernel, kernel) && self.options == *options
    }
}

/// The same allocation, or two instances of one stateless kernel type.
fn same_kernel(a: &Arc<dyn SpringKernel>, b: &Arc<dyn SpringKernel>) -> bool {
    if std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)) {
        return true;
    }
    if std::mem::size_of_val(&**a) != 0 || std::mem::size_of_val(&**b) != 0 {
        return false;
    }
    let a: &dyn Any = &**a;
    let b: &dyn Any = &**b;
    <dyn Any>::type_id(a) == <dyn Any>::type_id(b)
}

impl std::fmt::Debug for KernelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelEntry")
            .field("kernel", &self.kernel.name())
            .field("options", &self.options)
            .finish()
    }
}

/// Table of spring kernels keyed by [`KernelId`].
///
/// A new registry always contains [`LinearSpring`] under
/// [`KernelId::DEFAULT`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tendon_core::KernelId;
/// use tendon_kernel::{KernelOptions, KernelRegistry, LinearSpring};
///
/// let mut registry = KernelRegistry::new();
/// let mut options = KernelOptions::new();
/// options.insert("damping".into(), 0.25);
/// registry
///     .register_with_options(KernelId(4), Arc::new(LinearSpring), options)
///     .unwrap();
///
/// assert_eq!(registry.ids(), vec![KernelId(0), KernelId(4)]);
/// assert_eq!(registry.entry(KernelId(4)).unwrap().options()["damping"], 0.25);
/// ```
#[derive(Debug)]
pub struct KernelRegistry {
    entries: IndexMap<KernelId, KernelEntry>,
}

impl KernelRegistry {
    /// Create a registry holding only the default linear spring.
    pub fn new() -> Self {
        let mut entries = IndexMap::new();
        entries.insert(
            KernelId::DEFAULT,
            KernelEntry {
                kernel: Arc::new(LinearSpring),
                options: KernelOptions::new(),
            },
        );
        Self { entries }
    }

    /// Register `kernel` under `id` with no options.
    ///
    /// Registering an identical kernel again under the same id is a no-op:
    /// the same `Arc`, or another instance of the same stateless (zero-sized)
    /// kernel type. Any other kernel for an already-bound id is a
    /// [`ConfigError::KernelConflict`].
    pub fn register(
        &mut self,
        id: KernelId,
        kernel: Arc<dyn SpringKernel>,
    ) -> Result<(), ConfigError> {
        self.register_with_options(id, kernel, KernelOptions::new())
    }

    /// Register `kernel` under `id`, passing `options` to every evaluation.
    ///
    /// Re-registration is a no-op only if both the kernel and the options are
    /// identical.
    pub fn register_with_options(
        &mut self,
        id: KernelId,
        kernel: Arc<dyn SpringKernel>,
        options: KernelOptions,
    ) -> Result<(), ConfigError> {
        if let Some(existing) = self.entries.get(&id) {
            if existing.same_as(&kernel, &options) {
                return Ok(());
            }
            return Err(ConfigError::KernelConflict {
                id,
                existing: existing.kernel.name().to_string(),
                rejected: kernel.name().to_string(),
            });
        }

        debug!(kernel = %id, name = kernel.name(), "registered spring kernel");
        self.entries.insert(id, KernelEntry { kernel, options });
        Ok(())
    }

    /// The kernel registered under `id`.
    pub fn lookup(&self, id: KernelId) -> Result<&Arc<dyn SpringKernel>, ConfigError> {
        self.entry(id).map(KernelEntry::kernel)
    }

    /// The full entry (kernel and options) registered under `id`.
    pub fn entry(&self, id: KernelId) -> Result<&KernelEntry, ConfigError> {
        self.entries
            .get(&id)
            .ok_or(ConfigError::UnregisteredKernel { id })
    }

    /// Whether `id` is bound.
    pub fn contains(&self, id: KernelId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered kernels, including the default.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the default kernel is never removed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<KernelId> {
        let mut ids: Vec<KernelId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
