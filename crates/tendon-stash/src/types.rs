//! Assignment of stash type ids to record kinds.

use indexmap::IndexMap;
use tendon_core::StashTypeId;
use tracing::debug;

/// Hands out a unique [`StashTypeId`] per record kind.
///
/// Owned by the application context and consulted while wiring up
/// factories; ids are assigned sequentially from zero in registration order.
///
/// # Examples
///
/// ```
/// use tendon_core::StashTypeId;
/// use tendon_stash::StashTypeRegistry;
///
/// let mut types = StashTypeRegistry::new();
/// let springs = types.register("spring_spec");
/// let beams = types.register("beam_spec");
/// assert_eq!((springs, beams), (StashTypeId(0), StashTypeId(1)));
/// assert_eq!(types.register("spring_spec"), springs);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StashTypeRegistry {
    ids: IndexMap<String, StashTypeId>,
}

impl StashTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id for `name`, assigning the next free one on first use.
    pub fn register(&mut self, name: &str) -> StashTypeId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = StashTypeId(self.ids.len() as u32);
        self.ids.insert(name.to_string(), id);
        debug!(name, type_id = %id, "assigned stash type id");
        id
    }

    /// The id already assigned to `name`.
    pub fn get(&self, name: &str) -> Option<StashTypeId> {
        self.ids.get(name).copied()
    }

    /// The name registered under `id`.
    pub fn name(&self, id: StashTypeId) -> Option<&str> {
        self.ids
            .get_index(id.0 as usize)
            .map(|(name, _)| name.as_str())
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no kind has been registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
