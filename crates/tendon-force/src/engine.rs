//! The spring force generator.
//!
//! [`SpringForceGen`] owns one [`LevelForceData`] per hierarchy level and
//! the shared [`KernelRegistry`]. The hierarchy driver initializes each level
//! once (and again after every regrid), then calls
//! [`compute_forces`](SpringForceGen::compute_forces) once per level per
//! timestep.

use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tendon_core::{
    ConfigError, DistributedIndex, ForceError, LevelNumber, NodeIndexMap, NodeVectorReader,
    NodeVectorWriter,
};
use tendon_kernel::{KernelRegistry, SpringInput};
use tracing::{debug, trace, warn};

use crate::config::{ForceGenConfig, Reaction};
use crate::level::{InitMode, LevelDescriptor, LevelForceData, LevelSprings, LevelSummary};

/// What one force computation did.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceSummary {
    /// The level computed.
    pub level: LevelNumber,
    /// Connections evaluated.
    pub connections: usize,
    /// Largest force magnitude produced by any single connection.
    pub max_force: f64,
}

/// Computes spring forces level by level.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tendon_core::*;
/// use tendon_force::*;
/// use tendon_kernel::KernelRegistry;
///
/// let mut engine = SpringForceGen::new(ForceGenConfig::with_dim(2), Arc::new(KernelRegistry::new()))
///     .unwrap();
///
/// // Two nodes, one spring of stiffness 2 and rest length 1.
/// let map = NodeIndexMap::identity(MapVersion(0), 2);
/// let level = LevelDescriptor::new(LevelNumber(0), DistributedIndex(0)..DistributedIndex(2));
/// let mut springs = LevelSprings::new();
/// springs.insert(NativeIndex(0), [SpringConnection::linear(NativeIndex(1), 2.0, 1.0)].into_iter().collect());
/// engine.initialize_level(&level, &map, &springs, 0.0, true, InitMode::Fresh).unwrap();
///
/// let mut x = NodeVector::new(2, MapVersion(0), level.owned.clone()).unwrap();
/// x.set(DistributedIndex(1), &[3.0, 4.0]);
/// let mut f = NodeVector::new(2, MapVersion(0), level.owned.clone()).unwrap();
///
/// engine.compute_forces(LevelNumber(0), &x, &mut f, 0.0, true).unwrap();
/// let master = f.node(DistributedIndex(0)).unwrap();
/// assert!((master[0] - 4.8).abs() < 1e-12 && (master[1] - 6.4).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct SpringForceGen {
    config: ForceGenConfig,
    registry: Arc<KernelRegistry>,
    levels: IndexMap<LevelNumber, LevelForceData>,
}

impl SpringForceGen {
    /// Create a generator. The registry is frozen from here on.
    pub fn new(config: ForceGenConfig, registry: Arc<KernelRegistry>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            levels: IndexMap::new(),
        })
    }

    /// The generator's configuration.
    pub fn config(&self) -> &ForceGenConfig {
        &self.config
    }

    /// The kernel registry shared with callers.
    pub fn registry(&self) -> &Arc<KernelRegistry> {
        &self.registry
    }

    /// Build the spring connectivity of one level.
    ///
    /// `map` is consulted only during this call. With [`InitMode::Fresh`]
    /// an already-initialized level is a
    /// [`ConfigError::LevelAlreadyInitialized`]; use
    /// [`InitMode::Reinitialize`] after a regrid.
    pub fn initialize_level(
        &mut self,
        level: &LevelDescriptor,
        map: &NodeIndexMap,
        springs: &LevelSprings,
        init_time: f64,
        initial_time: bool,
        mode: InitMode,
    ) -> Result<LevelSummary, ConfigError> {
        if mode == InitMode::Fresh && self.is_initialized(level.number) {
            return Err(ConfigError::LevelAlreadyInitialized {
                level: level.number,
            });
        }

        let (data, summary) =
            LevelForceData::build(level, map, springs, &self.registry, self.config.reaction)?;

        debug!(
            level = %level.number,
            map_version = %summary.map_version,
            connections = summary.connections,
            remote_partners = summary.remote_partners,
            init_time,
            initial_time,
            ?mode,
            "initialized spring level data"
        );
        if summary.duplicates_dropped > 0 || summary.mirrored_dropped > 0 {
            warn!(
                level = %level.number,
                duplicates = summary.duplicates_dropped,
                mirrored = summary.mirrored_dropped,
                "suppressed repeated spring connections"
            );
        }

        self.levels.insert(level.number, data);
        Ok(summary)
    }

    /// Mark a level's data stale, e.g. after a regrid, so it must be
    /// initialized again before forces can be computed.
    ///
    /// Returns `true` if the level was initialized.
    pub fn invalidate_level(&mut self, level: LevelNumber) -> bool {
        match self.levels.get_mut(&level) {
            Some(data) if data.is_initialized() => {
                data.mark_uninitialized();
                debug!(level = %level, "invalidated spring level data");
                true
            }
            _ => false,
        }
    }

    /// Whether `level` has usable data.
    pub fn is_initialized(&self, level: LevelNumber) -> bool {
        self.levels
            .get(&level)
            .is_some_and(LevelForceData::is_initialized)
    }

    /// The data of `level`, initialized or not.
    pub fn level_data(&self, level: LevelNumber) -> Option<&LevelForceData> {
        self.levels.get(&level)
    }

    /// Levels with usable data, in ascending order.
    pub fn initialized_levels(&self) -> Vec<LevelNumber> {
        let mut levels: Vec<LevelNumber> = self
            .levels
            .iter()
            .filter(|(_, data)| data.is_initialized())
            .map(|(&level, _)| level)
            .collect();
        levels.sort_unstable();
        levels
    }

    /// Add the spring forces of `level` to `forces`.
    ///
    /// `positions` must have its ghost slots filled; ghost slots of `forces`
    /// receive contributions that the storage collaborator must reduce
    /// afterwards.
    pub fn compute_forces(
        &self,
        level: LevelNumber,
        positions: &dyn NodeVectorReader,
        forces: &mut dyn NodeVectorWriter,
        time: f64,
        initial_time: bool,
    ) -> Result<ForceSummary, ForceError> {
        let data = self
            .levels
            .get(&level)
            .ok_or(ForceError::LevelNotInitialized { level })?;
        compute_level_forces(
            data,
            &self.registry,
            &self.config,
            positions,
            forces,
            time,
            initial_time,
        )
    }
}

/// Add the spring forces of one level's connections to `forces`.
///
/// Every contribution is computed before any is applied, so on error
/// `forces` is untouched.
pub fn compute_level_forces(
    data: &LevelForceData,
    registry: &KernelRegistry,
    config: &ForceGenConfig,
    positions: &dyn NodeVectorReader,
    forces: &mut dyn NodeVectorWriter,
    time: f64,
    initial_time: bool,
) -> Result<ForceSummary, ForceError> {
    let level = data.level();
    if !data.is_initialized() {
        return Err(ForceError::LevelNotInitialized { level });
    }

    let dim = config.dim;
    for found in [positions.dim(), forces.dim()] {
        if found != dim {
            return Err(ForceError::DimensionMismatch {
                expected: dim,
                found,
            });
        }
    }
    for supplied in [positions.map_version(), forces.map_version()] {
        if supplied != data.map_version() {
            return Err(ForceError::StaleIndexMap {
                level,
                built: data.map_version(),
                supplied,
            });
        }
    }

    let n = data.len();
    let mut displacements = vec![0.0; n * dim];
    data.displacement()
        .apply(positions, dim, &mut displacements)?;

    let mut spring_forces = vec![0.0; n * dim];
    let mut max_force = 0.0f64;
    for i in 0..n {
        let kernel_id = data.kernel()[i];
        let entry = registry.entry(kernel_id)?;
        let input = SpringInput {
            displacement: &displacements[i * dim..(i + 1) * dim],
            stiffness: data.stiffness()[i],
            rest_length: data.rest_length()[i],
            master: data.master_native()[i],
            time,
            initial_time,
            options: entry.options(),
        };
        let out = &mut spring_forces[i * dim..(i + 1) * dim];
        entry.kernel().force(&input, out);

        if config.check_finite && out.iter().any(|v| !v.is_finite()) {
            return Err(ForceError::NonFiniteForce {
                connection: i,
                kernel: kernel_id,
            });
        }
        max_force = max_force.max(out.iter().map(|v| v * v).sum::<f64>().sqrt());
    }

    let symmetric = config.reaction == Reaction::Symmetric;
    let mut targets: SmallVec<[DistributedIndex; 2]> = SmallVec::new();
    for i in 0..n {
        targets.clear();
        targets.push(data.master_distributed()[i]);
        if symmetric {
            targets.push(data.slave_distributed()[i]);
        }
        for &index in &targets {
            if forces.node_mut(index).is_none() {
                return Err(ForceError::MissingNode { index });
            }
        }
    }

    for i in 0..n {
        let f = &spring_forces[i * dim..(i + 1) * dim];
        accumulate(forces, data.master_distributed()[i], f, 1.0)?;
        if symmetric {
            accumulate(forces, data.slave_distributed()[i], f, -1.0)?;
        }
    }

    trace!(level = %level, connections = n, time, initial_time, max_force, "computed spring forces");
    Ok(ForceSummary {
        level,
        connections: n,
        max_force,
    })
}

fn accumulate(
    forces: &mut dyn NodeVectorWriter,
    index: DistributedIndex,
    f: &[f64],
    sign: f64,
) -> Result<(), ForceError> {
    let node = forces
        .node_mut(index)
        .ok_or(ForceError::MissingNode { index })?;
    for (acc, v) in node.iter_mut().zip(f) {
        *acc += sign * v;
    }
    Ok(())
}
