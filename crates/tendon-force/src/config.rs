//! Force generator configuration and validation.

use tendon_core::ConfigError;

// ── Reaction ───────────────────────────────────────────────────────

/// How a connection's force is applied to its two endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reaction {
    /// Add `F` to the master and subtract it from the slave.
    ///
    /// A connection listed from both ends with identical parameters is
    /// processed once.
    #[default]
    Symmetric,

    /// Add `F` to the master only.
    ///
    /// For structures that list every connection from both of its nodes.
    MasterOnly,
}

// ── ForceGenConfig ─────────────────────────────────────────────────

/// Configuration for a [`SpringForceGen`](crate::SpringForceGen).
#[derive(Clone, Debug, PartialEq)]
pub struct ForceGenConfig {
    /// Spatial dimension: components per node in position and force vectors.
    /// Must be 1, 2, or 3. Default: 3.
    pub dim: usize,
    /// Endpoint force application. Default: [`Reaction::Symmetric`].
    pub reaction: Reaction,
    /// Reject NaN or infinite kernel output. Default: `true`.
    pub check_finite: bool,
}

impl Default for ForceGenConfig {
    fn default() -> Self {
        Self {
            dim: 3,
            reaction: Reaction::Symmetric,
            check_finite: true,
        }
    }
}

impl ForceGenConfig {
    /// Configuration for a `dim`-dimensional structure with default policies.
    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=3).contains(&self.dim) {
            return Err(ConfigError::InvalidValue {
                reason: format!("dim must be 1, 2, or 3, got {}", self.dim),
            });
        }
        Ok(())
    }
}
