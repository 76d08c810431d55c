//! The [`SpringKernel`] trait and the built-in kernels.
//!
//! A kernel turns the displacement between a spring's two endpoints into
//! the force applied to the master endpoint. Kernels are stateless and
//! shared read-only between levels once setup is complete.

use std::any::Any;
use std::fmt;

use tendon_core::NativeIndex;

use crate::registry::KernelOptions;

/// Everything a kernel may use to evaluate one spring.
#[derive(Clone, Copy, Debug)]
pub struct SpringInput<'a> {
    /// Slave position minus master position, `dim` components.
    pub displacement: &'a [f64],
    /// Spring constant of the connection.
    pub stiffness: f64,
    /// Rest length of the connection.
    pub rest_length: f64,
    /// Native index of the master node.
    pub master: NativeIndex,
    /// Simulation time of the evaluation.
    pub time: f64,
    /// Whether the structure is in its initial configuration.
    pub initial_time: bool,
    /// Options supplied when the kernel was registered.
    pub options: &'a KernelOptions,
}

/// A pluggable spring force law, selected per connection by kernel id.
///
/// # Contract
///
/// - `force()` MUST overwrite every component of `out`; the engine reuses
///   the buffer across connections.
/// - `out.len() == input.displacement.len()`.
/// - Same input, same output: the engine relies on this for deterministic
///   accumulation.
///
/// # Examples
///
/// A spring that only pulls (no compression response):
///
/// ```
/// use tendon_kernel::{SpringInput, SpringKernel};
///
/// struct Cable;
///
/// impl SpringKernel for Cable {
///     fn name(&self) -> &str { "cable" }
///
///     fn force(&self, input: &SpringInput<'_>, out: &mut [f64]) {
///         let r = input.displacement.iter().map(|d| d * d).sum::<f64>().sqrt();
///         let scale = if r > input.rest_length {
///             input.stiffness * (1.0 - input.rest_length / r)
///         } else {
///             0.0
///         };
///         for (f, d) in out.iter_mut().zip(input.displacement) {
///             *f = scale * d;
///         }
///     }
/// }
///
/// assert_eq!(Cable.name(), "cable");
/// ```
pub trait SpringKernel: Any + Send + Sync {
    /// Human-readable name for error reporting and logs.
    fn name(&self) -> &str;

    /// Write the force on the master node into `out`.
    fn force(&self, input: &SpringInput<'_>, out: &mut [f64]);
}

/// The default linear spring, registered under kernel id 0.
///
/// `F = k (1 - L0 / |D|) D`, and zero when `|D|` is within machine epsilon
/// of zero. With `L0 = 0` this is a zero-rest-length spring `F = k D`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearSpring;

impl SpringKernel for LinearSpring {
    fn name(&self) -> &str {
        "linear_spring"
    }

    fn force(&self, input: &SpringInput<'_>, out: &mut [f64]) {
        let r = input
            .displacement
            .iter()
            .map(|d| d * d)
            .sum::<f64>()
            .sqrt();

        if r > f64::EPSILON {
            let scale = input.stiffness * (1.0 - input.rest_length / r);
            for (f, d) in out.iter_mut().zip(input.displacement) {
                *f = scale * d;
            }
        } else {
            out.fill(0.0);
        }
    }
}

/// Adapts a plain function or closure into a [`SpringKernel`].
///
/// ```
/// use std::sync::Arc;
/// use tendon_core::KernelId;
/// use tendon_kernel::{FnKernel, KernelRegistry, SpringInput};
///
/// let stiff_rod = FnKernel::new("stiff_rod", |input: &SpringInput<'_>, out: &mut [f64]| {
///     for (f, d) in out.iter_mut().zip(input.displacement) {
///         *f = 10.0 * input.stiffness * d;
///     }
/// });
///
/// let mut registry = KernelRegistry::new();
/// registry.register(KernelId(1), Arc::new(stiff_rod)).unwrap();
/// assert!(registry.contains(KernelId(1)));
/// ```
pub struct FnKernel<F> {
    name: String,
    f: F,
}

impl<F> FnKernel<F>
where
    F: Fn(&SpringInput<'_>, &mut [f64]) + Send + Sync + 'static,
{
    /// Wrap `f` under the given name.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SpringKernel for FnKernel<F>
where
    F: Fn(&SpringInput<'_>, &mut [f64]) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn force(&self, input: &SpringInput<'_>, out: &mut [f64]) {
        (self.f)(input, out)
    }
}

impl<F> fmt::Debug for FnKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnKernel").field("name", &self.name).finish()
    }
}
