//! Probe kernels for force engine tests.
//!
//! - [`CountingKernel`]: linear spring that counts its evaluations.
//! - [`StartupKernel`]: zero force at the initial time, linear afterwards.
//! - [`ConstantKernel`]: the same force vector for every connection.

use std::sync::atomic::{AtomicUsize, Ordering};

use tendon_kernel::{LinearSpring, SpringInput, SpringKernel};

/// Evaluates like [`LinearSpring`] and counts calls.
#[derive(Debug, Default)]
pub struct CountingKernel {
    calls: AtomicUsize,
}

impl CountingKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl SpringKernel for CountingKernel {
    fn name(&self) -> &str {
        "counting"
    }

    fn force(&self, input: &SpringInput<'_>, out: &mut [f64]) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        LinearSpring.force(input, out);
    }
}

/// Ramps a structure in gently: no force while `initial_time` is set.
#[derive(Debug, Default)]
pub struct StartupKernel;

impl SpringKernel for StartupKernel {
    fn name(&self) -> &str {
        "startup"
    }

    fn force(&self, input: &SpringInput<'_>, out: &mut [f64]) {
        if input.initial_time {
            out.fill(0.0);
        } else {
            LinearSpring.force(input, out);
        }
    }
}

/// Writes `value` into every component, ignoring the displacement.
#[derive(Debug)]
pub struct ConstantKernel {
    pub value: f64,
}

impl SpringKernel for ConstantKernel {
    fn name(&self) -> &str {
        "constant"
    }

    fn force(&self, _input: &SpringInput<'_>, out: &mut [f64]) {
        out.fill(self.value);
    }
}
