use ndarray::Array1;

use crate::{DEFAULT_DURATION, DEFAULT_STEP};

// `duration / step` for the defaults is 5000 up to rounding noise, so allow a
// little slack before flooring.
const SAMPLE_EPSILON: f64 = 1e-9;

/// Largest sample count a configured clock may produce.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Fixed time base shared by the stimulus and the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    duration: f64,
    step: f64,
    samples: usize,
}
impl SimulationClock {
    /// Expects `duration >= 0` and `step > 0`, both finite, with at most
    /// [`MAX_SAMPLES`] samples. Callers that take these from user input go
    /// through [`crate::config::SimulationConfig::validate`].
    pub fn new(duration: f64, step: f64) -> Self {
        // The float to int cast saturates, so only the `+ 1` can overflow.
        let samples = ((duration / step + SAMPLE_EPSILON).floor() as usize).saturating_add(1);
        Self {
            duration,
            step,
            samples,
        }
    }
    pub fn duration(&self) -> f64 {
        self.duration
    }
    pub fn step(&self) -> f64 {
        self.step
    }
    /// Number of samples, `floor(T / dt) + 1`.
    pub fn len(&self) -> usize {
        self.samples
    }
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }
    /// Time of sample `i` [s].
    pub fn time_at(&self, i: usize) -> f64 {
        i as f64 * self.step
    }
    /// All sample times [s].
    pub fn times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.samples, |i| self.time_at(i))
    }
}
impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION, DEFAULT_STEP)
    }
}
