use ndarray::{Array1, ArrayBase, Data, Ix1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DEFAULT_STEP, RESTING_POTENTIAL, SPIKE_MARKER, THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuronParameters {
    /// Leak conductance, `gl` [S].
    pub leak_conductance: f64,
    /// Membrane capacitance, `Cm` [F].
    pub capacitance: f64,
}
impl NeuronParameters {
    pub fn new(leak_conductance: f64, capacitance: f64) -> Self {
        Self {
            leak_conductance,
            capacitance,
        }
    }
    /// Checks the parameters leave the Euler step well defined.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.leak_conductance.is_finite() {
            return Err(DomainError::NonFiniteParameter {
                name: "leak_conductance",
                value: self.leak_conductance,
            });
        }
        if !self.capacitance.is_finite() {
            return Err(DomainError::NonFiniteParameter {
                name: "capacitance",
                value: self.capacitance,
            });
        }
        if self.capacitance == 0f64 {
            return Err(DomainError::ZeroCapacitance);
        }
        if self.capacitance < 0f64 {
            return Err(DomainError::NegativeCapacitance(self.capacitance));
        }
        Ok(())
    }
}
impl Default for NeuronParameters {
    fn default() -> Self {
        Self::new(0.16, 0.0049)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("Membrane capacitance is zero")]
    ZeroCapacitance,
    #[error("Membrane capacitance is negative: {0}")]
    NegativeCapacitance(f64),
    #[error("Parameter `{name}` is not finite: {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
    #[error("Step size must be finite and positive: {0}")]
    InvalidStep(f64),
    #[error("Current at sample {index} is not finite")]
    NonFiniteCurrent { index: usize },
    #[error("Membrane potential diverged at sample {index}")]
    NonFiniteVoltage { index: usize },
}

/// Result of one integration pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Integration {
    /// Membrane potential per sample [V], with spikes folded in.
    pub voltage: Array1<f64>,
    /// Steps at which the threshold was crossed. `voltage` is reset to rest at
    /// each of these and the sample before holds [`SPIKE_MARKER`].
    pub spike_steps: Vec<usize>,
}
impl Integration {
    pub fn spike_count(&self) -> usize {
        self.spike_steps.len()
    }
}

/// [`integrate_with_step`] at [`DEFAULT_STEP`].
pub fn integrate<T: Data<Elem = f64>>(
    current: &ArrayBase<T, Ix1>,
    gl: f64,
    cm: f64,
) -> Result<Integration, DomainError> {
    integrate_with_step(current, gl, cm, DEFAULT_STEP)
}

/// Forward-Euler pass of `C dV/dt = I - gl (V - E_L)` with fire-and-reset.
///
/// When `V[i]` crosses [`THRESHOLD`] the previous sample is overwritten with
/// [`SPIKE_MARKER`] and `V[i]` is reset to [`RESTING_POTENTIAL`], so the
/// plotted trace gets a sharp upstroke one step before the reset.
pub fn integrate_with_step<T: Data<Elem = f64>>(
    current: &ArrayBase<T, Ix1>,
    gl: f64,
    cm: f64,
    dt: f64,
) -> Result<Integration, DomainError> {
    NeuronParameters::new(gl, cm).validate()?;
    if !dt.is_finite() || dt <= 0f64 {
        return Err(DomainError::InvalidStep(dt));
    }
    if let Some(index) = current.iter().position(|i| !i.is_finite()) {
        return Err(DomainError::NonFiniteCurrent { index });
    }

    let n = current.len();
    let mut voltage = Array1::from_elem(n, RESTING_POTENTIAL);
    let mut spike_steps = Vec::new();
    for i in 1..n {
        // I - V/R = C dV/dt
        let dv = (current[i] - gl * (voltage[i - 1] - RESTING_POTENTIAL)) / cm;
        voltage[i] = voltage[i - 1] + dv * dt;

        if voltage[i] > THRESHOLD {
            voltage[i - 1] = SPIKE_MARKER;
            voltage[i] = RESTING_POTENTIAL;
            spike_steps.push(i);
        }
    }

    // Finite inputs can still overflow, e.g. a huge current over a tiny capacitance.
    if let Some(index) = voltage.iter().position(|v| !v.is_finite()) {
        return Err(DomainError::NonFiniteVoltage { index });
    }

    Ok(Integration {
        voltage,
        spike_steps,
    })
}
