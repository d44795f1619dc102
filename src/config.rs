//! Simulation configuration.
//!
//! Everything the interactive session starts from: the clock, the initial
//! parameter set and the slider ranges. Stored as JSON; any field left out of
//! a file falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{MAX_SAMPLES, SimulationClock};
use crate::session::Parameters;
use crate::{DEFAULT_DURATION, DEFAULT_STEP};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("Cannot read config file `{path}`: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write config file `{path}`: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed config `{path}`: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
impl ConfigError {
    fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Total simulation length [s].
    pub duration: f64,
    /// Step size [s].
    pub step: f64,
}
impl ClockConfig {
    pub fn clock(&self) -> SimulationClock {
        SimulationClock::new(self.duration, self.step)
    }
}
impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            step: DEFAULT_STEP,
        }
    }
}

/// Inclusive `[min, max]` range of a slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}
impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
    /// NaN passes through untouched so the integrator can reject it.
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::invalid_value(field, "bounds must be finite"));
        }
        if self.min > self.max {
            return Err(ConfigError::invalid_value(
                field,
                format!("min {} is greater than max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Recommended UI ranges. These only bound slider-style edits, the
/// integrator itself accepts anything finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterBounds {
    pub amplitude: Bounds,
    pub leak_conductance: Bounds,
    pub capacitance: Bounds,
}
impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            amplitude: Bounds::new(0f64, 0.05),
            leak_conductance: Bounds::new(0f64, 0.3),
            capacitance: Bounds::new(0f64, 0.01),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub clock: ClockConfig,
    pub initial: Parameters,
    pub bounds: ParameterBounds,
}
impl SimulationConfig {
    /// Reads a config from a JSON file.
    ///
    /// The result is not validated, call [`SimulationConfig::validate`].
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes this config as pretty-printed JSON, creating parent directories.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(write_error)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ClockConfig { duration, step } = self.clock;
        if !duration.is_finite() || duration <= 0f64 {
            return Err(ConfigError::invalid_value(
                "clock.duration",
                "must be finite and > 0",
            ));
        }
        if !step.is_finite() || step <= 0f64 {
            return Err(ConfigError::invalid_value(
                "clock.step",
                "must be finite and > 0",
            ));
        }
        if step > duration {
            return Err(ConfigError::invalid_value(
                "clock.step",
                format!("step {step} is longer than duration {duration}"),
            ));
        }
        if duration / step >= MAX_SAMPLES as f64 {
            return Err(ConfigError::invalid_value(
                "clock.step",
                format!("duration {duration} / step {step} exceeds {MAX_SAMPLES} samples"),
            ));
        }

        self.bounds.amplitude.validate("bounds.amplitude")?;
        self.bounds.leak_conductance.validate("bounds.leak_conductance")?;
        self.bounds.capacitance.validate("bounds.capacitance")?;

        // Zero or negative capacitance is left to the integrator so the
        // session can report it like any other edit.
        let initial = &self.initial;
        for (field, value) in [
            ("initial.amplitude", initial.amplitude),
            ("initial.neuron.leak_conductance", initial.neuron.leak_conductance),
            ("initial.neuron.capacitance", initial.neuron.capacitance),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid_value(field, "must be finite"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        SimulationConfig::default()
            .validate()
            .expect("default config should be valid");
    }

    #[test]
    fn json_round_trip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut config = SimulationConfig::default();
        config.initial.amplitude = 0.012;
        config.initial.window2.end = 4500;
        config.to_json(&path).unwrap();

        let loaded = SimulationConfig::from_json(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("partial.json");
        std::fs::write(&path, r#"{ "initial": { "amplitude": 0.02 } }"#).unwrap();

        let loaded = SimulationConfig::from_json(&path).unwrap();
        assert_eq!(loaded.initial.amplitude, 0.02);
        assert_eq!(loaded.initial.neuron, Parameters::default().neuron);
        assert_eq!(loaded.clock, ClockConfig::default());
        assert_eq!(loaded.bounds, ParameterBounds::default());
    }

    #[test]
    fn malformed_json_is_reported() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SimulationConfig::from_json(&path),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            SimulationConfig::from_json(&tmp.path().join("absent.json")),
            Err(ConfigError::FileRead { .. })
        ));
    }

    #[test]
    fn rejects_bad_clock() {
        let mut config = SimulationConfig::default();
        config.clock.step = 0f64;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "clock.step",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.clock.step = 1f64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_clock_with_too_many_samples() {
        let mut config = SimulationConfig::default();
        config.clock.duration = 1e300;
        config.clock.step = 1e-300;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "clock.step",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.clock.duration = 1e6;
        config.clock.step = 1e-6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_clock_just_under_sample_limit() {
        let mut config = SimulationConfig::default();
        config.clock.duration = (MAX_SAMPLES - 2) as f64;
        config.clock.step = 1f64;
        config.validate().unwrap();
        assert_eq!(config.clock.clock().len(), MAX_SAMPLES - 1);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut config = SimulationConfig::default();
        config.bounds.capacitance = Bounds::new(0.01, 0f64);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "bounds.capacitance",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_finite_initial_values() {
        let mut config = SimulationConfig::default();
        config.initial.neuron.leak_conductance = f64::NAN;
        assert!(config.validate().is_err());
    }
}
