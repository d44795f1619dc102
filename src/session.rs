//! Interactive session state.
//!
//! A [`Session`] holds what the controls of an interactive view would hold:
//! the current parameter set and the traces last computed from it. Every edit
//! recomputes a complete [`Frame`] from a copy of the parameters and only
//! replaces the displayed one if the pass succeeds.

use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::clock::SimulationClock;
use crate::config::{ParameterBounds, SimulationConfig};
use crate::lif::{DomainError, Integration, NeuronParameters, integrate_with_step};
use crate::stimulus::{CurrentWaveform, InvalidWindowError, StimulusWindow, generate};

/// Everything one simulation pass depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Injected current inside the stimulus windows [A].
    pub amplitude: f64,
    pub neuron: NeuronParameters,
    pub window1: StimulusWindow,
    pub window2: StimulusWindow,
}
impl Parameters {
    pub fn window(&self, slot: WindowSlot) -> StimulusWindow {
        match slot {
            WindowSlot::First => self.window1,
            WindowSlot::Second => self.window2,
        }
    }
    fn window_mut(&mut self, slot: WindowSlot) -> &mut StimulusWindow {
        match slot {
            WindowSlot::First => &mut self.window1,
            WindowSlot::Second => &mut self.window2,
        }
    }
    /// Runs the stimulus generator and the integrator.
    pub fn simulate(&self, clock: &SimulationClock) -> Result<Frame, DomainError> {
        let current = generate(self.amplitude, clock, self.window1, self.window2);
        let integration = integrate_with_step(
            &current,
            self.neuron.leak_conductance,
            self.neuron.capacitance,
            clock.step(),
        )?;
        Ok(Frame {
            current,
            integration,
        })
    }
}
impl Default for Parameters {
    fn default() -> Self {
        Self {
            amplitude: 0.005,
            neuron: NeuronParameters::default(),
            window1: StimulusWindow::new(1000, 2000),
            window2: StimulusWindow::new(3000, 4000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSlot {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// A single control edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    Amplitude(f64),
    LeakConductance(f64),
    Capacitance(f64),
    Window {
        slot: WindowSlot,
        edge: Edge,
        index: i64,
    },
}

/// The traces shown for one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub current: CurrentWaveform,
    pub integration: Integration,
}
impl Frame {
    pub fn spike_count(&self) -> usize {
        self.integration.spike_count()
    }
    /// `(min, max)` membrane potential, `None` for an empty trace.
    pub fn voltage_range(&self) -> Option<(f64, f64)> {
        let voltage = &self.integration.voltage;
        let first = *voltage.first()?;
        Some(
            voltage
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    clock: SimulationClock,
    bounds: ParameterBounds,
    initial: Parameters,
    parameters: Parameters,
    frame: Frame,
}
impl Session {
    pub fn new(
        clock: SimulationClock,
        bounds: ParameterBounds,
        initial: Parameters,
    ) -> Result<Self, DomainError> {
        let frame = initial.simulate(&clock)?;
        Ok(Self {
            clock,
            bounds,
            initial,
            parameters: initial,
            frame,
        })
    }
    pub fn from_config(config: &SimulationConfig) -> Result<Self, DomainError> {
        Self::new(config.clock.clock(), config.bounds, config.initial)
    }
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Applies one edit and recomputes.
    ///
    /// Continuous values are clamped into the configured bounds the way a
    /// slider would. On failure both the parameters and the frame are left as
    /// they were.
    pub fn apply(&mut self, change: Change) -> Result<&Frame, DomainError> {
        let mut next = self.parameters;
        match change {
            Change::Amplitude(value) => next.amplitude = self.bounds.amplitude.clamp(value),
            Change::LeakConductance(value) => {
                next.neuron.leak_conductance = self.bounds.leak_conductance.clamp(value)
            }
            Change::Capacitance(value) => {
                next.neuron.capacitance = self.bounds.capacitance.clamp(value)
            }
            Change::Window { slot, edge, index } => {
                let window = next.window_mut(slot);
                match edge {
                    Edge::Start => window.start = index,
                    Edge::End => window.end = index,
                }
            }
        }
        self.commit(next)
    }

    /// Restores amplitude, leak conductance and capacitance to their initial
    /// values. Stimulus windows are kept.
    pub fn reset(&mut self) -> Result<&Frame, DomainError> {
        let next = Parameters {
            amplitude: self.initial.amplitude,
            neuron: self.initial.neuron,
            ..self.parameters
        };
        self.commit(next)
    }

    /// Windows that currently inject nothing because they are inverted.
    pub fn window_errors(&self) -> Vec<(WindowSlot, InvalidWindowError)> {
        [WindowSlot::First, WindowSlot::Second]
            .into_iter()
            .filter_map(|slot| {
                self.parameters
                    .window(slot)
                    .resolve(self.clock.len())
                    .err()
                    .map(|e| (slot, e))
            })
            .collect()
    }

    fn commit(&mut self, next: Parameters) -> Result<&Frame, DomainError> {
        let frame = next.simulate(&self.clock)?;
        debug!(
            amplitude = next.amplitude,
            gl = next.neuron.leak_conductance,
            cm = next.neuron.capacitance,
            spikes = frame.spike_count(),
            "recomputed frame"
        );
        self.parameters = next;
        self.frame = frame;
        Ok(&self.frame)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MalformedInputError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{0}` expects a value")]
    MissingArgument(&'static str),
    #[error("`{command}` takes no argument, got `{extra}`")]
    UnexpectedArgument { command: &'static str, extra: String },
    #[error("`{input}` is not a number for `{field}`: {source}")]
    InvalidNumber {
        field: &'static str,
        input: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("`{input}` is not an integer for `{field}`: {source}")]
    InvalidInteger {
        field: &'static str,
        input: String,
        #[source]
        source: ParseIntError,
    },
}

/// Parses a text box holding a float.
pub fn parse_value(field: &'static str, text: &str) -> Result<f64, MalformedInputError> {
    let text = text.trim();
    text.parse::<f64>()
        .map_err(|source| MalformedInputError::InvalidNumber {
            field,
            input: text.to_string(),
            source,
        })
}

/// Parses a text box holding a sample index.
pub fn parse_index(field: &'static str, text: &str) -> Result<i64, MalformedInputError> {
    let text = text.trim();
    text.parse::<i64>()
        .map_err(|source| MalformedInputError::InvalidInteger {
            field,
            input: text.to_string(),
            source,
        })
}

/// A line of input to an interactive session.
///
/// ```text
/// amp 0.01      gl 0.2      cm 0.004
/// start1 1200   end1 1800   start2 3000   end2 4200
/// reset   show   save trace.csv   quit
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Apply(Change),
    Reset,
    Show,
    Save(PathBuf),
    Quit,
}
impl Command {
    pub fn parse(line: &str) -> Result<Self, MalformedInputError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let argument = |command: &'static str| {
            if rest.is_empty() {
                Err(MalformedInputError::MissingArgument(command))
            } else {
                Ok(rest)
            }
        };
        let bare = |command: &'static str, parsed: Command| {
            if rest.is_empty() {
                Ok(parsed)
            } else {
                Err(MalformedInputError::UnexpectedArgument {
                    command,
                    extra: rest.to_string(),
                })
            }
        };
        let window = |field: &'static str,
                      slot: WindowSlot,
                      edge: Edge|
         -> Result<Command, MalformedInputError> {
            let index = parse_index(field, argument(field)?)?;
            Ok(Command::Apply(Change::Window { slot, edge, index }))
        };

        match name {
            "" => Err(MalformedInputError::Empty),
            "amp" | "amplitude" => Ok(Command::Apply(Change::Amplitude(parse_value(
                "amplitude",
                argument("amp")?,
            )?))),
            "gl" => Ok(Command::Apply(Change::LeakConductance(parse_value(
                "gl",
                argument("gl")?,
            )?))),
            "cm" => Ok(Command::Apply(Change::Capacitance(parse_value(
                "cm",
                argument("cm")?,
            )?))),
            "start1" => window("start1", WindowSlot::First, Edge::Start),
            "end1" => window("end1", WindowSlot::First, Edge::End),
            "start2" => window("start2", WindowSlot::Second, Edge::Start),
            "end2" => window("end2", WindowSlot::Second, Edge::End),
            "reset" => bare("reset", Command::Reset),
            "show" => bare("show", Command::Show),
            "quit" | "exit" => bare("quit", Command::Quit),
            "save" => Ok(Command::Save(PathBuf::from(argument("save")?))),
            other => Err(MalformedInputError::UnknownCommand(other.to_string())),
        }
    }
}
