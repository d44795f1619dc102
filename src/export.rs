use std::io::Write;
use std::path::Path;

use ndarray::{ArrayBase, Data, Ix1};
use serde::Serialize;
use thiserror::Error;

use crate::clock::SimulationClock;
use crate::session::Frame;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write trace: {0}")]
    Csv(#[from] csv::Error),
    #[error("Delayed trace has {got} samples, expected {expected}")]
    LengthMismatch { expected: usize, got: usize },
}

#[derive(Debug, Serialize)]
struct TraceRow {
    step: usize,
    time: f64,
    current: f64,
    voltage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    delayed_voltage: Option<f64>,
}

/// Writes one CSV row per sample: `step,time,current,voltage`, plus
/// `delayed_voltage` when a delayed copy is given.
pub fn write_csv<W: Write, T: Data<Elem = f64>>(
    writer: W,
    clock: &SimulationClock,
    frame: &Frame,
    delayed: Option<&ArrayBase<T, Ix1>>,
) -> Result<(), ExportError> {
    let voltage = &frame.integration.voltage;
    if let Some(delayed) = delayed {
        if delayed.len() != voltage.len() {
            return Err(ExportError::LengthMismatch {
                expected: voltage.len(),
                got: delayed.len(),
            });
        }
    }

    let mut wtr = csv::Writer::from_writer(writer);
    for (step, (&current, &v)) in frame.current.iter().zip(voltage.iter()).enumerate() {
        wtr.serialize(TraceRow {
            step,
            time: clock.time_at(step),
            current,
            voltage: v,
            delayed_voltage: delayed.map(|d| d[step]),
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn save_csv<T: Data<Elem = f64>>(
    path: &Path,
    clock: &SimulationClock,
    frame: &Frame,
    delayed: Option<&ArrayBase<T, Ix1>>,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(path).map_err(csv::Error::from)?;
    write_csv(file, clock, frame, delayed)
}
