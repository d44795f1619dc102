use std::ops::Range;

use ndarray::{Array1, s};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::SimulationClock;

/// Injected current per sample [A].
pub type CurrentWaveform = Array1<f64>;

/// A half-open sample range `[start, end)` during which current is injected.
///
/// Bounds are signed so raw indices from the boundary reach here untouched;
/// [`StimulusWindow::resolve`] does the clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusWindow {
    pub start: i64,
    pub end: i64,
}
impl StimulusWindow {
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
    /// Clamps both bounds into `[0, len]`.
    ///
    /// Fails only if the clamped window is inverted, out of range windows
    /// simply resolve to an empty range at the edge of the trace.
    pub fn resolve(&self, len: usize) -> Result<Range<usize>, InvalidWindowError> {
        let clamp = |x: i64| x.clamp(0, len as i64) as usize;
        let (start, end) = (clamp(self.start), clamp(self.end));
        if start > end {
            return Err(InvalidWindowError::Inverted {
                start: self.start,
                end: self.end,
            });
        }
        Ok(start..end)
    }
}
impl From<(i64, i64)> for StimulusWindow {
    fn from((start, end): (i64, i64)) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidWindowError {
    #[error("Stimulus window [{start}, {end}) ends before it starts")]
    Inverted { start: i64, end: i64 },
}

/// Builds a current trace that is `amplitude` inside either window and 0
/// elsewhere.
///
/// Overlapping windows are not summed. Inverted windows inject nothing.
pub fn generate(
    amplitude: f64,
    clock: &SimulationClock,
    window1: StimulusWindow,
    window2: StimulusWindow,
) -> CurrentWaveform {
    let mut current = Array1::zeros(clock.len());
    for window in [window1, window2] {
        let range = window.resolve(clock.len()).unwrap_or(0..0);
        current.slice_mut(s![range]).fill(amplitude);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> SimulationClock {
        SimulationClock::default()
    }

    #[test]
    fn writes_amplitude_inside_windows_only() {
        let current = generate(0.005, &clock(), (1000, 2000).into(), (3000, 4000).into());
        assert_eq!(current.len(), 5001);
        assert_eq!(current[999], 0f64);
        assert_eq!(current[1000], 0.005);
        assert_eq!(current[1999], 0.005);
        assert_eq!(current[2000], 0f64);
        assert_eq!(current[3500], 0.005);
        assert_eq!(current[4000], 0f64);
        assert_eq!(current.iter().filter(|&&x| x != 0f64).count(), 2000);
    }

    #[test]
    fn overlapping_windows_are_not_doubled() {
        let current = generate(0.01, &clock(), (100, 300).into(), (200, 400).into());
        assert!(current.iter().all(|&x| x == 0f64 || x == 0.01));
        assert_eq!(current.iter().filter(|&&x| x == 0.01).count(), 300);
    }

    #[test]
    fn clamps_out_of_range_windows() {
        let current = generate(
            0.005,
            &clock(),
            (-10, 50).into(),
            (9_999_999, 10_000_010).into(),
        );
        assert_eq!(current.len(), 5001);
        assert!(current.slice(s![..50]).iter().all(|&x| x == 0.005));
        assert!(current.slice(s![50..]).iter().all(|&x| x == 0f64));
    }

    #[test]
    fn inverted_window_is_empty() {
        let window = StimulusWindow::new(2000, 1000);
        assert_eq!(
            window.resolve(5001),
            Err(InvalidWindowError::Inverted {
                start: 2000,
                end: 1000
            })
        );
        let current = generate(0.005, &clock(), window, StimulusWindow::EMPTY);
        assert!(current.iter().all(|&x| x == 0f64));
    }

    #[test]
    fn negative_amplitude_is_kept() {
        let current = generate(-0.002, &clock(), (0, 10).into(), StimulusWindow::EMPTY);
        assert_eq!(current[5], -0.002);
    }

    #[test]
    fn resolve_clamps_into_trace() {
        assert_eq!(StimulusWindow::new(-10, 50).resolve(5001), Ok(0..50));
        assert_eq!(StimulusWindow::new(4990, 6000).resolve(5001), Ok(4990..5001));
        assert_eq!(StimulusWindow::new(-20, -5).resolve(5001), Ok(0..0));
        // Both bounds clamp to `len` so this is empty, not inverted.
        assert_eq!(StimulusWindow::new(7000, 6000).resolve(5001), Ok(5001..5001));
    }
}
