use approx::assert_abs_diff_eq;
use lifsim::clock::SimulationClock;
use lifsim::lif::integrate;
use lifsim::stimulus::{StimulusWindow, generate};
use lifsim::{RESTING_POTENTIAL, SPIKE_MARKER};
use serde::Deserialize;

// Trace recorded from the default interactive setup.
const REFERENCE: &str = include_str!("fixtures/reference_trace.json");

#[derive(Deserialize)]
struct Reference {
    amplitude: f64,
    leak_conductance: f64,
    capacitance: f64,
    window1: (i64, i64),
    window2: (i64, i64),
    spike_steps: Vec<usize>,
    voltage: Vec<f64>,
}

fn reference() -> Reference {
    serde_json::from_str(REFERENCE).unwrap()
}

#[test]
fn default_setup_matches_recorded_trace() {
    let reference = reference();
    let clock = SimulationClock::new(0.1, 0.00002);
    let current = generate(
        reference.amplitude,
        &clock,
        StimulusWindow::from(reference.window1),
        StimulusWindow::from(reference.window2),
    );
    let out = integrate(&current, reference.leak_conductance, reference.capacitance).unwrap();

    assert_eq!(out.voltage.len(), reference.voltage.len());
    for (&got, &expected) in out.voltage.iter().zip(reference.voltage.iter()) {
        assert_abs_diff_eq!(got, expected, epsilon = 1e-9);
    }
    assert_eq!(out.spike_steps, reference.spike_steps);
    assert!(out.spike_count() >= 1);

    // The spike falls inside one of the stimulus windows.
    let in_window = |step: usize| {
        let step = step as i64;
        (reference.window1.0..reference.window1.1).contains(&step)
            || (reference.window2.0..reference.window2.1).contains(&step)
    };
    assert!(out.spike_steps.iter().copied().any(in_window));
}

#[test]
fn spikes_mark_previous_sample_and_reset() {
    let clock = SimulationClock::default();
    let current = generate(0.05, &clock, (0, 5001).into(), StimulusWindow::EMPTY);
    let out = integrate(&current, 0.16, 0.0049).unwrap();

    assert!(out.spike_count() > 10);
    for &step in &out.spike_steps {
        assert_eq!(out.voltage[step], RESTING_POTENTIAL);
        assert_eq!(out.voltage[step - 1], SPIKE_MARKER);
    }
    // Spike markers appear nowhere else.
    let markers = out.voltage.iter().filter(|&&v| v == SPIKE_MARKER).count();
    assert_eq!(markers, out.spike_count());
}

#[test]
fn integration_is_deterministic() {
    let clock = SimulationClock::default();
    let current = generate(0.02, &clock, (500, 2500).into(), (2000, 4800).into());
    let a = integrate(&current, 0.12, 0.003).unwrap();
    let b = integrate(&current, 0.12, 0.003).unwrap();

    assert_eq!(a.spike_steps, b.spike_steps);
    let bits = |v: &ndarray::Array1<f64>| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.voltage), bits(&b.voltage));
}
