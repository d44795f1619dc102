pub mod clock;
pub mod config;
pub mod export;
pub mod lif;
pub mod session;
pub mod shift;
pub mod stimulus;

/// Resting membrane potential [V].
pub const RESTING_POTENTIAL: f64 = -0.065;
/// Spiking threshold [V].
pub const THRESHOLD: f64 = -0.050;
/// Value written to the sample before a reset so the plotted trace shows a spike peak [V].
pub const SPIKE_MARKER: f64 = 0.04;

/// Total simulation length [s].
pub const DEFAULT_DURATION: f64 = 0.100;
/// Step size [s].
pub const DEFAULT_STEP: f64 = 0.00002;
