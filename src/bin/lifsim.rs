//! `lifsim` — leaky integrate-and-fire neuron simulator.
//!
//! ```bash
//! lifsim run --amplitude 0.01 --window1 1000 2000 --output trace.csv
//! lifsim interactive --config lif.json
//! lifsim init-config lif.json
//! ```

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use lifsim::config::SimulationConfig;
use lifsim::export::{save_csv, write_csv};
use lifsim::session::{Command, Frame, Session};
use lifsim::shift::delayed;
use lifsim::stimulus::StimulusWindow;
use ndarray::Array1;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lifsim",
    version,
    about = "Leaky integrate-and-fire neuron simulator"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Simulate once and write the traces as CSV.
    Run(RunArgs),
    /// Read parameter edits from stdin and recompute after each one.
    Interactive {
        /// JSON configuration file. Defaults are used when absent.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Write the default configuration as JSON.
    InitConfig {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON configuration file. Defaults are used when absent.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Injected current inside the stimulus windows [A].
    #[arg(long, allow_negative_numbers = true)]
    amplitude: Option<f64>,

    /// Leak conductance [S].
    #[arg(long, allow_negative_numbers = true)]
    gl: Option<f64>,

    /// Membrane capacitance [F].
    #[arg(long, allow_negative_numbers = true)]
    cm: Option<f64>,

    /// First stimulus window as sample indices.
    #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
    window1: Option<Vec<i64>>,

    /// Second stimulus window as sample indices.
    #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
    window2: Option<Vec<i64>>,

    /// Also write a copy of the voltage trace delayed by this many samples.
    #[arg(long, value_name = "STEPS")]
    delay: Option<usize>,

    /// CSV destination. Writes to stdout when absent.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::Interactive { config } => interactive(config.as_deref()),
        CliCommand::InitConfig { path } => SimulationConfig::default()
            .to_json(&path)
            .map(|()| info!("Wrote default configuration to {}", path.display()))
            .map_err(|e| e.to_string()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, String> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SimulationConfig::from_json(path).map_err(|e| e.to_string())?
        }
        None => SimulationConfig::default(),
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn window(bounds: &[i64]) -> StimulusWindow {
    // clap guarantees exactly two values.
    StimulusWindow::new(bounds[0], bounds[1])
}

fn run(args: RunArgs) -> Result<(), String> {
    let mut config = load_config(args.config.as_deref())?;
    let initial = &mut config.initial;
    if let Some(amplitude) = args.amplitude {
        initial.amplitude = amplitude;
    }
    if let Some(gl) = args.gl {
        initial.neuron.leak_conductance = gl;
    }
    if let Some(cm) = args.cm {
        initial.neuron.capacitance = cm;
    }
    if let Some(bounds) = args.window1.as_deref() {
        initial.window1 = window(bounds);
    }
    if let Some(bounds) = args.window2.as_deref() {
        initial.window2 = window(bounds);
    }

    let session = Session::from_config(&config).map_err(|e| e.to_string())?;
    warn_windows(&session);
    let frame = session.frame();
    info!("{}", summary(frame));

    let shifted = args
        .delay
        .map(|offset| delayed(&frame.integration.voltage, offset));
    match args.output {
        Some(path) => {
            save_csv(&path, session.clock(), frame, shifted.as_ref())
                .map_err(|e| e.to_string())?;
            info!("Wrote {} samples to {}", session.clock().len(), path.display());
        }
        None => write_csv(io::stdout().lock(), session.clock(), frame, shifted.as_ref())
            .map_err(|e| e.to_string())?,
    }
    Ok(())
}

fn interactive(config: Option<&Path>) -> Result<(), String> {
    let config = load_config(config)?;
    let mut session = Session::from_config(&config).map_err(|e| e.to_string())?;
    println!("{}", summary(session.frame()));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|e| e.to_string())?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        match command {
            Command::Apply(change) => match session.apply(change) {
                Ok(frame) => println!("{}", summary(frame)),
                Err(e) => warn!("{e}, keeping previous trace"),
            },
            Command::Reset => match session.reset() {
                Ok(frame) => println!("{}", summary(frame)),
                Err(e) => warn!("{e}, keeping previous trace"),
            },
            Command::Show => {
                println!("{:?}", session.parameters());
                println!("{}", summary(session.frame()));
            }
            Command::Save(path) => {
                match save_csv(&path, session.clock(), session.frame(), None::<&Array1<f64>>) {
                    Ok(()) => info!("Wrote trace to {}", path.display()),
                    Err(e) => warn!("{e}"),
                }
            }
            Command::Quit => break,
        }
        warn_windows(&session);
        io::stdout().flush().map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn warn_windows(session: &Session) {
    for (slot, e) in session.window_errors() {
        warn!("{slot:?} window ignored: {e}");
    }
}

fn summary(frame: &Frame) -> String {
    match frame.voltage_range() {
        Some((lo, hi)) => format!(
            "spikes: {}, V: [{lo:.4}, {hi:.4}] V",
            frame.spike_count()
        ),
        None => format!("spikes: {}", frame.spike_count()),
    }
}
