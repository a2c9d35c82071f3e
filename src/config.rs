//! Configuration parsing and validation

use crate::constants::{control, paths, response, signal};
use crate::control::LoopSettings;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for the rssigain application
#[derive(Parser)]
#[command(name = "rssigain")]
#[command(about = "Follow your wireless headset's signal strength with the microphone gain")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gain control loop
    Run(RunArgs),
    /// Learn the signal range until Ctrl+C, then save it
    Calibrate(LoopArgs),
    /// Show the saved calibration range
    Status(StoreArgs),
    /// Forget the saved calibration range
    Reset(ResetArgs),
    /// List audio input devices and paired accessories
    List(ListArgs),
}

#[derive(ClapArgs, Clone)]
pub struct LoopArgs {
    /// Tick interval in milliseconds
    #[arg(long, default_value_t = control::TICK_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Number of readings averaged before acting
    #[arg(long, default_value_t = signal::DEFAULT_WINDOW)]
    pub window: usize,

    /// Gain added on top of the response curve (0 to 1)
    #[arg(long, default_value_t = response::DEFAULT_MARGIN)]
    pub margin: f64,

    /// Use a simulated headset instead of the system audio and Bluetooth stacks
    #[arg(long)]
    pub simulate: bool,

    /// Log file (the dashboard logs next to the calibration file by default)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(ClapArgs, Clone)]
pub struct RunArgs {
    /// Log to stderr instead of showing the dashboard
    #[arg(long)]
    pub headless: bool,

    #[command(flatten)]
    pub loop_args: LoopArgs,
}

#[derive(ClapArgs, Clone, Default)]
pub struct StoreArgs {
    /// Calibration file location
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

#[derive(ClapArgs)]
pub struct ResetArgs {
    /// Do not ask for confirmation
    #[arg(long, short)]
    pub yes: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(ClapArgs)]
pub struct ListArgs {
    /// List the simulated headset instead of the system accessories
    #[arg(long)]
    pub simulate: bool,
}

impl StoreArgs {
    pub fn path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(crate::persist::default_store_path)
    }
}

/// Application configuration derived from command line arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub settings: LoopSettings,
    pub simulate: bool,
    pub headless: bool,
    pub start_calibrating: bool,
    pub state_file: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Create configuration from run arguments
    pub fn from_run_args(run_args: RunArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let headless = run_args.headless;
        Self::from_loop_args(run_args.loop_args, headless, false)
    }

    /// Create configuration for a headless calibration session
    pub fn from_calibrate_args(loop_args: LoopArgs) -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_loop_args(loop_args, true, true)
    }

    fn from_loop_args(
        loop_args: LoopArgs,
        headless: bool,
        start_calibrating: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // Validate tick interval
        if loop_args.interval_ms < control::MIN_TICK_INTERVAL_MS {
            return Err(format!(
                "Interval must be at least {} ms, got {}",
                control::MIN_TICK_INTERVAL_MS,
                loop_args.interval_ms
            )
            .into());
        }

        // Validate window size
        if loop_args.window == 0 || loop_args.window > signal::MAX_WINDOW {
            return Err(format!(
                "Window must be between 1 and {} samples, got {}",
                signal::MAX_WINDOW,
                loop_args.window
            )
            .into());
        }

        // Validate margin
        if !(0.0..=1.0).contains(&loop_args.margin) {
            return Err(format!(
                "Margin must be between 0 and 1, got {}",
                loop_args.margin
            )
            .into());
        }

        let state_file = loop_args.store.path();
        let log_file = match loop_args.log_file {
            Some(path) => Some(path),
            None if !headless => Some(state_file.with_file_name(paths::LOG_FILE)),
            None => None,
        };

        Ok(Config {
            settings: LoopSettings {
                interval: Duration::from_millis(loop_args.interval_ms),
                window: loop_args.window,
                margin: loop_args.margin,
            },
            simulate: loop_args.simulate,
            headless,
            start_calibrating,
            state_file,
            log_file,
        })
    }
}
