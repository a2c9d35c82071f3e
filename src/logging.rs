//! Logger setup

use crate::error::{AppError, AppResult};
use env_logger::{Builder, Env, Target, WriteStyle};
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Install the global logger. `RUST_LOG` overrides the default `info`
/// level. With a `log_file` the output is appended there instead of
/// stderr, which the dashboard needs since it owns the terminal.
pub fn init(log_file: Option<&Path>) -> AppResult<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder
            .target(Target::Pipe(Box::new(file)))
            .write_style(WriteStyle::Never);
    }

    builder
        .try_init()
        .map_err(|e| AppError::Config(format!("Logger already initialised: {}", e)))
}
