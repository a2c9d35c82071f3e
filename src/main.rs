mod app;
mod calibration;
mod config;
mod constants;
mod control;
mod error;
mod logging;
mod persist;
mod platform;
mod resolver;
mod response;
mod smoothing;
mod state;
mod ui;

use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait};
use dialoguer::{Confirm, theme::ColorfulTheme};
use error::AppResult;
use persist::CalibrationStore;
use platform::{AccessorySystem, bluez::Bluez, simulated::SimulatedHeadset};

fn list_devices(simulate: bool) -> AppResult<()> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    println!("Audio input devices:");
    let mut any = false;
    for device in host.input_devices()? {
        let name = device.name()?;
        let marker = if Some(&name) == default_name.as_ref() { "*" } else { " " };
        println!(" {} {}", marker, name);
        any = true;
    }
    if !any {
        println!("   (none)");
    }

    let accessories: Box<dyn AccessorySystem> = if simulate {
        Box::new(SimulatedHeadset::new())
    } else {
        Box::new(Bluez::new())
    };

    println!("Paired accessories:");
    let paired = accessories.paired_accessories()?;
    if paired.is_empty() {
        println!("   (none)");
    }
    for accessory in paired {
        println!(
            "   {} {} ({})",
            accessory.address,
            accessory.name.as_deref().unwrap_or("<unnamed>"),
            if accessory.connected { "connected" } else { "not connected" }
        );
    }

    Ok(())
}

fn show_status(store: &CalibrationStore) {
    let bounds = store.load();
    println!("Calibration file: {}", store.path().display());
    match bounds.range() {
        Some((min, max)) => println!("Signal range: {} .. {}", min, max),
        None => println!("Uncalibrated"),
    }
}

fn reset_calibration(store: &CalibrationStore, yes: bool) -> AppResult<bool> {
    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Forget calibration saved in {}?", store.path().display()))
            .default(false)
            .interact()?;

    if confirmed {
        store.clear()?;
    }
    Ok(confirmed)
}

fn exit_with_error(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, e);
    std::process::exit(app::ExitCode::Error as i32);
}

#[tokio::main]
async fn main() {
    use app::ExitCode;
    use config::{Args, Commands};

    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => {
            let config = match config::Config::from_run_args(run_args) {
                Ok(c) => c,
                Err(e) => exit_with_error("Configuration error", e),
            };
            if let Err(e) = logging::init(config.log_file.as_deref()) {
                exit_with_error("Setup error", e);
            }

            let run_result = if config.headless {
                app::run_headless(config).await
            } else {
                match app::App::new_with_config(config) {
                    Ok(app) => app.run().await,
                    Err(e) => exit_with_error("Setup error", e),
                }
            };

            match run_result.result {
                Ok(_) => std::process::exit(run_result.exit_code as i32),
                Err(e) => exit_with_error("Application error", e),
            }
        }
        Commands::Calibrate(loop_args) => {
            let config = match config::Config::from_calibrate_args(loop_args) {
                Ok(c) => c,
                Err(e) => exit_with_error("Configuration error", e),
            };
            if let Err(e) = logging::init(config.log_file.as_deref()) {
                exit_with_error("Setup error", e);
            }

            let store = CalibrationStore::new(config.state_file.clone());
            let run_result = app::run_headless(config).await;
            if let Err(e) = run_result.result {
                exit_with_error("Application error", e);
            }
            show_status(&store);
        }
        Commands::Status(store_args) => {
            show_status(&CalibrationStore::new(store_args.path()));
        }
        Commands::Reset(reset_args) => {
            let store = CalibrationStore::new(reset_args.store.path());
            match reset_calibration(&store, reset_args.yes) {
                Ok(true) => println!("Calibration cleared."),
                Ok(false) => std::process::exit(ExitCode::UserExit as i32),
                Err(e) => exit_with_error("Error clearing calibration", e),
            }
        }
        Commands::List(list_args) => {
            let _ = logging::init(None);
            if let Err(e) = list_devices(list_args.simulate) {
                exit_with_error("Error listing devices", e);
            }
        }
    }
}
