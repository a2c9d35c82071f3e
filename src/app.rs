//! Main application logic and orchestration

use crate::calibration::CalibrationSwitch;
use crate::config::Config;
use crate::control::ControlLoop;
use crate::error::{AppError, AppResult};
use crate::persist::CalibrationStore;
use crate::platform::Platform;
use crate::state::Snapshot;
use crate::ui;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Exit codes for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,  // Finished or quit normally
    UserExit = 1, // User declined a confirmation
    Error = 2,    // Actual application error
}

/// Result type that includes user exit information
pub type AppRunResult = Result<(), AppError>;

/// Extended result that tracks exit reason
pub struct RunResult {
    pub result: AppRunResult,
    pub exit_code: ExitCode,
}

/// A control loop running in its own task
struct RunningLoop {
    switch: CalibrationSwitch,
    snapshots: watch::Receiver<Snapshot>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RunningLoop {
    fn spawn(config: &Config) -> Self {
        let platform = if config.simulate {
            Platform::simulated()
        } else {
            Platform::system()
        };
        let store = CalibrationStore::new(config.state_file.clone());
        let control = ControlLoop::new(platform, config.settings, store);

        let switch = control.switch();
        if config.start_calibrating {
            switch.enter();
        }
        let snapshots = control.subscribe();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(control.run(shutdown_rx));

        RunningLoop {
            switch,
            snapshots,
            shutdown,
            handle,
        }
    }

    /// Ask the loop to stop and wait until it has saved its state
    async fn stop(self) -> AppRunResult {
        let _ = self.shutdown.send(true);
        self.handle
            .await
            .map_err(|e| AppError::Io(io::Error::other(e)))
    }
}

/// Run without the dashboard until Ctrl+C
pub async fn run_headless(config: Config) -> RunResult {
    let running = RunningLoop::spawn(&config);
    if config.start_calibrating {
        info!("Calibrating: move between your nearest and farthest spots, then press Ctrl+C");
    }

    let result = match tokio::signal::ctrl_c().await {
        Ok(()) => running.stop().await,
        Err(e) => {
            let _ = running.stop().await;
            Err(e.into())
        }
    };

    RunResult {
        exit_code: if result.is_ok() {
            ExitCode::Success
        } else {
            ExitCode::Error
        },
        result,
    }
}

/// Main dashboard application
pub struct App {
    config: Config,
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
}

impl App {
    /// Initialize the dashboard with configuration
    pub fn new_with_config(config: Config) -> AppResult<Self> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(App { config, terminal })
    }

    /// Run the dashboard until the user quits
    pub async fn run(mut self) -> RunResult {
        let running = RunningLoop::spawn(&self.config);
        let result = self.event_loop(&running).await;

        let stopped = running.stop().await;
        let _ = self.cleanup(); // Ignore cleanup errors

        match (result, stopped) {
            (Ok(exit_code), Ok(())) => RunResult {
                result: Ok(()),
                exit_code,
            },
            (Err(e), _) | (_, Err(e)) => RunResult {
                result: Err(e),
                exit_code: ExitCode::Error,
            },
        }
    }

    async fn event_loop(&mut self, running: &RunningLoop) -> AppResult<ExitCode> {
        let mut interval =
            tokio::time::interval(Duration::from_millis(crate::constants::ui::UPDATE_INTERVAL_MS));

        loop {
            let snapshot = running.snapshots.borrow().clone();
            self.terminal.draw(|f| ui::render_ui(f, &snapshot))?;

            tokio::select! {
                _ = tokio::signal::ctrl_c() => return Ok(ExitCode::Success),
                _ = interval.tick() => {}
            }

            // Drain pending key presses
            while crossterm::event::poll(Duration::from_millis(0))? {
                let Event::Key(key_event) = crossterm::event::read()? else {
                    continue;
                };
                if let Some(exit_code) = handle_key(key_event, &running.switch) {
                    return Ok(exit_code);
                }
            }
        }
    }

    /// Clean up terminal state
    fn cleanup(mut self) -> AppResult<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

/// Act on one dashboard key. Returns the exit code when the key quits.
/// Quitting is a normal stop, same as Ctrl+C in headless mode.
fn handle_key(key_event: KeyEvent, switch: &CalibrationSwitch) -> Option<ExitCode> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    match key_event.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(ExitCode::Success),
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ExitCode::Success)
        }
        KeyCode::Char('c') => {
            let calibrating = switch.toggle();
            info!(
                "Calibration mode {} from dashboard",
                if calibrating { "requested" } else { "released" }
            );
            None
        }
        _ => None,
    }
}
