//! Application constants and configuration values

/// Signal acquisition constants
pub mod signal {
    /// Number of samples the smoother averages over
    pub const DEFAULT_WINDOW: usize = 5;
    /// Largest window accepted on the command line
    pub const MAX_WINDOW: usize = 60;
    /// Weakest reading the dashboard scale shows
    pub const DISPLAY_FLOOR: i32 = -127;
}

/// Control loop scheduling constants
pub mod control {
    /// Tick period in milliseconds
    pub const TICK_INTERVAL_MS: u64 = 1000;
    /// Shortest tick period accepted on the command line
    pub const MIN_TICK_INTERVAL_MS: u64 = 100;
}

/// Response curve constants
pub mod response {
    /// Additive bias applied after the ease-out curve
    pub const DEFAULT_MARGIN: f64 = 0.2;
}

/// UI display constants
pub mod ui {
    /// UI refresh interval in milliseconds
    pub const UPDATE_INTERVAL_MS: u64 = 50;
    /// Bar width calculation accounts for borders
    pub const BAR_BORDER_WIDTH: usize = 2;
}

/// File locations
pub mod paths {
    /// Directory name under the user's config dir
    pub const APP_DIR: &str = "rssigain";
    /// Persisted calibration bounds
    pub const CALIBRATION_FILE: &str = "calibration.json";
    /// Log file used while the dashboard owns the terminal
    pub const LOG_FILE: &str = "rssigain.log";
}
