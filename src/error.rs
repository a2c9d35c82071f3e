//! Custom error types for the application

use std::fmt;

/// A call across the audio or accessory boundary failed
#[derive(Debug)]
pub enum PlatformError {
    /// The helper program could not be started
    Spawn { program: String, source: std::io::Error },
    /// The helper program ran but reported failure
    Status { program: String, code: Option<i32>, stderr: String },
    /// The helper program's output could not be understood
    Parse(String),
    /// The backend cannot perform this operation
    Unsupported(&'static str),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Spawn { program, source } => {
                write!(f, "failed to run {}: {}", program, source)
            }
            PlatformError::Status { program, code, stderr } => match code {
                Some(code) => write!(f, "{} exited with status {}: {}", program, code, stderr.trim()),
                None => write!(f, "{} was terminated by a signal", program),
            },
            PlatformError::Parse(msg) => write!(f, "unexpected platform output: {}", msg),
            PlatformError::Unsupported(what) => write!(f, "operation not supported: {}", what),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Resolving the active device or its accessory failed
#[derive(Debug)]
pub enum ResolveError {
    /// Querying the default input device failed
    DefaultDevice(PlatformError),
    /// Classifying the device transport failed
    Transport(PlatformError),
    /// Reading the device unique identifier failed
    DeviceUid(PlatformError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::DefaultDevice(err) => write!(f, "Default input device query failed: {}", err),
            ResolveError::Transport(err) => write!(f, "Transport type query failed: {}", err),
            ResolveError::DeviceUid(err) => write!(f, "Device UID query failed: {}", err),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Writing the input gain failed
#[derive(Debug)]
pub struct ApplyError(pub PlatformError);

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Setting input gain failed: {}", self.0)
    }
}

impl std::error::Error for ApplyError {}

impl From<PlatformError> for ApplyError {
    fn from(err: PlatformError) -> Self {
        ApplyError(err)
    }
}

/// Application-specific error type
#[derive(Debug)]
pub enum AppError {
    /// Invalid command line configuration
    Config(String),
    /// Audio device enumeration errors
    AudioDevice(String),
    /// Platform boundary errors outside the control loop
    Platform(PlatformError),
    /// Reading or writing the calibration store
    Persist(String),
    /// General I/O errors
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::AudioDevice(msg) => write!(f, "Audio device error: {}", msg),
            AppError::Platform(err) => write!(f, "Platform error: {}", err),
            AppError::Persist(msg) => write!(f, "Calibration store error: {}", msg),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        AppError::Platform(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persist(format!("Invalid calibration data: {}", err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Io(std::io::Error::other(err))
    }
}

impl From<cpal::DevicesError> for AppError {
    fn from(err: cpal::DevicesError) -> Self {
        AppError::AudioDevice(format!("Failed to enumerate devices: {}", err))
    }
}

impl From<cpal::DeviceNameError> for AppError {
    fn from(err: cpal::DeviceNameError) -> Self {
        AppError::AudioDevice(format!("Failed to get device name: {}", err))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_includes_exit_code_and_stderr() {
        let err = PlatformError::Status {
            program: "pactl".to_string(),
            code: Some(1),
            stderr: "Connection failure\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pactl exited with status 1: Connection failure"
        );
    }

    #[test]
    fn resolve_error_names_the_failed_query() {
        let err = ResolveError::Transport(PlatformError::Unsupported("transport"));
        assert!(err.to_string().starts_with("Transport type query failed"));
    }
}
