//! Calibration bounds persisted between runs

use crate::calibration::CalibrationBounds;
use crate::constants::paths;
use crate::error::{AppError, AppResult};
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default location of the calibration file
pub fn default_store_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(paths::APP_DIR).join(paths::CALIBRATION_FILE)
}

/// JSON file holding the bounds of the last calibration session
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved bounds. A missing or unreadable file means uncalibrated.
    pub fn load(&self) -> CalibrationBounds {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return CalibrationBounds::default(),
            Err(e) => {
                warn!("Failed to read calibration file {:?}: {}", self.path, e);
                return CalibrationBounds::default();
            }
        };

        match serde_json::from_str(&data) {
            Ok(bounds) => {
                info!("Loaded calibration from {:?}", self.path);
                bounds
            }
            Err(e) => {
                warn!("Failed to parse calibration file {:?}: {}", self.path, e);
                CalibrationBounds::default()
            }
        }
    }

    pub fn save(&self, bounds: &CalibrationBounds) -> AppResult<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| AppError::Persist("calibration path has no parent directory".to_string()))?;
        fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(bounds)?;
        fs::write(&self.path, json)?;
        info!("Calibration saved to {:?}", self.path);
        Ok(())
    }

    /// Forget saved bounds. Clearing an absent file succeeds.
    pub fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store(name: &str) -> CalibrationStore {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be set")
            .as_nanos();
        CalibrationStore::new(
            std::env::temp_dir()
                .join(format!("rssigain-{name}-{nanos}"))
                .join("calibration.json"),
        )
    }

    #[test]
    fn saved_bounds_reload_exactly() {
        let store = temp_store("roundtrip");
        let bounds = CalibrationBounds::new(-87, -41);

        store.save(&bounds).expect("bounds should be saved");
        assert_eq!(store.load(), bounds);

        let _ = store.clear();
    }

    #[test]
    fn missing_file_is_uncalibrated() {
        let store = temp_store("missing");
        assert_eq!(store.load(), CalibrationBounds::default());
    }

    #[test]
    fn malformed_file_is_uncalibrated() {
        let store = temp_store("malformed");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load(), CalibrationBounds::default());

        let _ = store.clear();
    }

    #[test]
    fn partially_set_bounds_survive() {
        let store = temp_store("partial");
        let bounds = CalibrationBounds {
            min_level: Some(-70),
            max_level: None,
        };
        store.save(&bounds).unwrap();
        assert_eq!(store.load(), bounds);
        let _ = store.clear();
    }

    #[test]
    fn clear_removes_file_and_tolerates_absence() {
        let store = temp_store("clear");
        store.save(&CalibrationBounds::new(-80, -40)).unwrap();
        store.clear().expect("clear should remove file");
        assert!(!store.path().exists());
        store.clear().expect("clearing twice is fine");
    }
}
