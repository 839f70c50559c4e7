use crate::slot::BusinessHours;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "clinic.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings. Every field defaults to the clinic's historical value,
/// so an empty JSON object is a valid config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub database_path: PathBuf,
    pub patients_csv: PathBuf,
    pub doctors_csv: PathBuf,
    pub admin_password: String,
    pub business_hours: BusinessHours,
    pub log_filter: String,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("clinic.db"),
            patients_csv: PathBuf::from("patients.csv"),
            doctors_csv: PathBuf::from("doctors.csv"),
            admin_password: "william".to_string(),
            business_hours: BusinessHours::default(),
            log_filter: "warn".to_string(),
        }
    }
}

impl ClinicConfig {
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`ClinicConfig::load_from_json`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_json(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let BusinessHours {
            open_hour,
            close_hour,
        } = self.business_hours;
        if open_hour > close_hour {
            return Err(ConfigError::Invalid(format!(
                "business_hours.open_hour {open_hour} is after close_hour {close_hour}"
            )));
        }
        if close_hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "business_hours.close_hour {close_hour} must be at most 23"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_object_gives_defaults() {
        let file = write_config("{}");
        let config = ClinicConfig::load_from_json(file.path()).unwrap();
        assert_eq!(config, ClinicConfig::default());
        assert_eq!(config.admin_password, "william");
        assert_eq!(config.business_hours, BusinessHours::new(8, 15));
    }

    #[test]
    fn partial_business_hours_keep_other_default() {
        let file = write_config(r#"{"business_hours": {"close_hour": 17}, "admin_password": "s3cret"}"#);
        let config = ClinicConfig::load_from_json(file.path()).unwrap();
        assert_eq!(config.business_hours, BusinessHours::new(8, 17));
        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.database_path, PathBuf::from("clinic.db"));
    }

    #[test]
    fn inverted_hours_are_rejected() {
        let file = write_config(r#"{"business_hours": {"open_hour": 16, "close_hour": 9}}"#);
        assert!(matches!(
            ClinicConfig::load_from_json(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn close_hour_past_midnight_is_rejected() {
        let file = write_config(r#"{"business_hours": {"close_hour": 24}}"#);
        assert!(matches!(
            ClinicConfig::load_from_json(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn bad_json_is_reported() {
        let file = write_config("{ not json");
        assert!(matches!(
            ClinicConfig::load_from_json(file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClinicConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClinicConfig::default());
    }
}
