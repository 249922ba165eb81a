//! Conversion settings, loadable from TOML.
//!
//! ```toml
//! tolerance = 1e-6
//! author = "J. Smith"
//! organization = "Acme"
//!
//! [logging]
//! level = "debug"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stlstep_step::StepHeader;

use crate::error::{ConfigError, ConvertError, Result};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "STLSTEP_CONFIG";

/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "stlstep.toml";

/// Parameters of one STL → STEP conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Linear tolerance for vertex/edge merging and degenerate checks.
    pub tolerance: f64,
    /// `FILE_NAME` author entry.
    pub author: String,
    /// `FILE_NAME` organization entry.
    pub organization: String,
    /// `FILE_NAME` originating system.
    pub generator: String,
    /// Logging options for front ends.
    pub logging: LoggingConfig,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            author: " ".to_string(),
            organization: " ".to_string(),
            generator: env!("CARGO_PKG_NAME").to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ConvertSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConvertError::InvalidSettings(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Load settings from an explicit path.
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find settings: `$STLSTEP_CONFIG` first, then `./stlstep.toml`.
    /// Falls back to defaults when neither exists.
    pub fn discover() -> std::result::Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .map_err(|source| ConfigError::Context {
                message: "failed to get current working directory".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// STEP header for `file_name`, stamped now, with these settings' origin.
    pub fn step_header(&self, file_name: impl Into<String>) -> StepHeader {
        StepHeader::now(file_name).with_origin(
            self.author.clone(),
            self.organization.clone(),
            self.generator.clone(),
        )
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = ConvertSettings::default();
        assert_eq!(s.tolerance, 1e-6);
        assert_eq!(s.logging.level, "info");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        for tolerance in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            let s = ConvertSettings {
                tolerance,
                ..Default::default()
            };
            assert!(matches!(s.validate(), Err(ConvertError::InvalidSettings(_))));
        }
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            tolerance = 1e-4
            author = "Ada"

            [logging]
            level = "debug"
            "#
        )
        .unwrap();

        let s = ConvertSettings::from_file(file.path()).unwrap();
        assert_eq!(s.tolerance, 1e-4);
        assert_eq!(s.author, "Ada");
        assert_eq!(s.organization, " ");
        assert_eq!(s.generator, "stlstep");
        assert_eq!(s.logging.level, "debug");
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tolerance = \"fine\"").unwrap();
        match ConvertSettings::from_file(file.path()) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ConvertSettings::from_file(dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_step_header_uses_origin() {
        let s = ConvertSettings {
            author: "Ada".into(),
            generator: "mesher".into(),
            ..Default::default()
        };
        let h = s.step_header("out.stp");
        assert_eq!(h.file_name, "out.stp");
        assert_eq!(h.author, "Ada");
        assert_eq!(h.organization, " ");
        assert_eq!(h.generator, "mesher");
    }
}
