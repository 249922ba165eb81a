//! Error types for the conversion pipeline.

use std::path::PathBuf;

use stlstep_step::StepError;
use stlstep_stl::StlError;
use thiserror::Error;

/// Errors loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`crate::ConvertSettings`].
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// Environment lookup failed while discovering the file.
    #[error("{message}")]
    Context {
        /// What was being looked up.
        message: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Reading the STL input failed.
    #[error(transparent)]
    Stl(StlError),

    /// Building, writing or reading STEP failed.
    #[error(transparent)]
    Step(#[from] StepError),

    /// Loading settings failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Settings are out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The input produced no complete triangle.
    #[error("No triangles found in STL file: {}", .0.display())]
    NoTriangles(PathBuf),

    /// The caller cancelled the conversion.
    #[error("conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    /// Whether this is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<StlError> for ConvertError {
    fn from(err: StlError) -> Self {
        match err {
            StlError::Cancelled => Self::Cancelled,
            other => Self::Stl(other),
        }
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
