//! Error types for STL reading.

use thiserror::Error;

/// Errors that can occur while reading an STL file.
#[derive(Error, Debug)]
pub enum StlError {
    /// I/O error opening or reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes than the smallest valid STL file.
    #[error("Invalid STL file: {len} bytes is too small")]
    TooSmall {
        /// File length in bytes.
        len: usize,
    },

    /// Binary body shorter than the triangle count in its header.
    #[error("Unexpected end of STL file: header declares {declared} triangles, data holds {available}")]
    Truncated {
        /// Triangle count from the header.
        declared: u32,
        /// Complete triangle records present.
        available: usize,
    },

    /// Reading was cancelled through a [`crate::CancelToken`].
    #[error("STL read cancelled")]
    Cancelled,
}

/// Result type for STL reading.
pub type Result<T> = std::result::Result<T, StlError>;
