#![warn(missing_docs)]

//! STL reading for the stlstep converter.
//!
//! Produces the flat coordinate list the STEP body builder consumes: nine
//! doubles per triangle, vertices in file order, facet normals dropped.
//! The format is sniffed: a file starting with `solid` whose first kilobyte
//! mentions `facet` is read as ASCII, anything else as binary.

mod ascii;
mod binary;
mod cancel;
mod error;

use std::path::Path;

use tracing::debug;

pub use ascii::parse_ascii;
pub use binary::parse_binary;
pub use cancel::CancelToken;
pub use error::{Result, StlError};

/// Smallest file that can hold an (empty) ASCII solid.
pub const MIN_FILE_LEN: usize = 15;

/// Bytes inspected when sniffing for an ASCII file.
const SNIFF_LEN: usize = 1024;

/// Detected STL encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    /// Text `solid ... facet ... vertex ...`.
    Ascii,
    /// 80-byte header plus little-endian records.
    Binary,
}

/// Guess the encoding of an STL file from its first bytes.
///
/// Binary exporters often start the header with `solid` too, so the word
/// `facet` must also appear in the first kilobyte.
pub fn detect_format(data: &[u8]) -> StlFormat {
    if !data.starts_with(b"solid") {
        return StlFormat::Binary;
    }
    let head = &data[..data.len().min(SNIFF_LEN)];
    if head.windows(5).any(|w| w == b"facet") {
        StlFormat::Ascii
    } else {
        StlFormat::Binary
    }
}

/// Read an STL file into a flat `x, y, z` coordinate list.
pub fn read_stl(
    path: impl AsRef<Path>,
    cancel: &CancelToken,
    progress: Option<&dyn Fn(&str)>,
) -> Result<Vec<f64>> {
    let data = std::fs::read(path)?;
    read_stl_from_buffer(&data, cancel, progress)
}

/// Read STL bytes into a flat `x, y, z` coordinate list.
pub fn read_stl_from_buffer(
    data: &[u8],
    cancel: &CancelToken,
    progress: Option<&dyn Fn(&str)>,
) -> Result<Vec<f64>> {
    if data.len() < MIN_FILE_LEN {
        return Err(StlError::TooSmall { len: data.len() });
    }
    let format = detect_format(data);
    debug!(?format, bytes = data.len(), "reading STL");
    match format {
        StlFormat::Ascii => parse_ascii(&String::from_utf8_lossy(data), cancel, progress),
        StlFormat::Binary => parse_binary(data, cancel, progress),
    }
}
