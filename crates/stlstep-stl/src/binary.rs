//! Binary STL: 80-byte header, `u32` triangle count, 50-byte records.

use crate::cancel::CancelToken;
use crate::error::{Result, StlError};

/// Header bytes before the triangle count.
pub const HEADER_LEN: usize = 80;
/// Bytes per triangle record: normal, three vertices, attribute count.
pub const RECORD_LEN: usize = 50;
/// Triangles between cancellation checks and progress reports.
const CHUNK_TRIANGLES: usize = 8192;

/// Decode the vertex coordinates of a binary STL; facet normals are dropped.
pub fn parse_binary(
    data: &[u8],
    cancel: &CancelToken,
    progress: Option<&dyn Fn(&str)>,
) -> Result<Vec<f64>> {
    let Some(count_bytes) = data.get(HEADER_LEN..HEADER_LEN + 4) else {
        return Err(StlError::TooSmall { len: data.len() });
    };
    let declared = u32::from_le_bytes([count_bytes[0], count_bytes[1], count_bytes[2], count_bytes[3]]);
    let body = &data[HEADER_LEN + 4..];
    let available = body.len() / RECORD_LEN;
    if available < declared as usize {
        return Err(StlError::Truncated {
            declared,
            available,
        });
    }

    let records = &body[..declared as usize * RECORD_LEN];
    let mut coords = Vec::with_capacity(declared as usize * 9);
    let mut read = 0usize;
    for chunk in records.chunks(CHUNK_TRIANGLES * RECORD_LEN) {
        if cancel.is_cancelled() {
            return Err(StlError::Cancelled);
        }
        for record in chunk.chunks_exact(RECORD_LEN) {
            // Skip the 12-byte normal; the 2-byte attribute count trails.
            for value in record[12..48].chunks_exact(4) {
                let v = f32::from_le_bytes([value[0], value[1], value[2], value[3]]);
                coords.push(f64::from(v));
            }
        }
        read += chunk.len() / RECORD_LEN;
        if read % CHUNK_TRIANGLES == 0 {
            if let Some(report) = progress {
                report(&format!("Read {read} triangles so far (binary)..."));
            }
        }
    }
    Ok(coords)
}
