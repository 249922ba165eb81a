//! ASCII STL: only `vertex x y z` lines matter.

use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{Result, StlError};

/// Vertex lines between progress reports.
const PROGRESS_LINES: usize = 3000;

/// Collect the coordinates of every well-formed `vertex x y z` line.
///
/// Lines with a different token count or unparseable numbers are skipped,
/// so `facet`, `outer loop` and friends never contribute.
pub fn parse_ascii(
    text: &str,
    cancel: &CancelToken,
    progress: Option<&dyn Fn(&str)>,
) -> Result<Vec<f64>> {
    let mut coords = Vec::new();
    let mut vertices = 0usize;
    let mut skipped = 0usize;

    for line in text.lines() {
        if cancel.is_cancelled() {
            return Err(StlError::Cancelled);
        }
        let mut parts = line.split_whitespace();
        if parts.next() != Some("vertex") {
            continue;
        }
        let rest: Vec<&str> = parts.collect();
        let Some(xyz) = parse_xyz(&rest) else {
            skipped += 1;
            continue;
        };
        coords.extend_from_slice(&xyz);
        vertices += 1;
        if vertices % PROGRESS_LINES == 0 {
            if let Some(report) = progress {
                report(&format!("Read {} triangles so far (ASCII)...", coords.len() / 9));
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed vertex lines");
    }
    Ok(coords)
}

fn parse_xyz(parts: &[&str]) -> Option<[f64; 3]> {
    let [x, y, z] = parts else {
        return None;
    };
    Some([x.parse().ok()?, y.parse().ok()?, z.parse().ok()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "solid t
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1.5 0 0
      vertex 0 1e1 -2
    endloop
  endfacet
endsolid t
";

    #[test]
    fn test_vertex_lines() {
        let coords = parse_ascii(TRIANGLE, &CancelToken::new(), None).unwrap();
        assert_eq!(
            coords,
            vec![0.0, 0.0, 0.0, 1.5, 0.0, 0.0, 0.0, 10.0, -2.0]
        );
    }

    #[test]
    fn test_malformed_vertex_lines_skipped() {
        let text = "vertex 1 2\nvertex 1 2 3 4\nvertex a b c\n\tvertex 7 8 9\n";
        let coords = parse_ascii(text, &CancelToken::new(), None).unwrap();
        assert_eq!(coords, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            parse_ascii(TRIANGLE, &token, None),
            Err(StlError::Cancelled)
        ));
    }

    #[test]
    fn test_progress_every_3000_vertices() {
        let text = "vertex 0 0 0\n".repeat(6000);
        let messages = std::cell::RefCell::new(Vec::new());
        let report = |m: &str| messages.borrow_mut().push(m.to_string());
        parse_ascii(&text, &CancelToken::new(), Some(&report)).unwrap();
        assert_eq!(
            messages.into_inner(),
            vec![
                "Read 1000 triangles so far (ASCII)...".to_string(),
                "Read 2000 triangles so far (ASCII)...".to_string(),
            ]
        );
    }
}
