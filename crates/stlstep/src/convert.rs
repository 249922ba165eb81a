//! STL → STEP conversion and STEP inspection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use stlstep_step::{
    read_step_document, write_step, BodyBuilder, BuildStats, StepValue, TRIANGLE_STRIDE,
};
use stlstep_stl::{read_stl, CancelToken};
use tracing::info;

use crate::error::{ConvertError, Result};
use crate::settings::ConvertSettings;

/// Receives human-readable progress messages.
pub type Progress<'a> = Option<&'a dyn Fn(&str)>;

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    /// Complete triangles handed to the builder.
    pub triangles: usize,
    /// Builder counters.
    pub stats: BuildStats,
    /// Entities written.
    pub entities: usize,
    /// File written.
    pub output: PathBuf,
}

/// Per-keyword entity counts of a STEP file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    /// First `FILE_NAME` argument, if present.
    pub file_name: Option<String>,
    /// Total entities in the data section.
    pub entities: usize,
    /// Entity count per keyword, sorted by keyword.
    pub counts: BTreeMap<&'static str, usize>,
}

fn report(progress: Progress<'_>, message: &str) {
    if let Some(sink) = progress {
        sink(message);
    }
}

fn check(cancel: &CancelToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(ConvertError::Cancelled)
    } else {
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convert an STL file into a STEP file.
///
/// Cancellation is honoured before reading, while reading, before building
/// and before writing; it surfaces as [`ConvertError::Cancelled`].
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    settings: &ConvertSettings,
    cancel: &CancelToken,
    progress: Progress<'_>,
) -> Result<ConvertReport> {
    let input = input.as_ref();
    settings.validate()?;
    check(cancel)?;

    report(progress, &format!("Reading STL: {}...", display_name(input)));
    let triangles = read_stl(input, cancel, progress)?;
    check(cancel)?;

    let count = triangles.len() / TRIANGLE_STRIDE;
    if count == 0 {
        let err = ConvertError::NoTriangles(input.to_path_buf());
        report(progress, &err.to_string());
        return Err(err);
    }
    info!(input = %input.display(), triangles = count, "read STL");
    report(
        progress,
        &format!("Read {count} triangles. Building STEP body..."),
    );

    convert_triangles(&triangles, output, settings, cancel, progress)
}

/// Build and write a STEP file from an in-memory triangle list.
pub fn convert_triangles(
    triangles: &[f64],
    output: impl AsRef<Path>,
    settings: &ConvertSettings,
    cancel: &CancelToken,
    progress: Progress<'_>,
) -> Result<ConvertReport> {
    let output = output.as_ref();
    settings.validate()?;
    check(cancel)?;

    let body = BodyBuilder::new(settings.tolerance)?.build(triangles);
    check(cancel)?;

    report(progress, &format!("Writing STEP: {}...", display_name(output)));
    let header = settings.step_header(output.display().to_string());
    write_step(&body.graph, output, &header)?;

    let merged = format!("Merged {} edges", body.stats.merged_edges);
    report(progress, &merged);
    report(
        progress,
        &format!("Done. {merged}. Saved: {}", output.display()),
    );
    info!(
        output = %output.display(),
        faces = body.stats.faces,
        merged = body.stats.merged_edges,
        "conversion finished"
    );

    Ok(ConvertReport {
        triangles: body.stats.triangles,
        stats: body.stats,
        entities: body.graph.len(),
        output: output.to_path_buf(),
    })
}

/// Read a STEP file and count its entities by keyword.
pub fn inspect_step(path: impl AsRef<Path>) -> Result<StepSummary> {
    let doc = read_step_document(path)?;
    let mut counts = BTreeMap::new();
    for (_, entity) in doc.graph.iter() {
        *counts.entry(entity.data.keyword()).or_insert(0) += 1;
    }
    let file_name = doc
        .header_record("FILE_NAME")
        .and_then(|r| r.args.first())
        .and_then(StepValue::as_string)
        .map(str::to_string);
    Ok(StepSummary {
        file_name,
        entities: doc.graph.len(),
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const ASCII_SQUARE: &str = "solid sq
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 0 1 0
endloop
endfacet
facet normal 0 0 1
outer loop
vertex 1 0 0
vertex 1 1 0
vertex 0 1 0
endloop
endfacet
endsolid sq
";

    #[test]
    fn test_convert_file_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sq.stl");
        let output = dir.path().join("sq.stp");
        std::fs::write(&input, ASCII_SQUARE).unwrap();

        let messages = RefCell::new(Vec::<String>::new());
        let sink = |m: &str| messages.borrow_mut().push(m.to_string());
        let report = convert_file(
            &input,
            &output,
            &ConvertSettings::default(),
            &CancelToken::new(),
            Some(&sink),
        )
        .unwrap();

        assert_eq!(report.triangles, 2);
        assert_eq!(report.stats.merged_edges, 1);
        assert!(output.exists());

        let messages = messages.into_inner();
        assert_eq!(messages[0], "Reading STL: sq.stl...");
        assert_eq!(messages[1], "Read 2 triangles. Building STEP body...");
        assert_eq!(messages[2], "Writing STEP: sq.stp...");
        assert_eq!(messages[3], "Merged 1 edges");
        assert_eq!(
            messages[4],
            format!("Done. Merged 1 edges. Saved: {}", output.display())
        );
    }

    #[test]
    fn test_no_triangles() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.stl");
        std::fs::write(&input, "solid e\nfacet\nendsolid e\n").unwrap();
        let err = convert_file(
            &input,
            dir.path().join("e.stp"),
            &ConvertSettings::default(),
            &CancelToken::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::NoTriangles(p) if p == input));
        assert!(!dir.path().join("e.stp").exists());
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancelToken::new();
        token.cancel();
        let err = convert_triangles(
            &[0.0; 9],
            dir.path().join("c.stp"),
            &ConvertSettings::default(),
            &token,
            None,
        )
        .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!dir.path().join("c.stp").exists());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ConvertSettings {
            tolerance: 0.0,
            ..Default::default()
        };
        let err = convert_triangles(
            &[0.0; 9],
            dir.path().join("x.stp"),
            &settings,
            &CancelToken::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidSettings(_)));
    }

    #[test]
    fn test_inspect_counts_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tri.stp");
        let tri = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        convert_triangles(
            &tri,
            &output,
            &ConvertSettings::default(),
            &CancelToken::new(),
            None,
        )
        .unwrap();

        let summary = inspect_step(&output).unwrap();
        assert_eq!(summary.counts["ADVANCED_FACE"], 1);
        assert_eq!(summary.counts["EDGE_CURVE"], 3);
        assert_eq!(summary.counts["OPEN_SHELL"], 1);
        assert_eq!(summary.counts.values().sum::<usize>(), summary.entities);
        assert_eq!(summary.file_name, Some(output.display().to_string()));
    }
}
