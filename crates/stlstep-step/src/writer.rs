//! STEP file writer: serializes an entity graph to Part 21 text.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::entities::EntityGraph;
use crate::error::StepError;

/// Contents of the `FILE_NAME` header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepHeader {
    /// Name written as the first `FILE_NAME` argument.
    pub file_name: String,
    /// Local time stamp, `yyyy-mm-ddThh:mm:ss`.
    pub timestamp: String,
    /// Author entry.
    pub author: String,
    /// Organization entry.
    pub organization: String,
    /// Originating system.
    pub generator: String,
}

impl StepHeader {
    /// Header for `file_name` stamped with the current local time.
    pub fn now(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            ..Self::default()
        }
    }

    /// Replace author, organization and generator.
    pub fn with_origin(
        mut self,
        author: impl Into<String>,
        organization: impl Into<String>,
        generator: impl Into<String>,
    ) -> Self {
        self.author = author.into();
        self.organization = organization.into();
        self.generator = generator.into();
        self
    }
}

impl Default for StepHeader {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            timestamp: String::new(),
            author: " ".into(),
            organization: " ".into(),
            generator: "stlstep".into(),
        }
    }
}

/// Write the graph to a STEP file, creating or truncating it.
///
/// An I/O failure may leave a partially written file behind.
pub fn write_step(
    graph: &EntityGraph,
    path: impl AsRef<Path>,
    header: &StepHeader,
) -> Result<(), StepError> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    write_to(graph, header, &mut out)?;
    out.flush()?;
    info!(path = %path.display(), entities = graph.len(), "wrote STEP file");
    Ok(())
}

/// Serialize the graph to an in-memory STEP file.
pub fn write_step_to_buffer(graph: &EntityGraph, header: &StepHeader) -> Result<Vec<u8>, StepError> {
    let mut buf = Vec::with_capacity(graph.len() * 48 + 512);
    write_to(graph, header, &mut buf)?;
    Ok(buf)
}

/// Serialize the graph into any writer.
pub fn write_to<W: Write>(
    graph: &EntityGraph,
    header: &StepHeader,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "ISO-10303-21;")?;
    writeln!(out, "HEADER;")?;
    writeln!(out, "FILE_DESCRIPTION(('STP203'),'2;1');")?;
    writeln!(
        out,
        "FILE_NAME('{}','{}',('{}'),('{}'),' ','{}',' ');",
        escape(&header.file_name),
        escape(&header.timestamp),
        escape(&header.author),
        escape(&header.organization),
        escape(&header.generator),
    )?;
    writeln!(out, "FILE_SCHEMA(('CONFIG_CONTROL_DESIGN'));")?;
    writeln!(out, "ENDSEC;")?;
    writeln!(out, "DATA;")?;
    for (index, _) in graph.iter() {
        writeln!(out, "{}", graph.entity_line(index))?;
    }
    writeln!(out, "ENDSEC;")?;
    writeln!(out, "END-ISO-10303-21;")?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BodyBuilder;
    use crate::entities::{CartesianPoint, EntityData};

    fn header() -> StepHeader {
        StepHeader {
            file_name: "part.stp".into(),
            timestamp: "2024-01-02T03:04:05".into(),
            ..StepHeader::default()
        }
    }

    #[test]
    fn test_file_layout() {
        let mut graph = EntityGraph::new();
        graph.add(EntityData::CartesianPoint(CartesianPoint::new(1.0, 2.0, 3.0)));
        let text = String::from_utf8(write_step_to_buffer(&graph, &header()).unwrap()).unwrap();
        let expected = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('STP203'),'2;1');
FILE_NAME('part.stp','2024-01-02T03:04:05',(' '),(' '),' ','stlstep',' ');
FILE_SCHEMA(('CONFIG_CONTROL_DESIGN'));
ENDSEC;
DATA;
#1 = CARTESIAN_POINT('', (1.0, 2.0, 3.0));
ENDSEC;
END-ISO-10303-21;
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_header_strings_escaped() {
        let h = StepHeader {
            file_name: "bob's part.stp".into(),
            ..header()
        }
        .with_origin("A", "B & Co", "stlstep");
        let text = String::from_utf8(write_step_to_buffer(&EntityGraph::new(), &h).unwrap()).unwrap();
        assert!(text.contains("FILE_NAME('bob''s part.stp','2024-01-02T03:04:05',('A'),('B & Co'),' ','stlstep',' ');"));
    }

    #[test]
    fn test_timestamp_shape() {
        let h = StepHeader::now("x.stp");
        assert_eq!(h.timestamp.len(), 19);
        assert_eq!(&h.timestamp[4..5], "-");
        assert_eq!(&h.timestamp[10..11], "T");
    }

    #[test]
    fn test_entity_lines_in_id_order() {
        let tris = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let body = BodyBuilder::new(1e-6).unwrap().build(&tris);
        let text = String::from_utf8(write_step_to_buffer(&body.graph, &header()).unwrap()).unwrap();
        let ids: Vec<u64> = text
            .lines()
            .filter(|l| l.starts_with('#'))
            .map(|l| l[1..l.find(' ').unwrap()].parse().unwrap())
            .collect();
        assert_eq!(ids, (1..=body.graph.len() as u64).collect::<Vec<_>>());
        assert!(text.contains("= ADVANCED_FACE('', (#"));
        assert!(text.contains("= OPEN_SHELL('', (#"));
    }

    #[test]
    fn test_write_step_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.stp");
        write_step(&EntityGraph::new(), &path, &header()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ISO-10303-21;\n"));
        assert!(text.ends_with("END-ISO-10303-21;\n"));
    }

    #[test]
    fn test_write_step_bad_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.stp");
        let err = write_step(&EntityGraph::new(), &path, &header()).unwrap_err();
        assert!(matches!(err, StepError::Io(_)));
    }
}
