//! STEP file reader: parses Part 21 text into an entity graph.
//!
//! Reading is two-pass. The first pass registers every data record as an
//! empty entity under its file id, so references may point forward. The
//! second pass, in file order, parses each record's argument text and
//! resolves `#id` references through the graph.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::entities::{EntityData, EntityGraph, EntityIndex, EntityKind, Resolver};
use crate::error::StepError;
use crate::parser::{parse_arguments, parse_header_record, split_records, DataRecord, HeaderRecord};

/// A parsed STEP file: header records plus the data section.
#[derive(Debug, Clone, Default)]
pub struct StepDocument {
    /// Header-section records (`FILE_DESCRIPTION`, `FILE_NAME`, ...).
    pub header: Vec<HeaderRecord>,
    /// Data-section entities in file order.
    pub graph: EntityGraph,
}

impl StepDocument {
    /// Header record by keyword.
    pub fn header_record(&self, keyword: &str) -> Option<&HeaderRecord> {
        self.header
            .iter()
            .find(|r| r.keyword.eq_ignore_ascii_case(keyword))
    }

    /// Root shape representations in file order.
    pub fn roots(&self) -> Vec<EntityIndex> {
        self.graph.of_kind(EntityKind::ManifoldShape)
    }
}

/// Read a STEP file from a path.
pub fn read_step(path: impl AsRef<Path>) -> Result<EntityGraph, StepError> {
    Ok(read_step_document(path)?.graph)
}

/// Read a STEP file from a byte buffer.
pub fn read_step_from_buffer(data: &[u8]) -> Result<EntityGraph, StepError> {
    Ok(read_document_from_buffer(data)?.graph)
}

/// Read a STEP file from a path, keeping the header section.
pub fn read_step_document(path: impl AsRef<Path>) -> Result<StepDocument, StepError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let doc = read_document_from_buffer(&data)?;
    info!(
        path = %path.display(),
        entities = doc.graph.len(),
        "read STEP file"
    );
    Ok(doc)
}

/// Read a STEP document from a byte buffer.
///
/// # Errors
///
/// [`StepError::UnsupportedEntity`] for any data record whose keyword is not
/// in the supported set. Malformed records and unparseable arguments are
/// logged and skipped.
pub fn read_document_from_buffer(data: &[u8]) -> Result<StepDocument, StepError> {
    let mut reader = StepReader::default();
    for record in split_records(data) {
        if !reader.accept(&record)? {
            break;
        }
    }
    Ok(reader.finish())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Section {
    #[default]
    Outside,
    Header,
    Data,
}

/// First-pass state: section tracking and entities awaiting their arguments.
#[derive(Default)]
struct StepReader {
    section: Section,
    header: Vec<HeaderRecord>,
    graph: EntityGraph,
    pending: Vec<(EntityIndex, String)>,
    skipped: usize,
}

impl StepReader {
    /// Handle one record; returns `false` once the end marker is seen.
    fn accept(&mut self, record: &str) -> Result<bool, StepError> {
        let marker = record.trim();
        if marker.eq_ignore_ascii_case("ISO-10303-21") {
            return Ok(true);
        }
        if marker.eq_ignore_ascii_case("END-ISO-10303-21") {
            return Ok(false);
        }
        if marker.eq_ignore_ascii_case("HEADER") {
            self.section = Section::Header;
            return Ok(true);
        }
        if marker.eq_ignore_ascii_case("DATA") {
            self.section = Section::Data;
            return Ok(true);
        }
        if marker.eq_ignore_ascii_case("ENDSEC") {
            self.section = Section::Outside;
            return Ok(true);
        }

        match self.section {
            Section::Header => match parse_header_record(marker) {
                Some(h) => self.header.push(h),
                None => debug!(record = marker, "skipping unparseable header record"),
            },
            Section::Data => self.register(marker)?,
            Section::Outside => debug!(record = marker, "skipping record outside any section"),
        }
        Ok(true)
    }

    fn register(&mut self, record: &str) -> Result<(), StepError> {
        let Some(rec) = DataRecord::parse(record) else {
            warn!(record, "skipping malformed data record");
            self.skipped += 1;
            return Ok(());
        };
        let kind = EntityKind::from_keyword(&rec.keyword)
            .ok_or_else(|| StepError::UnsupportedEntity(rec.keyword.clone()))?;
        let index = self
            .graph
            .insert_with_id(rec.id, EntityData::empty(kind, &rec.keyword));
        self.pending.push((index, rec.args));
        Ok(())
    }

    /// Second pass: parse arguments and resolve references.
    fn finish(mut self) -> StepDocument {
        for (index, args) in std::mem::take(&mut self.pending) {
            let id = self.graph.id_of(index);
            let values = match parse_arguments(Some(id), &args) {
                Ok(values) => values,
                Err(err) => {
                    warn!(id, error = %err, "leaving entity at defaults");
                    continue;
                }
            };
            let label = values
                .first()
                .and_then(|v| v.as_string())
                .unwrap_or_default()
                .to_string();
            let mut data = self.graph.get(index).data.clone();
            data.parse_args(&values, &Resolver::new(&self.graph, id));

            let entity = self.graph.get_mut(index);
            entity.label = label;
            entity.data = data;
        }

        debug!(
            entities = self.graph.len(),
            header_records = self.header.len(),
            skipped = self.skipped,
            "parsed STEP data section"
        );
        StepDocument {
            header: self.header,
            graph: self.graph,
        }
    }
}
