#![warn(missing_docs)]

//! STEP body building, writing and reading for triangle meshes.
//!
//! Turns a flat triangle list into an open-shell boundary representation
//! (one planar face per triangle, shared vertices and edges) and writes it as
//! an ISO 10303-21 file. The reader parses the same entity subset back into
//! an [`EntityGraph`].
//!
//! # Example
//!
//! ```no_run
//! use stlstep_step::{read_step, write_step, BodyBuilder, StepHeader};
//!
//! let triangles = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//! let body = BodyBuilder::new(1e-6).unwrap().build(&triangles);
//! write_step(&body.graph, "tri.stp", &StepHeader::now("tri.stp")).unwrap();
//!
//! let graph = read_step("tri.stp").unwrap();
//! assert_eq!(graph.len(), body.graph.len());
//! ```

mod builder;
mod cache;
pub mod entities;
mod error;
mod lexer;
mod parser;
mod reader;
mod writer;

pub use builder::{BodyBuilder, BuildStats, BuiltBody, TRIANGLE_STRIDE};
pub use cache::{CachedVertex, EdgeCache, PrimitiveCache};
pub use entities::{Entity, EntityData, EntityGraph, EntityIndex, EntityKind};
pub use error::{Result, StepError};
pub use parser::{HeaderRecord, StepValue};
pub use reader::{
    read_document_from_buffer, read_step, read_step_document, read_step_from_buffer, StepDocument,
};
pub use writer::{write_step, write_step_to_buffer, write_to, StepHeader};
