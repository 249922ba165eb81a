#![warn(missing_docs)]

//! STL to STEP conversion.
//!
//! Ties the STL reader and the STEP body builder together behind one call,
//! with settings loaded from TOML, cooperative cancellation and plain-text
//! progress messages.
//!
//! # Example
//!
//! ```no_run
//! use stlstep::{convert_file, CancelToken, ConvertSettings};
//!
//! let settings = ConvertSettings::discover()?;
//! let report = convert_file("part.stl", "part.stp", &settings, &CancelToken::new(), None)?;
//! println!("{} faces, {} merged edges", report.stats.faces, report.stats.merged_edges);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod convert;
pub mod error;
pub mod settings;

pub use convert::{convert_file, convert_triangles, inspect_step, ConvertReport, Progress, StepSummary};
pub use error::{ConfigError, ConvertError, Result};
pub use settings::{ConvertSettings, LoggingConfig};
pub use stlstep_step::BuildStats;
pub use stlstep_stl::CancelToken;
