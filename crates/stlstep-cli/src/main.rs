//! stlstep CLI - convert STL meshes to STEP surface models.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stlstep::{convert_file, inspect_step, CancelToken, ConfigError, ConvertSettings};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "stlstep")]
#[command(about = "Convert STL meshes to STEP surface models", long_about = None)]
struct Cli {
    /// Settings file (default: $STLSTEP_CONFIG, then ./stlstep.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter such as `debug` or `stlstep_step=trace`; overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an STL file (ASCII or binary) to STEP
    Convert {
        /// Input .stl file
        input: PathBuf,
        /// Output .stp/.step file
        output: PathBuf,
        /// Merge tolerance in model units (overrides the settings file)
        #[arg(short, long)]
        tolerance: Option<f64>,
    },
    /// Display entity counts of a STEP file
    Info {
        /// Path to the STEP file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut settings, discovery_error) = load_settings(cli.config.as_deref())?;
    init_logging(&settings.logging.level, cli.log_level.as_deref());
    if let Some(err) = discovery_error {
        warn!(error = %err, "failed to load settings, using defaults");
    }

    match cli.command {
        Commands::Convert {
            input,
            output,
            tolerance,
        } => {
            if let Some(tolerance) = tolerance {
                settings.tolerance = tolerance;
            }
            convert(&input, &output, &settings)?;
        }
        Commands::Info { file } => {
            show_info(&file)?;
        }
    }

    Ok(())
}

/// An explicit settings file must load; a discovered one may fall back to
/// defaults, returning the error for logging once the subscriber is up.
fn load_settings(path: Option<&Path>) -> Result<(ConvertSettings, Option<ConfigError>)> {
    match path {
        Some(path) => {
            let settings = ConvertSettings::from_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?;
            Ok((settings, None))
        }
        None => match ConvertSettings::discover() {
            Ok(settings) => Ok((settings, None)),
            Err(err) => Ok((ConvertSettings::default(), Some(err))),
        },
    }
}

fn init_logging(configured: &str, cli_level: Option<&str>) {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .or_else(|| EnvFilter::try_new(configured).ok())
    .unwrap_or_else(|| EnvFilter::new("info"));

    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let _ = subscriber.try_init();
}

fn convert(input: &Path, output: &Path, settings: &ConvertSettings) -> Result<()> {
    let print = |message: &str| println!("{message}");
    let report = convert_file(input, output, settings, &CancelToken::new(), Some(&print))
        .with_context(|| format!("converting {}", input.display()))?;

    println!(
        "{} faces, {} vertices, {} entities",
        report.stats.faces, report.stats.vertices, report.entities
    );
    if report.stats.skipped_triangles > 0 {
        println!(
            "Skipped {} degenerate triangles",
            report.stats.skipped_triangles
        );
    }
    Ok(())
}

fn show_info(file: &Path) -> Result<()> {
    let summary = inspect_step(file).with_context(|| format!("reading {}", file.display()))?;

    println!("File: {}", file.display());
    if let Some(name) = &summary.file_name {
        println!("Name: {name}");
    }
    println!("Entities: {}", summary.entities);
    let width = summary.counts.keys().map(|k| k.len()).max().unwrap_or(0);
    for (keyword, count) in &summary.counts {
        println!("  {keyword:<width$}  {count}");
    }
    Ok(())
}
