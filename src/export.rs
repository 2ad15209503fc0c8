//! Export of collected outcomes
//!
//! CSV follows `EXPORT_COLUMNS` exactly; failure rows only fill Name and
//! Error. JSON is an array of the serialized outcomes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use csv::WriterBuilder;
use tracing::info;

use crate::error::Result;
use crate::record::{JobOutcome, EXPORT_COLUMNS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

pub fn write_csv<W: Write>(outcomes: &[JobOutcome], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS)?;
    for outcome in outcomes {
        wtr.write_record(outcome.to_row())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(outcomes: &[JobOutcome], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, outcomes)?;
    Ok(())
}

/// Write `outcomes` to `path` in the given format.
pub fn write_file(outcomes: &[JobOutcome], path: &Path, format: ExportFormat) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => write_csv(outcomes, &mut writer)?,
        ExportFormat::Json => write_json(outcomes, &mut writer)?,
    }
    writer.flush()?;
    info!(path = %path.display(), rows = outcomes.len(), ?format, "export written");
    Ok(())
}
