use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::pipeline::RunSummary;

/// Writes the terminal table as comma-separated text with a header row.
/// All derived values carry the 2-decimal rounding applied upstream, so the
/// writer does no formatting of its own.
pub fn write_table(df: &DataFrame, path: &Path) -> Result<()> {
    info!("writing result table to {}", path.display());
    let mut out = df.clone();
    let file = std::fs::File::create(path)?;
    CsvWriter::new(file).include_header(true).finish(&mut out)?;
    Ok(())
}

/// Writes the run summary as pretty-printed JSON.
pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    info!("writing run summary to {}", path.display());
    let bytes = serde_json::to_vec_pretty(summary)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
