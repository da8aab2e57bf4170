use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Column separating the group key from the wavelength columns in every wide
/// table the pipeline produces.
pub const NAME_COLUMN: &str = "Name";

/// Position of the `Name` column; everything before it is the group key and
/// everything after it is wavelength data.
pub fn locate_name_column(df: &DataFrame) -> Result<usize> {
    df.get_column_names()
        .iter()
        .position(|name| name.as_str() == NAME_COLUMN)
        .ok_or_else(|| PipelineError::Processing(format!("table has no '{NAME_COLUMN}' column")))
}

/// Split the schema into (group key columns, wavelength columns) around `Name`.
pub fn split_schema(df: &DataFrame) -> Result<(Vec<String>, Vec<String>)> {
    let name_index = locate_name_column(df)?;
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let group_cols = columns[..name_index].to_vec();
    let content_cols = columns[name_index + 1..].to_vec();
    Ok((group_cols, content_cols))
}

/// Rounding used for every derived reflectance value: two decimals, half away
/// from zero. Infinities and NaN pass through untouched.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sort a wide table ascending on `by`, keeping the incoming order of ties.
pub fn sort_ascending(df: DataFrame, by: &[String]) -> Result<DataFrame> {
    if by.is_empty() {
        return Ok(df);
    }
    let by: Vec<PlSmallStr> = by.iter().map(|name| name.as_str().into()).collect();
    let sorted = df.sort(by, SortMultipleOptions::default().with_maintain_order(true))?;
    Ok(sorted)
}
