use std::collections::HashMap;

use polars::prelude::*;
use tracing::{info, warn};

use crate::calibration::{is_calibration, matcher_for, CalibrationRole, RoleMatcher};
use crate::error::{PipelineError, Result};
use crate::table::{round2, sort_ascending, split_schema, NAME_COLUMN};

/// Converts every non-calibration row to percent relative reflectance against
/// its group's reference and dark rows:
/// `(measured - dark) * 100 / (reference - dark)`, rounded to 2 decimals.
///
/// Groups missing either calibration row are skipped whole and logged. A zero
/// denominator is not an error; the IEEE result (inf/NaN) flows through.
pub fn relative_reflectance(df: &DataFrame, matchers: &[RoleMatcher]) -> Result<DataFrame> {
    info!("computing percent relative reflectance");
    let (group_cols, content_cols) = split_schema(df)?;

    let reference = matcher_for(matchers, CalibrationRole::Reference).ok_or_else(|| {
        PipelineError::Processing("no matcher configured for the reference role".to_string())
    })?;
    let dark = matcher_for(matchers, CalibrationRole::Dark).ok_or_else(|| {
        PipelineError::Processing("no matcher configured for the dark role".to_string())
    })?;

    let mut key_handles = Vec::with_capacity(group_cols.len());
    for name in &group_cols {
        key_handles.push(df.column(name)?.str()?);
    }
    let names = df.column(NAME_COLUMN)?.str()?;
    let mut content_handles = Vec::with_capacity(content_cols.len());
    for name in &content_cols {
        content_handles.push(df.column(name)?.f64()?);
    }

    // Group row indices by the path-key tuple, in first-seen order.
    let mut group_order: Vec<Vec<String>> = Vec::new();
    let mut group_rows: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for idx in 0..df.height() {
        let mut key = Vec::with_capacity(key_handles.len());
        for handle in &key_handles {
            key.push(handle.get(idx).unwrap_or("").to_string());
        }
        if !group_rows.contains_key(&key) {
            group_order.push(key.clone());
        }
        group_rows.entry(key).or_default().push(idx);
    }

    let mut out_key: Vec<Vec<String>> = vec![Vec::new(); group_cols.len()];
    let mut out_names: Vec<String> = Vec::new();
    let mut out_content: Vec<Vec<Option<f64>>> = vec![Vec::new(); content_cols.len()];
    let mut skipped_groups = 0usize;

    for key in &group_order {
        let rows = &group_rows[key];

        // First match wins when several rows carry the same role.
        let reference_row = rows
            .iter()
            .copied()
            .find(|&idx| names.get(idx).is_some_and(|name| reference.matches(name)));
        let dark_row = rows
            .iter()
            .copied()
            .find(|&idx| names.get(idx).is_some_and(|name| dark.matches(name)));

        let (Some(reference_row), Some(dark_row)) = (reference_row, dark_row) else {
            warn!("skipping group {:?}: missing reference or dark row", key);
            skipped_groups += 1;
            continue;
        };

        let reference_values: Vec<Option<f64>> = content_handles
            .iter()
            .map(|handle| handle.get(reference_row))
            .collect();
        let dark_values: Vec<Option<f64>> = content_handles
            .iter()
            .map(|handle| handle.get(dark_row))
            .collect();

        for &idx in rows {
            let Some(name) = names.get(idx) else { continue };
            if is_calibration(matchers, name) {
                continue;
            }

            for (level, value) in key.iter().enumerate() {
                out_key[level].push(value.clone());
            }
            out_names.push(name.to_string());
            for (column, handle) in content_handles.iter().enumerate() {
                let cell = match (
                    handle.get(idx),
                    reference_values[column],
                    dark_values[column],
                ) {
                    (Some(measured), Some(white), Some(zero)) => {
                        Some(round2((measured - zero) * 100.0 / (white - zero)))
                    }
                    _ => None,
                };
                out_content[column].push(cell);
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(group_cols.len() + 1 + content_cols.len());
    for (name, values) in group_cols.iter().zip(out_key) {
        columns.push(Series::new(name.as_str().into(), values).into());
    }
    columns.push(Series::new(NAME_COLUMN.into(), out_names).into());
    for (name, values) in content_cols.iter().zip(out_content) {
        columns.push(Series::new(name.as_str().into(), values).into());
    }

    let out = DataFrame::new(columns)?;
    info!(
        "relative table: {} rows x {} columns ({} groups skipped)",
        out.height(),
        out.width(),
        skipped_groups
    );
    sort_ascending(out, &group_cols)
}
