use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::table::{round2, sort_ascending, split_schema, NAME_COLUMN};

/// Collapses replicate rows: one output row per (path key, sample name),
/// wavelength columns averaged with nulls excluded, rounded to 2 decimals.
/// Already-aggregated input passes through unchanged.
pub fn average_replicates(df: &DataFrame) -> Result<DataFrame> {
    info!("averaging replicate rows");
    let (group_cols, content_cols) = split_schema(df)?;

    let mut key_cols = group_cols;
    key_cols.push(NAME_COLUMN.to_string());

    let key_exprs: Vec<Expr> = key_cols.iter().map(|name| col(name.as_str())).collect();
    let mean_exprs: Vec<Expr> = content_cols
        .iter()
        .map(|name| col(name.as_str()).mean())
        .collect();

    let mut grouped = df
        .clone()
        .lazy()
        .group_by_stable(key_exprs)
        .agg(mean_exprs)
        .collect()?;

    for name in &content_cols {
        let rounded: Vec<Option<f64>> = grouped
            .column(name)?
            .f64()?
            .into_iter()
            .map(|value| value.map(round2))
            .collect();
        grouped.with_column(Series::new(name.as_str().into(), rounded))?;
    }

    let out = sort_ascending(grouped, &key_cols)?;
    info!(
        "aggregated table: {} rows x {} columns",
        out.height(),
        out.width()
    );
    Ok(out)
}
