use std::path::{Path, PathBuf};

use glob::glob;
use polars::prelude::*;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::table::NAME_COLUMN;

/// One measurement file, parsed and keyed by its place in the tree.
struct MeasurementFile {
    path: PathBuf,
    group: Vec<String>,
    name: String,
    labels: Vec<String>,
    values: Vec<f64>,
}

/// Walks `root` and reshapes every measurement file into one row of a wide
/// table: `Subdir1..SubdirN`, `Name`, then one `f64` column per wavelength
/// label. The first file fixes the canonical label set; any file whose labels
/// or directory depth disagree fails the run.
pub fn assemble_rows(root: &Path, config: &PipelineConfig) -> Result<DataFrame> {
    info!("scanning {} for measurement files", root.display());

    let pattern = root.join("**").join("*").to_string_lossy().into_owned();
    let mut files: Vec<MeasurementFile> = Vec::new();

    for entry in glob(&pattern)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        info!("reading {}", path.display());
        let (group, name) = path_key(root, &path, config.scaffold_depth)?;
        let (labels, values) = parse_measurement_file(&path)?;
        files.push(MeasurementFile {
            path,
            group,
            name,
            labels,
            values,
        });
    }

    if files.is_empty() {
        return Err(PipelineError::EmptyTree {
            root: root.to_path_buf(),
        });
    }

    let canonical = &files[0];
    let depth = canonical.group.len();
    for file in &files[1..] {
        if file.group.len() != depth {
            return Err(PipelineError::DepthMismatch {
                path: file.path.clone(),
                expected: depth,
                found: file.group.len(),
            });
        }
        if file.labels != canonical.labels {
            return Err(PipelineError::WavelengthMismatch {
                path: file.path.clone(),
                canonical_path: canonical.path.clone(),
            });
        }
    }

    let labels = canonical.labels.clone();
    let mut columns: Vec<Column> = Vec::with_capacity(depth + 1 + labels.len());
    for level in 0..depth {
        let values: Vec<&str> = files.iter().map(|file| file.group[level].as_str()).collect();
        columns.push(Series::new(format!("Subdir{}", level + 1).into(), values).into());
    }
    let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
    columns.push(Series::new(NAME_COLUMN.into(), names).into());
    for (index, label) in labels.iter().enumerate() {
        let values: Vec<f64> = files.iter().map(|file| file.values[index]).collect();
        columns.push(Series::new(label.as_str().into(), values).into());
    }

    let df = DataFrame::new(columns)?;
    info!(
        "assembled row table: {} rows x {} columns",
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Directory components between the root (minus the scaffold prefix) and the
/// file, plus the digit-stripped sample name.
fn path_key(root: &Path, path: &Path, scaffold_depth: usize) -> Result<(Vec<String>, String)> {
    let relative = path.strip_prefix(root).map_err(|_| {
        PipelineError::Processing(format!("{} is outside the scan root", path.display()))
    })?;
    let components: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();

    if components.len() <= scaffold_depth {
        return Err(PipelineError::Processing(format!(
            "{}: nothing left of the path after dropping {} scaffold levels",
            path.display(),
            scaffold_depth
        )));
    }

    let (file_name, rest) = components.split_last().ok_or_else(|| {
        PipelineError::Processing(format!("{}: empty relative path", path.display()))
    })?;
    let group = rest[scaffold_depth..].to_vec();
    Ok((group, sample_name(file_name)))
}

/// `plantA12.txt` -> `plantA`; `plantB.txt` -> `plantB`. Extension first,
/// then any trailing run of digits.
pub fn sample_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _extension)) => stem,
        None => file_name,
    };
    stem.trim_end_matches(|c: char| c.is_ascii_digit()).to_string()
}

fn parse_measurement_file(path: &Path) -> Result<(Vec<String>, Vec<f64>)> {
    let contents = std::fs::read_to_string(path)?;
    let mut labels = Vec::new();
    let mut values = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let label = fields.next().ok_or_else(|| PipelineError::MalformedLine {
            path: path.to_path_buf(),
            line: index + 1,
            message: "expected two whitespace-separated columns".to_string(),
        })?;
        let intensity = fields.next().ok_or_else(|| PipelineError::MalformedLine {
            path: path.to_path_buf(),
            line: index + 1,
            message: "expected two whitespace-separated columns".to_string(),
        })?;
        let value: f64 = intensity.parse().map_err(|_| PipelineError::MalformedLine {
            path: path.to_path_buf(),
            line: index + 1,
            message: format!("intensity '{intensity}' is not a number"),
        })?;
        labels.push(label.to_string());
        values.push(value);
    }

    Ok((labels, values))
}
