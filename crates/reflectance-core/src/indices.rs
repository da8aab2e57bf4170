use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::table::split_schema;

/// Per-row view of the band averages an index formula reads.
pub struct BandReadout<'a> {
    bands: &'a HashMap<u32, Vec<Option<f64>>>,
    row: usize,
}

impl BandReadout<'_> {
    /// Band average at `wavelength` nm for the current row. `None` when every
    /// contributing cell of the row is null.
    pub fn nm(&self, wavelength: u32) -> Option<f64> {
        self.bands
            .get(&wavelength)
            .and_then(|column| column[self.row])
    }
}

/// One catalogue entry: output column name, the band targets the formula
/// reads, and the formula itself. The expressions are the numeric contract of
/// the tool and are never re-derived at runtime.
pub struct SpectralIndex {
    pub name: &'static str,
    pub bands: &'static [u32],
    pub formula: fn(&BandReadout<'_>) -> Option<f64>,
}

/// The red/green ratio aggregates over the union of two windows per side,
/// a different rule from the single-target band averages above.
pub const RGR_NAME: &str = "RGR_Ratio";
pub const RGR_RED_WINDOWS: [f64; 2] = [630.0, 750.0];
pub const RGR_GREEN_WINDOWS: [f64; 2] = [480.0, 560.0];

static INDEX_CATALOGUE: Lazy<Vec<SpectralIndex>> = Lazy::new(|| {
    vec![
        SpectralIndex {
            name: "NDVI",
            bands: &[780, 680],
            formula: |b| Some((b.nm(780)? - b.nm(680)?) / (b.nm(780)? + b.nm(680)?)),
        },
        SpectralIndex {
            name: "SR",
            bands: &[800, 670],
            formula: |b| Some(b.nm(800)? / b.nm(670)?),
        },
        SpectralIndex {
            name: "OSAVI",
            bands: &[800, 670],
            formula: |b| {
                Some((1.0 + 0.16) * (b.nm(800)? - b.nm(670)?) / (b.nm(800)? + b.nm(670)? + 0.16))
            },
        },
        SpectralIndex {
            name: "EVI",
            bands: &[800, 670, 470],
            formula: |b| {
                Some(
                    2.5 * (b.nm(800)? - b.nm(670)?)
                        / (b.nm(800)? + 6.0 * b.nm(670)? - 7.5 * b.nm(470)? + 1.0),
                )
            },
        },
        SpectralIndex {
            name: "GNDVI",
            bands: &[800, 550],
            formula: |b| Some((b.nm(800)? - b.nm(550)?) / (b.nm(800)? + b.nm(550)?)),
        },
        SpectralIndex {
            name: "NDRE",
            bands: &[790, 720],
            formula: |b| Some((b.nm(790)? - b.nm(720)?) / (b.nm(790)? + b.nm(720)?)),
        },
        SpectralIndex {
            name: "RE_NDVI",
            bands: &[780, 730],
            formula: |b| Some((b.nm(780)? - b.nm(730)?) / (b.nm(780)? + b.nm(730)?)),
        },
        SpectralIndex {
            name: "VOG1",
            bands: &[740, 720],
            formula: |b| Some(b.nm(740)? / b.nm(720)?),
        },
        SpectralIndex {
            name: "GM1",
            bands: &[750, 550],
            formula: |b| Some(b.nm(750)? / b.nm(550)?),
        },
        SpectralIndex {
            name: "GM2",
            bands: &[750, 700],
            formula: |b| Some(b.nm(750)? / b.nm(700)?),
        },
        SpectralIndex {
            name: "CI_Green",
            bands: &[800, 550],
            formula: |b| Some(b.nm(800)? / b.nm(550)? - 1.0),
        },
        SpectralIndex {
            name: "CI_RedEdge",
            bands: &[800, 720],
            formula: |b| Some(b.nm(800)? / b.nm(720)? - 1.0),
        },
        SpectralIndex {
            name: "PRI",
            bands: &[531, 570],
            formula: |b| Some((b.nm(531)? - b.nm(570)?) / (b.nm(531)? + b.nm(570)?)),
        },
        SpectralIndex {
            name: "PRI_525",
            bands: &[525, 570],
            formula: |b| Some((b.nm(525)? - b.nm(570)?) / (b.nm(525)? + b.nm(570)?)),
        },
        SpectralIndex {
            name: "NPQI",
            bands: &[415, 435],
            formula: |b| Some((b.nm(415)? - b.nm(435)?) / (b.nm(415)? + b.nm(435)?)),
        },
        SpectralIndex {
            name: "SIPI",
            bands: &[800, 440, 680],
            formula: |b| Some((b.nm(800)? - b.nm(440)?) / (b.nm(800)? - b.nm(680)?)),
        },
        SpectralIndex {
            name: "PSRI",
            bands: &[678, 500, 750],
            formula: |b| Some((b.nm(678)? - b.nm(500)?) / b.nm(750)?),
        },
        SpectralIndex {
            name: "MCARI",
            bands: &[700, 670, 550],
            formula: |b| {
                Some(
                    ((b.nm(700)? - b.nm(670)?) - 0.2 * (b.nm(700)? - b.nm(550)?))
                        * (b.nm(700)? / b.nm(670)?),
                )
            },
        },
        SpectralIndex {
            name: "TCARI",
            bands: &[700, 670, 550],
            formula: |b| {
                Some(
                    3.0 * ((b.nm(700)? - b.nm(670)?)
                        - 0.2 * (b.nm(700)? - b.nm(550)?) * (b.nm(700)? / b.nm(670)?)),
                )
            },
        },
        SpectralIndex {
            name: "TCARI_OSAVI",
            bands: &[700, 670, 550, 800],
            formula: |b| {
                let tcari = 3.0
                    * ((b.nm(700)? - b.nm(670)?)
                        - 0.2 * (b.nm(700)? - b.nm(550)?) * (b.nm(700)? / b.nm(670)?));
                let osavi =
                    (1.0 + 0.16) * (b.nm(800)? - b.nm(670)?) / (b.nm(800)? + b.nm(670)? + 0.16);
                Some(tcari / osavi)
            },
        },
        SpectralIndex {
            name: "ARI1",
            bands: &[550, 700],
            formula: |b| Some(1.0 / b.nm(550)? - 1.0 / b.nm(700)?),
        },
        SpectralIndex {
            name: "ARI2",
            bands: &[800, 550, 700],
            formula: |b| Some(b.nm(800)? * (1.0 / b.nm(550)? - 1.0 / b.nm(700)?)),
        },
        SpectralIndex {
            name: "CRI1",
            bands: &[510, 550],
            formula: |b| Some(1.0 / b.nm(510)? - 1.0 / b.nm(550)?),
        },
        SpectralIndex {
            name: "CRI2",
            bands: &[510, 700],
            formula: |b| Some(1.0 / b.nm(510)? - 1.0 / b.nm(700)?),
        },
        SpectralIndex {
            name: "PSSRa",
            bands: &[800, 675],
            formula: |b| Some(b.nm(800)? / b.nm(675)?),
        },
        SpectralIndex {
            name: "PSSRb",
            bands: &[800, 650],
            formula: |b| Some(b.nm(800)? / b.nm(650)?),
        },
        SpectralIndex {
            name: "PSND_ChlB",
            bands: &[800, 635],
            formula: |b| Some((b.nm(800)? - b.nm(635)?) / (b.nm(800)? + b.nm(635)?)),
        },
        SpectralIndex {
            name: "FRI1",
            bands: &[685, 630],
            formula: |b| Some(b.nm(685)? / b.nm(630)?),
        },
        SpectralIndex {
            name: "FRI2",
            bands: &[685, 600],
            formula: |b| Some(b.nm(685)? / b.nm(600)?),
        },
        SpectralIndex {
            name: "RARSc",
            bands: &[760, 500],
            formula: |b| Some(b.nm(760)? / b.nm(500)?),
        },
        SpectralIndex {
            name: "WBI",
            bands: &[900, 970],
            formula: |b| Some(b.nm(900)? / b.nm(970)?),
        },
    ]
});

/// The fixed index catalogue, in output-column order (`RGR_Ratio` follows).
pub fn index_catalogue() -> &'static [SpectralIndex] {
    INDEX_CATALOGUE.as_slice()
}

struct BandColumn<'a> {
    label: Option<f64>,
    values: &'a Float64Chunked,
}

fn collect_band_columns<'a>(df: &'a DataFrame, names: &[String]) -> Result<Vec<BandColumn<'a>>> {
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        columns.push(BandColumn {
            label: name.parse::<f64>().ok(),
            values: df.column(name)?.f64()?,
        });
    }
    Ok(columns)
}

/// Column indexes whose numeric label falls inside any `targets[i] +- tol`
/// window, boundary inclusive. Non-numeric labels are never selected.
fn window_columns(columns: &[BandColumn<'_>], targets: &[f64], tolerance: f64) -> Vec<usize> {
    let mut selected = BTreeSet::new();
    for (idx, column) in columns.iter().enumerate() {
        let Some(label) = column.label else { continue };
        if targets
            .iter()
            .any(|target| (label - target).abs() <= tolerance)
        {
            selected.insert(idx);
        }
    }
    selected.into_iter().collect()
}

fn band_rows(columns: &[BandColumn<'_>], selected: &[usize], height: usize) -> Vec<Option<f64>> {
    (0..height)
        .map(|row| {
            let mut sum = 0.0;
            let mut count = 0usize;
            for &idx in selected {
                if let Some(value) = columns[idx].values.get(row) {
                    sum += value;
                    count += 1;
                }
            }
            if count == 0 {
                None
            } else {
                Some(sum / count as f64)
            }
        })
        .collect()
}

/// Row-wise mean over every column of `df` whose numeric label lies within
/// `tolerance` of `target`. Errors when no column qualifies.
pub fn band_average(df: &DataFrame, target: f64, tolerance: f64) -> Result<Vec<Option<f64>>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| name.parse::<f64>().is_ok())
        .map(|name| name.to_string())
        .collect();
    let columns = collect_band_columns(df, &names)?;
    let selected = window_columns(&columns, &[target], tolerance);
    if selected.is_empty() {
        return Err(PipelineError::EmptyBand { target, tolerance });
    }
    Ok(band_rows(&columns, &selected, df.height()))
}

fn union_band(
    columns: &[BandColumn<'_>],
    windows: &[f64],
    tolerance: f64,
    height: usize,
) -> Result<Vec<Option<f64>>> {
    let selected = window_columns(columns, windows, tolerance);
    if selected.is_empty() {
        return Err(PipelineError::EmptyBand {
            target: windows[0],
            tolerance,
        });
    }
    Ok(band_rows(columns, &selected, height))
}

/// Appends the index catalogue plus `RGR_Ratio` to the aggregated table.
/// Every catalogue target must resolve to at least one wavelength column;
/// an empty selection fails the run. Row order is preserved.
pub fn append_spectral_indices(df: &DataFrame, tolerance: f64) -> Result<DataFrame> {
    info!("computing spectral indices");
    let (_, content_cols) = split_schema(df)?;
    let height = df.height();

    let columns = collect_band_columns(df, &content_cols)?;

    let mut bands: HashMap<u32, Vec<Option<f64>>> = HashMap::new();
    for index in index_catalogue() {
        for &target in index.bands {
            if bands.contains_key(&target) {
                continue;
            }
            let selected = window_columns(&columns, &[f64::from(target)], tolerance);
            if selected.is_empty() {
                return Err(PipelineError::EmptyBand {
                    target: f64::from(target),
                    tolerance,
                });
            }
            bands.insert(target, band_rows(&columns, &selected, height));
        }
    }

    let red = union_band(&columns, &RGR_RED_WINDOWS, tolerance, height)?;
    let green = union_band(&columns, &RGR_GREEN_WINDOWS, tolerance, height)?;

    let mut new_columns: Vec<Column> = Vec::with_capacity(index_catalogue().len() + 1);
    for index in index_catalogue() {
        let values: Vec<Option<f64>> = (0..height)
            .map(|row| {
                let readout = BandReadout { bands: &bands, row };
                (index.formula)(&readout)
            })
            .collect();
        new_columns.push(Series::new(index.name.into(), values).into());
    }

    let rgr: Vec<Option<f64>> = (0..height)
        .map(|row| match (red[row], green[row]) {
            (Some(numerator), Some(denominator)) => Some(numerator / denominator),
            _ => None,
        })
        .collect();
    new_columns.push(Series::new(RGR_NAME.into(), rgr).into());

    let mut out = df.clone();
    out.hstack_mut(&new_columns)?;
    info!(
        "index table: {} rows x {} columns",
        out.height(),
        out.width()
    );
    Ok(out)
}
