use std::path::PathBuf;

use polars::prelude::*;
use reflectance_core::assemble::assemble_rows;
use reflectance_core::calibration::default_role_matchers;
use reflectance_core::config::PipelineConfig;
use reflectance_core::relative::relative_reflectance;

fn fixture_root(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn cell(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column).unwrap().f64().unwrap().get(row)
}

#[test]
fn reproduces_the_calibration_formula_per_cell() {
    let rows = assemble_rows(&fixture_root("basic"), &PipelineConfig::default()).unwrap();
    let relative = relative_reflectance(&rows, &default_role_matchers()).unwrap();

    // sorted on the path key, so TreatmentA/Block1 leads
    let names = relative.column("Name").unwrap().str().unwrap();
    assert_eq!(names.get(0), Some("sampleX"));
    assert_eq!(cell(&relative, "600", 0), Some(50.0));
    assert_eq!(cell(&relative, "650", 0), Some(60.0));
    assert_eq!(cell(&relative, "700", 0), Some(70.0));

    // TreatmentB measured against a 200-count reference panel
    assert_eq!(names.get(1), Some("leaf"));
    assert_eq!(cell(&relative, "600", 1), Some(50.0));
    assert_eq!(cell(&relative, "700", 2), Some(80.0));
}

#[test]
fn calibration_rows_and_incomplete_groups_are_excluded() {
    let rows = assemble_rows(&fixture_root("basic"), &PipelineConfig::default()).unwrap();
    let relative = relative_reflectance(&rows, &default_role_matchers()).unwrap();

    let names = relative.column("Name").unwrap().str().unwrap();
    let seen: Vec<&str> = (0..relative.height())
        .filter_map(|idx| names.get(idx))
        .collect();

    // TreatmentA/Block2 has no dark row: its probe sample must not appear,
    // and no ref/dark row ever does.
    assert_eq!(seen, vec!["sampleX", "leaf", "leaf"]);
}

#[test]
fn first_matching_calibration_row_wins() {
    let df = df!(
        "Subdir1" => &["G", "G", "G", "G"],
        "Name" => &["ref", "refb", "dark", "plant"],
        "600" => &[100.0f64, 50.0, 0.0, 50.0],
    )
    .unwrap();

    let relative = relative_reflectance(&df, &default_role_matchers()).unwrap();
    assert_eq!(relative.height(), 1);
    // against the first ref row (100), not refb (50)
    assert_eq!(cell(&relative, "600", 0), Some(50.0));
}

#[test]
fn zero_denominator_propagates_as_ieee_result() {
    let df = df!(
        "Subdir1" => &["G", "G", "G"],
        "Name" => &["ref", "dark", "plant"],
        "600" => &[10.0f64, 10.0, 50.0],
        "650" => &[10.0f64, 10.0, 10.0],
    )
    .unwrap();

    let relative = relative_reflectance(&df, &default_role_matchers()).unwrap();
    assert_eq!(relative.height(), 1);

    let at_600 = cell(&relative, "600", 0).unwrap();
    assert!(at_600.is_infinite() && at_600 > 0.0);
    let at_650 = cell(&relative, "650", 0).unwrap();
    assert!(at_650.is_nan());
}

#[test]
fn output_is_sorted_by_path_key() {
    let df = df!(
        "Subdir1" => &["B", "B", "B", "A", "A", "A"],
        "Name" => &["ref", "dark", "late", "ref", "dark", "early"],
        "600" => &[100.0f64, 0.0, 40.0, 100.0, 0.0, 20.0],
    )
    .unwrap();

    let relative = relative_reflectance(&df, &default_role_matchers()).unwrap();
    let subdir1 = relative.column("Subdir1").unwrap().str().unwrap();
    assert_eq!(subdir1.get(0), Some("A"));
    assert_eq!(subdir1.get(1), Some("B"));
}
