use std::io::Write;
use std::path::PathBuf;

use polars::prelude::DataFrame;
use reflectance_core::archive::extract_archive;
use reflectance_core::config::PipelineConfig;
use reflectance_core::outputs::write_table;
use reflectance_core::pipeline;
use zip::write::FileOptions;
use zip::CompressionMethod;

fn fixture_root(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reflectance-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn index_value(df: &DataFrame, name: &str) -> f64 {
    df.column(name).unwrap().f64().unwrap().get(0).unwrap()
}

#[test]
fn full_pipeline_produces_the_indexed_table() {
    let run = pipeline::run(&fixture_root("full"), &PipelineConfig::default())
        .expect("pipeline failed");

    assert_eq!(run.summary.source_rows, 4);
    assert_eq!(run.summary.relative_rows, 2);
    assert_eq!(run.summary.aggregated_rows, 1);

    let table = &run.table;
    assert_eq!(table.height(), 1);
    // 2 path-key columns + Name + 32 wavelengths + 31 indices + RGR_Ratio
    assert_eq!(table.width(), 67);

    let names = table.column("Name").unwrap().str().unwrap();
    assert_eq!(names.get(0), Some("leafA"));

    // replicates at 2r-2 and 2r+2 counts against a 200/0 calibration pair
    // average back to r percent
    assert_eq!(
        table.column("800").unwrap().f64().unwrap().get(0),
        Some(70.0)
    );

    let ndvi = index_value(table, "NDVI");
    assert!((ndvi - 33.0 / 99.0).abs() < 1e-9);
    let wbi = index_value(table, "WBI");
    assert!((wbi - 1.125).abs() < 1e-9);
    let rgr = index_value(table, "RGR_Ratio");
    assert!((rgr - 43.0 / 18.0).abs() < 1e-9);
}

#[test]
fn written_table_carries_key_wavelength_and_index_columns() {
    let run = pipeline::run(&fixture_root("full"), &PipelineConfig::default())
        .expect("pipeline failed");

    let dir = scratch_dir("csv");
    let path = dir.join("relative.csv");
    write_table(&run.table, &path).expect("write failed");

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Subdir1,Subdir2,Name,415,"));
    assert!(header.contains("NDVI"));
    assert!(header.ends_with("RGR_Ratio"));
    assert_eq!(lines.count(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn zipped_archive_round_trips_through_extraction() {
    let dir = scratch_dir("zip");
    let zip_path = dir.join("measurements.zip");

    let source = fixture_root("full").join("Control/Day1");
    let file = std::fs::File::create(&zip_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for name in ["ref1.txt", "dark1.txt", "leafA1.txt", "leafA2.txt"] {
        let contents = std::fs::read(source.join(name)).unwrap();
        writer
            .start_file(format!("Control/Day1/{name}"), options)
            .unwrap();
        writer.write_all(&contents).unwrap();
    }
    writer.finish().unwrap();

    let extracted = dir.join("data");
    extract_archive(&zip_path, &extracted).expect("extraction failed");

    let run = pipeline::run(&extracted, &PipelineConfig::default()).expect("pipeline failed");
    assert_eq!(run.summary.source_rows, 4);
    assert_eq!(run.summary.aggregated_rows, 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_archive_fails_before_ingestion() {
    let dir = scratch_dir("noarchive");
    let err = extract_archive(&dir.join("absent.zip"), &dir.join("data"))
        .expect_err("absent archive must fail");
    assert!(matches!(
        err,
        reflectance_core::error::PipelineError::Io(_)
    ));

    std::fs::remove_dir_all(&dir).ok();
}
