use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use crate::utils::{batch, text, upload};
use ward_fusion::loader::find_parquet_files;
use ward_fusion::{FusionConfig, FusionPipeline, read_parquet, read_parquet_table, read_registry};

fn write_parquet(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

fn registry_table() -> RecordBatch {
    batch(vec![
        ("wardcode", text(&["AD001", "AD002", "AD006"])),
        ("statename", text(&["Adamawa", "Adamawa", "Adamawa"])),
        ("lganame", text(&["Yola North", "Yola North", "Fufore"])),
        ("wardname", text(&["Jimeta", "Doubeli", "Gurin"])),
        ("urban", text(&["yes", "yes", "no"])),
        ("geometry", text(&["POLYGON ((1))", "POLYGON ((2))", "POLYGON ((6))"])),
    ])
}

#[test]
fn test_registry_round_trips_through_parquet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wards.parquet");
    write_parquet(&path, &registry_table());

    let registry = read_registry(&path).unwrap();
    assert_eq!(registry.len(), 3);
    let gurin = &registry.units()[2];
    assert_eq!(gurin.unit_id, "AD006");
    assert_eq!(gurin.lga.as_deref(), Some("Fufore"));
    assert_eq!(gurin.geometry, "POLYGON ((6))");
    assert_eq!(gurin.attributes.get("urban").map(String::as_str), Some("no"));
}

#[test]
fn test_projection_skips_unknown_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wards.parquet");
    write_parquet(&path, &registry_table());

    let batches = read_parquet(&path, Some(&["wardname", "no_such_column"][..])).unwrap();
    let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
    assert_eq!(rows, 3);
    assert_eq!(batches[0].num_columns(), 1);
    assert_eq!(batches[0].schema().field(0).name(), "wardname");
}

#[test]
fn test_directories_expand_to_sorted_parquet_files() {
    let dir = TempDir::new().unwrap();
    write_parquet(&dir.path().join("b.parquet"), &registry_table());
    write_parquet(&dir.path().join("a.parquet"), &registry_table());
    std::fs::write(dir.path().join("notes.txt"), "not parquet").unwrap();

    let files = find_parquet_files(&[dir.path().to_path_buf()]).unwrap();
    let names: Vec<_> = files
        .iter()
        .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
        .collect();
    assert_eq!(names, vec!["a.parquet", "b.parquet"]);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = read_parquet_table(&dir.path().join("missing.parquet")).unwrap_err();
    assert!(err.to_string().contains("missing.parquet"));
}

#[test]
fn test_upload_and_registry_files_fuse() {
    let dir = TempDir::new().unwrap();
    let registry_path = dir.path().join("wards.parquet");
    let upload_path = dir.path().join("upload.parquet");
    write_parquet(&registry_path, &registry_table());
    write_parquet(
        &upload_path,
        &upload(&[
            ("Adamawa", "Yola North", "Doubeli", "PHC Doubeli", 40, 8),
            ("Adamawa", "Fufore", "Gurin", "PHC Gurin", 20, 2),
        ]),
    );

    let registry = read_registry(&registry_path).unwrap();
    let table = read_parquet_table(&upload_path).unwrap();
    let output = FusionPipeline::new(FusionConfig::default())
        .unwrap()
        .run(&table, &registry)
        .unwrap();

    assert_eq!(output.dataset.len(), 2);
    assert_eq!(output.dataset.rows[0].unit_id, "AD002");
    assert_eq!(output.dataset.rows[0].geometry, "POLYGON ((2))");
    assert_eq!(output.dataset.rows[1].unit_id, "AD006");
}
