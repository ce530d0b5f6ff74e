//! Parquet file loading utilities

use anyhow::{Context, Result};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::models::BoundaryRegistry;
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Read a parquet file into Arrow record batches
///
/// When `columns` is given only those columns are read; names missing from
/// the file are skipped with a warning, and if none match every column is
/// read.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid Parquet
pub fn read_parquet(path: &Path, columns: Option<&[&str]>) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open parquet file: {}", path.display()))?;
    let reader_builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?;

    let projection: Vec<usize> = columns
        .map(|columns| {
            let file_schema = reader_builder.schema();
            columns
                .iter()
                .filter_map(|name| match file_schema.index_of(name) {
                    Ok(index) => Some(index),
                    Err(_) => {
                        log::warn!("Column {name} not found in {}, skipping", path.display());
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let reader = if projection.is_empty() {
        if columns.is_some() {
            log_warning("No requested column found, reading all columns", Some(&path.display()));
        }
        reader_builder
            .build()
            .with_context(|| format!("Failed to build parquet reader for {}", path.display()))?
    } else {
        let mask = ProjectionMask::roots(reader_builder.parquet_schema(), projection);
        reader_builder
            .with_projection(mask)
            .build()
            .with_context(|| {
                format!(
                    "Failed to build parquet reader with projection for {}",
                    path.display()
                )
            })?
    };

    let mut batches = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .with_context(|| format!("Failed to read record batch from {}", path.display()))?;
        batches.push(batch);
    }

    log_operation_complete(
        "Read",
        path.display(),
        batches.iter().map(RecordBatch::num_rows).sum(),
        Some(start.elapsed()),
    );
    Ok(batches)
}

/// Read a whole parquet file as one record batch
///
/// # Errors
/// Returns an error if the file cannot be read or its batches cannot be
/// concatenated
pub fn read_parquet_table(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open parquet file: {}", path.display()))?;
    let schema = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?
        .schema()
        .clone();

    let batches = read_parquet(path, None)?;
    concat_batches(&schema, &batches)
        .with_context(|| format!("Failed to concatenate batches of {}", path.display()))
}

/// Read a boundary registry from a parquet file
///
/// # Errors
/// Returns an error if the file cannot be read or lacks ward or geometry
/// columns
pub fn read_registry(path: &Path) -> Result<BoundaryRegistry> {
    let table = read_parquet_table(path)?;
    BoundaryRegistry::from_batch(&table)
        .with_context(|| format!("Failed to build boundary registry from {}", path.display()))
}

/// Expand paths into parquet files
///
/// Files are kept as given; directories contribute their `.parquet` files in
/// name order.
///
/// # Errors
/// Returns an error if a directory cannot be listed
pub fn find_parquet_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry_result in fs::read_dir(path)
            .with_context(|| format!("Failed to read directory: {}", path.display()))?
        {
            let entry = entry_result
                .with_context(|| format!("Failed to read directory entry in {}", path.display()))?;
            let candidate = entry.path();
            if candidate.is_file() && candidate.extension().is_some_and(|ext| ext == "parquet") {
                found.push(candidate);
            }
        }
        found.sort();
        if found.is_empty() {
            log_warning("No parquet files found", Some(&path.display()));
        }
        files.extend(found);
    }
    Ok(files)
}
