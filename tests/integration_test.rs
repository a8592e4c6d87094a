//! Integration test for Parquet export of parsed records
//!
//! Tests the export path the CLI takes:
//! 1. Parse a throughput file
//! 2. Write its records to Parquet
//! 3. Load the Parquet file back and compare
//!
//! Toyota Way: Jidoka (Built-in Quality)

use arrow::array::Int32Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::sync::Arc;
use tempfile::TempDir;
use trueno_perflog::experiment::Record;
use trueno_perflog::storage::{record_schema, RecordStore};
use trueno_perflog::Pipeline;

#[test]
fn test_parsed_records_survive_parquet() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("independent_results.txt");
    std::fs::write(
        &log,
        "Results (Throughput MT/s):\n\
         Method,Threads,HashBits,Throughput(MT/s)\n\
         independent,1,3,10.5\n\
         independent,2,3,19.75\n",
    )
    .unwrap();

    let parsed = Pipeline::builder().build().unwrap().parse_file(&log).unwrap();
    assert_eq!(parsed.outcome.records.len(), 2);

    let parquet = dir.path().join("records.parquet");
    RecordStore::from_records(&parsed.outcome.records)
        .unwrap()
        .write_parquet(&parquet)
        .unwrap();

    let loaded = RecordStore::load_parquet(&parquet).expect("Failed to load Parquet file");
    assert_eq!(loaded.num_rows(), 2);
    assert_eq!(loaded.batches()[0].schema(), record_schema());
    assert_eq!(loaded.records().unwrap(), parsed.outcome.records);
}

#[test]
fn test_many_batches_roundtrip() {
    let dir = TempDir::new().unwrap();
    let parquet = dir.path().join("batches.parquet");

    let mut store = RecordStore::new();
    for threads in 1..=8u32 {
        let records: Vec<Record> = (3..=20u32)
            .map(|bits| Record::new(threads, bits, "cpu-cycles", f64::from(threads * bits) * 1.5))
            .collect();
        store.append_records(&records).unwrap();
    }
    assert_eq!(store.batches().len(), 8);
    store.write_parquet(&parquet).unwrap();

    let loaded = RecordStore::load_parquet(&parquet).unwrap();
    assert_eq!(loaded.num_rows(), 8 * 18);
    assert_eq!(loaded.records().unwrap(), store.records().unwrap());
}

#[test]
fn test_foreign_parquet_is_rejected() {
    let dir = TempDir::new().unwrap();
    let parquet = dir.path().join("foreign.parquet");

    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
    let batch =
        RecordBatch::try_new(schema.clone(), vec![Arc::new(Int32Array::from(vec![1, 2, 3]))])
            .unwrap();
    let mut writer = ArrowWriter::try_new(File::create(&parquet).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let err = RecordStore::load_parquet(&parquet).unwrap_err();
    assert!(err.to_string().contains("Schema mismatch"));
}

#[test]
fn test_missing_parquet_file() {
    let err = RecordStore::load_parquet("/nonexistent/records.parquet").unwrap_err();
    assert!(err.to_string().contains("Failed to open Parquet file"));
}
