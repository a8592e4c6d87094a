//! Columnar storage of parsed records (Arrow/Parquet)
//!
//! Records are stored as Arrow `RecordBatch`es with the schema
//!
//! ```text
//! threads: UInt32 | hash_bits: UInt32 | metric: Utf8 | value: Float64
//! ```
//!
//! **Append-Only Write Pattern**: a store only grows by whole batches.
//! Ingestion re-runs over the log files instead of patching rows.

use crate::aggregate::SummaryTable;
use crate::experiment::Record;
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::path::Path;
use std::sync::Arc;

/// Schema of record batches
#[must_use]
pub fn record_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("threads", DataType::UInt32, false),
        Field::new("hash_bits", DataType::UInt32, false),
        Field::new("metric", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
    ]))
}

/// Schema of summary batches
#[must_use]
pub fn summary_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("metric", DataType::Utf8, true),
        Field::new("threads", DataType::UInt32, false),
        Field::new("hash_bits", DataType::UInt32, false),
        Field::new("count", DataType::UInt64, false),
        Field::new("mean", DataType::Float64, false),
    ]))
}

/// Convert records to a record batch, preserving order
///
/// # Errors
/// Returns error if Arrow rejects the columns
pub fn records_to_batch(records: &[Record]) -> Result<RecordBatch> {
    let threads = UInt32Array::from_iter_values(records.iter().map(Record::threads));
    let hash_bits = UInt32Array::from_iter_values(records.iter().map(Record::hash_bits));
    let metric = StringArray::from_iter_values(records.iter().map(Record::metric));
    let value = Float64Array::from_iter_values(records.iter().map(Record::value));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(threads),
        Arc::new(hash_bits),
        Arc::new(metric),
        Arc::new(value),
    ];
    Ok(RecordBatch::try_new(record_schema(), columns)?)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::InvalidInput(format!("Column not found: {name}")))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidInput(format!("Unexpected data type for column: {name}")))
}

/// Convert a record batch back into records
///
/// # Errors
/// Returns error if a column is missing, has the wrong type, or holds nulls
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<Record>> {
    let threads = column::<UInt32Array>(batch, "threads")?;
    let hash_bits = column::<UInt32Array>(batch, "hash_bits")?;
    let metric = column::<StringArray>(batch, "metric")?;
    let value = column::<Float64Array>(batch, "value")?;

    if [threads.null_count(), hash_bits.null_count(), metric.null_count(), value.null_count()]
        .iter()
        .any(|&nulls| nulls > 0)
    {
        return Err(Error::InvalidInput(
            "Record batch contains null values".to_string(),
        ));
    }

    Ok((0..batch.num_rows())
        .map(|i| Record::new(threads.value(i), hash_bits.value(i), metric.value(i), value.value(i)))
        .collect())
}

/// Convert a summary table to a record batch
///
/// # Errors
/// Returns error if Arrow rejects the columns
pub fn summaries_to_batch(table: &SummaryTable) -> Result<RecordBatch> {
    let rows = table.rows();
    let metric: StringArray = rows.iter().map(|row| row.metric.as_deref()).collect();
    let threads = UInt32Array::from_iter_values(rows.iter().map(|row| row.threads));
    let hash_bits = UInt32Array::from_iter_values(rows.iter().map(|row| row.hash_bits));
    let count = UInt64Array::from_iter_values(rows.iter().map(|row| row.count as u64));
    let mean = Float64Array::from_iter_values(rows.iter().map(|row| row.mean));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(metric),
        Arc::new(threads),
        Arc::new(hash_bits),
        Arc::new(count),
        Arc::new(mean),
    ];
    Ok(RecordBatch::try_new(summary_schema(), columns)?)
}

/// Append-only store of record batches
#[derive(Debug, Default)]
pub struct RecordStore {
    batches: Vec<RecordBatch>,
}

impl RecordStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records` as a single batch
    ///
    /// # Errors
    /// Returns error if the batch cannot be built
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let mut store = Self::new();
        store.append_records(records)?;
        Ok(store)
    }

    /// Load a store from a Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed, or has the wrong schema
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
        use std::fs::File;

        let file = File::open(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to open Parquet file: {e}"))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut store = Self::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            store.append_batch(batch)?;
        }

        Ok(store)
    }

    /// Write all batches to a Parquet file
    ///
    /// # Errors
    /// Returns error if the file cannot be created or written
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use parquet::arrow::ArrowWriter;
        use std::fs::File;

        let file = File::create(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet file: {e}"))
        })?;

        let mut writer = ArrowWriter::try_new(file, record_schema(), None).map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet writer: {e}"))
        })?;

        for batch in &self.batches {
            writer.write(batch).map_err(|e| {
                Error::StorageError(format!("Failed to write record batch: {e}"))
            })?;
        }

        writer.close().map_err(|e| {
            Error::StorageError(format!("Failed to finish Parquet file: {e}"))
        })?;
        Ok(())
    }

    /// Get all record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows across batches
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Append a batch
    ///
    /// # Errors
    /// Returns error if the batch schema is not [`record_schema`]
    pub fn append_batch(&mut self, batch: RecordBatch) -> Result<()> {
        let expected = record_schema();
        if batch.schema().fields() != expected.fields() {
            return Err(Error::StorageError(format!(
                "Schema mismatch: expected {:?}, got {:?}",
                expected,
                batch.schema()
            )));
        }

        self.batches.push(batch);
        Ok(())
    }

    /// Append records as one new batch (skipped when empty)
    ///
    /// # Errors
    /// Returns error if the batch cannot be built
    pub fn append_records(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.append_batch(records_to_batch(records)?)
    }

    /// Read every stored row back as records, in append order
    ///
    /// # Errors
    /// Returns error if a batch cannot be decoded
    pub fn records(&self) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            records.extend(batch_to_records(batch)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{summarize, Grouping};
    use arrow::array::Int32Array;

    fn sample() -> Vec<Record> {
        vec![
            Record::new(4, 7, "cpu-cycles", 5_305_595_199.0),
            Record::new(4, 7, "instructions", 1_024.0),
            Record::throughput(1, 3, 10.5),
        ]
    }

    #[test]
    fn test_records_to_batch_layout() {
        let batch = records_to_batch(&sample()).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 4);
        assert_eq!(batch.schema(), record_schema());

        let metric = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(metric.value(1), "instructions");
    }

    #[test]
    fn test_batch_to_records_restores_order() {
        let records = sample();
        let batch = records_to_batch(&records).unwrap();
        assert_eq!(batch_to_records(&batch).unwrap(), records);
    }

    #[test]
    fn test_empty_records() {
        let batch = records_to_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert!(batch_to_records(&batch).unwrap().is_empty());
    }

    #[test]
    fn test_batch_to_records_rejects_foreign_schema() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1, 2, 3]))]).unwrap();
        let err = batch_to_records(&batch).unwrap_err();
        assert!(err.to_string().contains("Column not found: threads"));
    }

    #[test]
    fn test_append_batch_schema_validation() {
        let mut store = RecordStore::new();
        store.append_records(&sample()).unwrap();

        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
        let incompatible =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1]))]).unwrap();

        let result = store.append_batch(incompatible);
        assert!(result.unwrap_err().to_string().contains("Schema mismatch"));
        assert_eq!(store.batches().len(), 1);
    }

    #[test]
    fn test_append_empty_records_is_noop() {
        let mut store = RecordStore::new();
        store.append_records(&[]).unwrap();
        assert!(store.batches().is_empty());
        assert_eq!(store.num_rows(), 0);
    }

    #[test]
    fn test_store_records_across_batches() {
        let mut store = RecordStore::from_records(&sample()).unwrap();
        store
            .append_records(&[Record::throughput(2, 3, 20.0)])
            .unwrap();
        assert_eq!(store.num_rows(), 4);
        let records = store.records().unwrap();
        assert_eq!(records[3], Record::throughput(2, 3, 20.0));
    }

    #[test]
    fn test_summaries_to_batch() {
        let table = summarize(&sample(), Grouping::MetricThreadsHashBits);
        let batch = summaries_to_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 3);

        let metric = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(metric.value(0), "Throughput");

        let untagged = summarize(&sample(), Grouping::ThreadsHashBits);
        let batch = summaries_to_batch(&untagged).unwrap();
        assert_eq!(batch.column(0).null_count(), batch.num_rows());
    }
}
