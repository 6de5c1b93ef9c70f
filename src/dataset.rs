//! Dataset types for stratasplit.
//!
//! Provides the [`Dataset`] trait and [`ArrowDataset`], an in-memory table
//! whose record batches double as the partitions the split pipeline works
//! over. Each batch becomes one partition of a [`PartitionedColumn`].

use std::{path::Path, sync::Arc};

use arrow::{array::RecordBatch, datatypes::SchemaRef};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    file::properties::WriterProperties,
};

use crate::{
    column::PartitionedColumn,
    error::{Error, Result},
};

/// A batch-partitioned table.
///
/// All implementations must be thread-safe (Send + Sync).
pub trait Dataset: Send + Sync {
    /// Returns the total number of rows in the dataset.
    fn len(&self) -> usize;

    /// Returns true if the dataset contains no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the schema of the dataset.
    fn schema(&self) -> SchemaRef;

    /// Returns an iterator over all RecordBatches in the dataset.
    fn iter(&self) -> Box<dyn Iterator<Item = RecordBatch> + Send + '_>;

    /// Returns the number of batches in the dataset.
    fn num_batches(&self) -> usize;
}

/// An in-memory dataset backed by Arrow RecordBatches.
///
/// # Example
///
/// ```no_run
/// use stratasplit::{ArrowDataset, Dataset};
///
/// let dataset = ArrowDataset::from_parquet("data.parquet").unwrap();
/// let label = dataset.column("label").unwrap();
/// println!("{} rows in {} partitions", label.len(), label.num_partitions());
/// ```
#[derive(Debug, Clone)]
pub struct ArrowDataset {
    batches: Vec<RecordBatch>,
    schema: SchemaRef,
    row_count: usize,
}

impl ArrowDataset {
    /// Creates a new ArrowDataset from a vector of RecordBatches.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The batches vector is empty
    /// - The batches have inconsistent schemas
    pub fn new(batches: Vec<RecordBatch>) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Err(Error::EmptyDataset);
        };
        let schema = first.schema();

        for (i, batch) in batches.iter().enumerate().skip(1) {
            if batch.schema() != schema {
                return Err(Error::schema_mismatch(format!(
                    "Batch {} has different schema than batch 0",
                    i
                )));
            }
        }

        let row_count = batches.iter().map(RecordBatch::num_rows).sum();

        Ok(Self {
            batches,
            schema,
            row_count,
        })
    }

    /// Creates an ArrowDataset from a single RecordBatch.
    ///
    /// # Errors
    ///
    /// Never fails for a single batch; kept fallible to mirror [`Self::new`].
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        Self::new(vec![batch])
    }

    /// Loads a dataset from a Parquet file.
    ///
    /// Every decoded record batch becomes one partition.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The file is not valid Parquet
    /// - The file is empty
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Self::new(batches)
    }

    /// Saves the dataset to a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be created
    /// - Writing fails
    pub fn to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;

        let props = WriterProperties::builder().build();
        let mut writer = ArrowWriter::try_new(file, self.schema.clone(), Some(props))?;

        for batch in &self.batches {
            writer.write(batch)?;
        }

        writer.close()?;
        Ok(())
    }

    /// Loads a dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The file is not valid CSV
    /// - The file is empty
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_csv_with_options(path, CsvOptions::default())
    }

    /// Loads a dataset from a CSV file with options.
    ///
    /// `options.batch_size` controls the partition size of every column.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the file is empty.
    pub fn from_csv_with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        use std::io::{BufReader, Seek, SeekFrom};

        use arrow_csv::{reader::Format, ReaderBuilder};

        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let mut buf_reader = BufReader::new(file);

        let schema = if let Some(schema) = options.schema {
            Arc::new(schema)
        } else {
            let mut format = Format::default().with_header(options.has_header);
            if let Some(delim) = options.delimiter {
                format = format.with_delimiter(delim);
            }
            let (inferred, _) = format.infer_schema(&mut buf_reader, Some(1000))?;

            buf_reader
                .seek(SeekFrom::Start(0))
                .map_err(|e| Error::io(e, path))?;

            Arc::new(inferred)
        };

        let mut builder = ReaderBuilder::new(schema)
            .with_batch_size(options.batch_size)
            .with_header(options.has_header);

        if let Some(delim) = options.delimiter {
            builder = builder.with_delimiter(delim);
        }

        let reader = builder.build(buf_reader)?;

        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Self::new(batches)
    }

    /// Loads a dataset from a CSV string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid CSV.
    pub fn from_csv_str(data: &str, batch_size: usize) -> Result<Self> {
        use std::io::Cursor;

        use arrow_csv::{reader::Format, ReaderBuilder};

        let mut cursor_for_infer = Cursor::new(data.as_bytes());
        let format = Format::default().with_header(true);
        let (inferred, _) = format.infer_schema(&mut cursor_for_infer, Some(1000))?;

        let schema = Arc::new(inferred);
        let cursor = Cursor::new(data.as_bytes());

        let builder = ReaderBuilder::new(schema)
            .with_batch_size(batch_size.max(1))
            .with_header(true);

        let reader = builder.build(cursor)?;

        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Self::new(batches)
    }

    /// Saves the dataset to a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        use arrow_csv::WriterBuilder;

        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;

        let mut writer = WriterBuilder::new().with_header(true).build(file);

        for batch in &self.batches {
            writer.write(batch)?;
        }

        Ok(())
    }

    /// Returns the underlying batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Returns one column as a partitioned column, one partition per batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist.
    pub fn column(&self, name: &str) -> Result<PartitionedColumn> {
        let idx = self
            .schema
            .index_of(name)
            .map_err(|_| Error::column_not_found(name))?;
        let arrays = self
            .batches
            .iter()
            .map(|batch| Arc::clone(batch.column(idx)))
            .collect();
        PartitionedColumn::from_arrays(name, arrays)
    }
}

impl Dataset for ArrowDataset {
    fn len(&self) -> usize {
        self.row_count
    }

    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = RecordBatch> + Send + '_> {
        Box::new(self.batches.iter().cloned())
    }

    fn num_batches(&self) -> usize {
        self.batches.len()
    }
}

/// Options for CSV parsing.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row.
    pub has_header: bool,
    /// Delimiter character (default is comma).
    pub delimiter: Option<u8>,
    /// Batch size for reading, which is also the partition size.
    pub batch_size: usize,
    /// Optional schema (inferred if not provided).
    pub schema: Option<arrow::datatypes::Schema>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: None,
            batch_size: 8192,
            schema: None,
        }
    }
}

impl CsvOptions {
    /// Creates new CSV options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the file has a header row.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Sets the delimiter character.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sets the batch size for reading.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the schema for parsing.
    #[must_use]
    pub fn with_schema(mut self, schema: arrow::datatypes::Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[cfg(test)]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::uninlined_format_args
)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Int32Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };

    use super::*;

    fn create_test_batch(start: i32, count: usize) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("label", DataType::Utf8, false),
        ]));

        let ids: Vec<i32> = (start..start + count as i32).collect();
        let labels: Vec<String> = ids.iter().map(|i| format!("class_{}", i % 2)).collect();

        RecordBatch::try_new(
            schema,
            vec![Arc::new(Int32Array::from(ids)), Arc::new(StringArray::from(labels))],
        )
        .ok()
        .unwrap_or_else(|| panic!("Failed to create test batch"))
    }

    #[test]
    fn test_new_dataset() {
        let dataset = ArrowDataset::new(vec![create_test_batch(0, 10)])
            .ok()
            .unwrap_or_else(|| panic!("Should create dataset"));
        assert_eq!(dataset.len(), 10);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn test_empty_dataset_error() {
        let result = ArrowDataset::new(vec![]);
        assert!(matches!(result, Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_schema_mismatch_error() {
        let schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, false)]));
        let other = RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["a"]))])
            .ok()
            .unwrap_or_else(|| panic!("Should create batch"));

        let result = ArrowDataset::new(vec![create_test_batch(0, 3), other]);
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_column_uses_batches_as_partitions() {
        let dataset = ArrowDataset::new(vec![
            create_test_batch(0, 4),
            create_test_batch(4, 3),
            create_test_batch(7, 5),
        ])
        .ok()
        .unwrap_or_else(|| panic!("Should create dataset"));

        let column = dataset
            .column("id")
            .ok()
            .unwrap_or_else(|| panic!("Should find column"));
        assert_eq!(column.name(), "id");
        assert_eq!(column.len(), 12);
        assert_eq!(column.num_partitions(), 3);
        let starts: Vec<u64> = column.partitions().iter().map(|p| p.start()).collect();
        assert_eq!(starts, vec![0, 4, 7]);
    }

    #[test]
    fn test_column_not_found() {
        let dataset = ArrowDataset::from_batch(create_test_batch(0, 2))
            .ok()
            .unwrap_or_else(|| panic!("Should create dataset"));
        let result = dataset.column("missing");
        assert!(matches!(result, Err(Error::ColumnNotFound { .. })));
    }

    #[test]
    fn test_iter_batches() {
        let dataset = ArrowDataset::new(vec![create_test_batch(0, 2), create_test_batch(2, 3)])
            .ok()
            .unwrap_or_else(|| panic!("Should create dataset"));

        assert_eq!(dataset.num_batches(), 2);
        assert_eq!(dataset.iter().map(|b| b.num_rows()).sum::<usize>(), 5);
        assert_eq!(dataset.batches()[1].num_rows(), 3);
    }

    #[test]
    fn test_parquet_roundtrip() {
        let dataset = ArrowDataset::from_batch(create_test_batch(0, 10))
            .ok()
            .unwrap_or_else(|| panic!("Should create dataset"));

        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = temp_dir.path().join("test.parquet");

        dataset
            .to_parquet(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should write parquet"));

        let loaded = ArrowDataset::from_parquet(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should load parquet"));

        assert_eq!(loaded.len(), dataset.len());
        assert_eq!(loaded.schema(), dataset.schema());
    }

    #[test]
    fn test_csv_roundtrip() {
        let dataset = ArrowDataset::from_batch(create_test_batch(0, 10))
            .ok()
            .unwrap_or_else(|| panic!("Should create dataset"));

        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = temp_dir.path().join("test.csv");

        dataset
            .to_csv(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should write csv"));

        let loaded = ArrowDataset::from_csv_with_options(&path, CsvOptions::new().with_batch_size(4))
            .ok()
            .unwrap_or_else(|| panic!("Should load csv"));

        assert_eq!(loaded.len(), 10);
        assert_eq!(loaded.num_batches(), 3);
    }

    #[test]
    fn test_from_csv_str_partitions_by_batch_size() {
        let data = "y\n1\n2\n1\n3\n2\n";
        let dataset = ArrowDataset::from_csv_str(data, 2)
            .ok()
            .unwrap_or_else(|| panic!("Should parse csv"));

        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.num_batches(), 3);
        assert_eq!(dataset.schema().field(0).data_type(), &DataType::Int64);
    }

    #[test]
    fn test_csv_options_default() {
        let options = CsvOptions::default();
        assert!(options.has_header);
        assert!(options.delimiter.is_none());
        assert_eq!(options.batch_size, 8192);
        assert!(options.schema.is_none());
    }

    #[test]
    fn test_csv_options_builder() {
        let options = CsvOptions::new()
            .with_header(false)
            .with_delimiter(b';')
            .with_batch_size(0);

        assert!(!options.has_header);
        assert_eq!(options.delimiter, Some(b';'));
        assert_eq!(options.batch_size, 1);
    }

    #[test]
    fn test_from_parquet_error() {
        let result = ArrowDataset::from_parquet("/nonexistent/path/to/file.parquet");
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_from_csv_error() {
        let result = ArrowDataset::from_csv("/nonexistent/path/to/file.csv");
        assert!(result.is_err());
    }
}
