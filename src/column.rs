// Row counts are tracked as u64 while Arrow works in usize; the conversions
// below never exceed the length of an in-memory array.
#![allow(clippy::cast_possible_truncation)]

//! Partitioned columns.
//!
//! A [`PartitionedColumn`] is the read-only view the split pipeline scans:
//! an ordered list of Arrow arrays, each tagged with the global row offset
//! of its first element. A [`LabelColumn`] is the output side, allocated
//! with exactly the same partitioning and mutated in place partition by
//! partition before being committed back to Arrow.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use arrow::array::Int32Array;
//! use stratasplit::{LabelColumn, PartitionedColumn};
//!
//! let values = Arc::new(Int32Array::from(vec![0, 0, 1, 1, 1]));
//! let column = PartitionedColumn::from_array("y", values, 2).unwrap();
//! assert_eq!(column.num_partitions(), 3);
//! assert_eq!(column.partitions()[2].start(), 4);
//!
//! let labels = LabelColumn::allocate_like(&column);
//! assert_eq!(labels.test_count(), 0);
//! ```

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, DictionaryArray, Int8Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Int8Type, Schema, SchemaRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::ArrowDataset,
    error::{Error, Result},
};

/// Name of the committed label column.
pub const LABEL_COLUMN_NAME: &str = "test_train_split";

/// One contiguous slice of a column with its global starting row.
#[derive(Debug, Clone)]
pub struct Partition {
    start: u64,
    values: ArrayRef,
}

impl Partition {
    /// Global row index of the first value in this partition.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the global row index of the last value.
    pub fn end(&self) -> u64 {
        self.start + self.values.len() as u64
    }

    /// The partition's values.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Number of rows in the partition.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the partition holds no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single logical column split into order-preserving partitions.
///
/// Partitions tile `[0, len)` exactly once: offsets are computed at
/// construction from the partition lengths, so gaps and overlaps cannot be
/// expressed. Empty partitions are allowed.
#[derive(Debug, Clone)]
pub struct PartitionedColumn {
    name: String,
    data_type: DataType,
    partitions: Vec<Partition>,
    len: u64,
}

impl PartitionedColumn {
    /// Builds a column from arrays that are already partitioned.
    ///
    /// # Errors
    ///
    /// Returns an error if no arrays are given or if they disagree on type.
    pub fn from_arrays(name: impl Into<String>, arrays: Vec<ArrayRef>) -> Result<Self> {
        let Some(first) = arrays.first() else {
            return Err(Error::EmptyDataset);
        };
        let data_type = first.data_type().clone();

        let mut partitions = Vec::with_capacity(arrays.len());
        let mut start = 0u64;
        for (i, values) in arrays.into_iter().enumerate() {
            if values.data_type() != &data_type {
                return Err(Error::schema_mismatch(format!(
                    "partition {i} has type {}, expected {data_type}",
                    values.data_type()
                )));
            }
            let len = values.len() as u64;
            partitions.push(Partition { start, values });
            start += len;
        }

        Ok(Self {
            name: name.into(),
            data_type,
            partitions,
            len: start,
        })
    }

    /// Splits one array into partitions of at most `partition_len` rows.
    ///
    /// An empty array yields a single empty partition.
    ///
    /// # Errors
    ///
    /// Returns an error if `partition_len` is zero.
    pub fn from_array(
        name: impl Into<String>,
        array: ArrayRef,
        partition_len: usize,
    ) -> Result<Self> {
        if partition_len == 0 {
            return Err(Error::invalid_argument("partition length must be positive"));
        }

        let total = array.len();
        if total == 0 {
            return Self::from_arrays(name, vec![array]);
        }

        let arrays = (0..total)
            .step_by(partition_len)
            .map(|offset| array.slice(offset, partition_len.min(total - offset)))
            .collect();
        Self::from_arrays(name, arrays)
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared Arrow type shared by every partition.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// The partitions in row order.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Total number of rows.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if the column holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of null values across all partitions.
    ///
    /// For dictionary columns this includes valid keys that point at a null
    /// dictionary value.
    pub fn null_count(&self) -> usize {
        self.partitions
            .iter()
            .map(|p| p.values.logical_nulls().map_or(0, |nulls| nulls.null_count()))
            .sum()
    }

    /// True for dictionary-encoded (categorical) columns.
    pub fn is_categorical(&self) -> bool {
        matches!(self.data_type, DataType::Dictionary(_, _))
    }

    /// True for signed or unsigned Arrow integer columns.
    pub fn is_integer(&self) -> bool {
        self.data_type.is_integer()
    }
}

/// Binary split label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Row belongs to the training group (code 0).
    Train,
    /// Row belongs to the test group (code 1).
    Test,
}

impl Label {
    /// Domain of the committed label column, indexed by code.
    pub const DOMAIN: [&'static str; 2] = ["train", "test"];

    /// Integer code stored in the label column.
    pub fn code(self) -> u8 {
        match self {
            Self::Train => 0,
            Self::Test => 1,
        }
    }

    /// Decodes a stored code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Train),
            1 => Some(Self::Test),
            _ => None,
        }
    }

    /// Display name, `"train"` or `"test"`.
    pub fn as_str(self) -> &'static str {
        Self::DOMAIN[usize::from(self.code())]
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One partition of a [`LabelColumn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPartition {
    start: u64,
    codes: Vec<u8>,
}

impl LabelPartition {
    /// Global row index of the first label.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Label codes, one per row.
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    pub(crate) fn codes_mut(&mut self) -> &mut [u8] {
        &mut self.codes
    }

    fn to_array(&self) -> Result<ArrayRef> {
        #[allow(clippy::cast_possible_wrap)]
        let keys = Int8Array::from_iter_values(self.codes.iter().map(|&c| c as i8));
        let values = Arc::new(StringArray::from(Label::DOMAIN.to_vec()));
        let array = DictionaryArray::<Int8Type>::try_new(keys, values)?;
        Ok(Arc::new(array))
    }
}

/// Output column of a split: one train/test label per input row.
///
/// Allocated with the same partitioning as the input column and every row
/// defaulted to [`Label::Train`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelColumn {
    partitions: Vec<LabelPartition>,
    len: u64,
}

impl LabelColumn {
    /// Allocates an all-train label column partitioned like `column`.
    pub fn allocate_like(column: &PartitionedColumn) -> Self {
        let partitions = column
            .partitions()
            .iter()
            .map(|p| LabelPartition {
                start: p.start(),
                codes: vec![Label::Train.code(); p.len()],
            })
            .collect();
        Self {
            partitions,
            len: column.len(),
        }
    }

    /// Total number of labels.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Partitions in row order.
    pub fn partitions(&self) -> &[LabelPartition] {
        &self.partitions
    }

    pub(crate) fn partitions_mut(&mut self) -> &mut [LabelPartition] {
        &mut self.partitions
    }

    /// Label of a global row, or `None` if out of range.
    pub fn label(&self, row: u64) -> Option<Label> {
        let idx = self.partitions.partition_point(|p| p.start <= row);
        let partition = self.partitions[..idx]
            .iter()
            .rev()
            .find(|p| !p.codes.is_empty())?;
        let local = usize::try_from(row - partition.start).ok()?;
        partition.codes.get(local).copied().and_then(Label::from_code)
    }

    /// Iterates labels in row order.
    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        self.partitions
            .iter()
            .flat_map(|p| p.codes.iter())
            .map(|&c| if c == Label::Test.code() { Label::Test } else { Label::Train })
    }

    /// Number of rows labeled test.
    pub fn test_count(&self) -> usize {
        self.iter().filter(|&l| l == Label::Test).count()
    }

    /// Number of rows labeled train.
    pub fn train_count(&self) -> usize {
        self.iter().filter(|&l| l == Label::Train).count()
    }

    /// Global indices of rows with the given label, ascending.
    pub fn indices_of(&self, label: Label) -> Vec<u64> {
        self.iter()
            .zip(0u64..)
            .filter(|&(l, _)| l == label)
            .map(|(_, row)| row)
            .collect()
    }

    /// Schema of the committed label column.
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new(
            LABEL_COLUMN_NAME,
            DataType::Dictionary(Box::new(DataType::Int8), Box::new(DataType::Utf8)),
            false,
        )]))
    }

    /// Commits the labels as a single dictionary array over `["train", "test"]`.
    ///
    /// # Errors
    ///
    /// Returns an error if Arrow rejects the dictionary.
    pub fn to_array(&self) -> Result<ArrayRef> {
        let arrays = self
            .partitions
            .iter()
            .map(LabelPartition::to_array)
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&dyn Array> = arrays.iter().map(AsRef::as_ref).collect();
        Ok(arrow::compute::concat(&refs)?)
    }

    /// Commits the labels as a dataset with one batch per partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the label column has no partitions.
    pub fn commit(&self) -> Result<ArrowDataset> {
        let schema = Self::schema();
        let batches = self
            .partitions
            .iter()
            .map(|p| Ok(RecordBatch::try_new(Arc::clone(&schema), vec![p.to_array()?])?))
            .collect::<Result<Vec<_>>>()?;
        ArrowDataset::new(batches)
    }
}
