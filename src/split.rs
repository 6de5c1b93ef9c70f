// Allow casts for size calculations - these are intentional and safe for
// dataset sizes
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

//! Stratified train/test splitting.
//!
//! [`StratifiedSplit`] drives the whole pipeline over one
//! [`PartitionedColumn`]:
//!
//! 1. validate the column and fraction (no partition work on failure);
//! 2. resolve the class domain;
//! 3. resolve the seed, drawing one from entropy when none is set;
//! 4. allocate an all-train [`LabelColumn`];
//! 5. scan and merge per-class row indices;
//! 6. sample each class and union the picks into a [`MembershipSet`];
//! 7. stamp test labels partition by partition.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use arrow::array::Int32Array;
//! use stratasplit::{stratified_split, PartitionedColumn};
//!
//! let values = Arc::new(Int32Array::from(vec![0, 0, 0, 1, 1, 1, 1]));
//! let column = PartitionedColumn::from_array("y", values, 3).unwrap();
//!
//! let labels = stratified_split(&column, 0.5, 42).unwrap();
//! assert_eq!(labels.len(), 7);
//! assert_eq!(labels.test_count(), 4);
//! ```

use std::sync::Arc;

use arrow::array::{Array, RecordBatch, UInt64Array};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    column::{Label, LabelColumn, PartitionedColumn},
    dataset::{ArrowDataset, Dataset},
    domain::ClassDomain,
    error::{Error, Result},
    membership::{assign_labels, MembershipSet},
    parallel::PartitionExecutor,
    report::SplitReport,
    sampler::StratifiedSampler,
    scan::collect_class_indices,
};

/// Seed value that asks for a fresh, non-reproducible seed.
pub const UNSEEDED: i64 = -1;

/// Configuration of a stratified split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratifiedSplit {
    test_frac: f64,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    num_workers: usize,
}

/// Labels and report produced by [`StratifiedSplit::run`].
#[derive(Debug, Clone)]
pub struct SplitOutput {
    /// One train/test label per input row.
    pub labels: LabelColumn,
    /// What the split did.
    pub report: SplitReport,
}

impl StratifiedSplit {
    /// Creates an unseeded, single-threaded split with the given test fraction.
    pub fn new(test_frac: f64) -> Self {
        Self {
            test_frac,
            seed: None,
            num_workers: 0,
        }
    }

    /// Creates a split from an `i64` seed where [`UNSEEDED`] (`-1`) means
    /// "draw a fresh seed".
    ///
    /// Other negative seeds are used as their two's complement bits.
    pub fn from_sentinel_seed(test_frac: f64, seed: i64) -> Self {
        let split = Self::new(test_frac);
        if seed == UNSEEDED {
            split
        } else {
            split.seed(seed as u64)
        }
    }

    /// Sets the random seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the number of worker threads (0 = calling thread only).
    #[must_use]
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    /// Returns the test fraction.
    pub fn get_test_frac(&self) -> f64 {
        self.test_frac
    }

    /// Returns the seed, if one is set.
    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the number of workers.
    pub fn get_num_workers(&self) -> usize {
        self.num_workers
    }

    /// Serializes the configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid configuration.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Splits `column`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the fraction is outside `[0, 1]`, the
    ///   column is neither categorical nor integer, or it contains nulls.
    ///   Nothing is scheduled in that case.
    /// - [`Error::Classification`] if a row cannot be mapped to its class.
    /// - [`Error::SamplingExhaustion`] if a class has too few distinct rows.
    pub fn run(&self, column: &PartitionedColumn) -> Result<SplitOutput> {
        validate_fraction(self.test_frac)?;
        validate_column(column)?;

        let executor = PartitionExecutor::new(self.num_workers)?;
        let domain = ClassDomain::resolve(column, &executor)?;
        debug!(
            column = column.name(),
            classes = domain.len(),
            categorical = domain.is_categorical(),
            "resolved class domain"
        );

        let seed = self.seed.unwrap_or_else(fresh_seed);
        let sampler = StratifiedSampler::new(self.test_frac, seed)?;

        let mut labels = LabelColumn::allocate_like(column);

        let mut indices = collect_class_indices(column, &domain, &executor)?;
        indices.sort();

        let selections = sampler.sample_all(&indices, &executor)?;
        let report = SplitReport::new(seed, self.test_frac, &domain, &indices, &selections);
        drop(indices);

        let membership = MembershipSet::from_selections(selections).broadcast();
        debug!(test_rows = membership.len(), "built membership set");

        assign_labels(&mut labels, &membership, &executor);

        info!(
            column = column.name(),
            rows = column.len(),
            partitions = column.num_partitions(),
            classes = domain.len(),
            test_rows = report.test_rows,
            seed,
            workers = executor.num_workers(),
            "stratified split complete"
        );

        Ok(SplitOutput { labels, report })
    }

    /// Splits the columns selected from `dataset`; exactly one is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless exactly one column is
    /// selected, [`Error::ColumnNotFound`] if it does not exist, and any
    /// error of [`Self::run`].
    pub fn run_on_dataset(&self, dataset: &ArrowDataset, columns: &[&str]) -> Result<SplitOutput> {
        let [name] = columns else {
            return Err(Error::invalid_argument(format!(
                "Must give a single column to stratify against. Got: {} columns.",
                columns.len()
            )));
        };
        let column = dataset.column(name)?;
        self.run(&column)
    }
}

/// Builder for split configuration.
#[derive(Debug, Default)]
pub struct StratifiedSplitBuilder {
    test_frac: Option<f64>,
    seed: Option<u64>,
    num_workers: Option<usize>,
}

impl StratifiedSplitBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the test fraction.
    #[must_use]
    pub fn test_frac(mut self, frac: f64) -> Self {
        self.test_frac = Some(frac);
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the number of workers.
    #[must_use]
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.num_workers = Some(workers);
        self
    }

    /// Builds the split configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the test fraction is missing or outside `[0, 1]`.
    pub fn build(self) -> Result<StratifiedSplit> {
        let test_frac = self
            .test_frac
            .ok_or_else(|| Error::invalid_argument("test_frac is required"))?;
        validate_fraction(test_frac)?;

        let mut split = StratifiedSplit::new(test_frac);
        if let Some(seed) = self.seed {
            split = split.seed(seed);
        }
        if let Some(workers) = self.num_workers {
            split = split.num_workers(workers);
        }
        Ok(split)
    }
}

/// Splits `column` into train/test labels, stratified by its values.
///
/// `seed == -1` draws a fresh seed for this call only; any other value makes
/// the result reproducible.
///
/// # Errors
///
/// See [`StratifiedSplit::run`].
pub fn stratified_split(column: &PartitionedColumn, test_frac: f64, seed: i64) -> Result<LabelColumn> {
    StratifiedSplit::from_sentinel_seed(test_frac, seed)
        .run(column)
        .map(|output| output.labels)
}

fn validate_fraction(test_frac: f64) -> Result<()> {
    if (0.0..=1.0).contains(&test_frac) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "test_frac must be within [0, 1], got {test_frac}"
        )))
    }
}

fn validate_column(column: &PartitionedColumn) -> Result<()> {
    if !(column.is_categorical() || column.is_integer()) {
        return Err(Error::invalid_argument(format!(
            "stratification only applies to integer and categorical columns. Got: {}",
            column.data_type()
        )));
    }
    let nulls = column.null_count();
    if nulls > 0 {
        return Err(Error::invalid_argument(format!(
            "column '{}' has {nulls} null values; every row needs a class",
            column.name()
        )));
    }
    Ok(())
}

fn fresh_seed() -> u64 {
    StdRng::from_entropy().next_u64()
}

/// A dataset materialized into its train and test rows.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    /// Training dataset
    pub train: ArrowDataset,
    /// Test/holdout dataset
    pub test: ArrowDataset,
}

impl DatasetSplit {
    /// Create train/test split
    pub fn new(train: ArrowDataset, test: ArrowDataset) -> Self {
        Self { train, test }
    }

    /// Get training data
    pub fn train(&self) -> &ArrowDataset {
        &self.train
    }

    /// Get test data
    pub fn test(&self) -> &ArrowDataset {
        &self.test
    }

    /// Separates the rows of `dataset` according to `labels`.
    ///
    /// Row order is preserved on both sides.
    ///
    /// # Errors
    ///
    /// Returns an error if the label column length differs from the dataset.
    pub fn from_labels(dataset: &ArrowDataset, labels: &LabelColumn) -> Result<Self> {
        if labels.len() != dataset.len() as u64 {
            return Err(Error::schema_mismatch(format!(
                "label column has {} rows, dataset has {}",
                labels.len(),
                dataset.len()
            )));
        }

        let batch = concatenate_batches(dataset)?;
        let train = take_indices(&batch, &labels.indices_of(Label::Train))?;
        let test = take_indices(&batch, &labels.indices_of(Label::Test))?;

        Ok(Self {
            train: ArrowDataset::from_batch(train)?,
            test: ArrowDataset::from_batch(test)?,
        })
    }

    /// Stratified split of a dataset by one column.
    ///
    /// # Arguments
    /// * `dataset` - Source dataset to split
    /// * `label_column` - Name of the column to stratify by
    /// * `test_frac` - Fraction of each class that goes to test
    /// * `seed` - Optional random seed
    ///
    /// # Errors
    /// Returns error if the column is not found, has an unsupported type,
    /// or the fraction is invalid
    pub fn stratified(
        dataset: &ArrowDataset,
        label_column: &str,
        test_frac: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut split = StratifiedSplit::new(test_frac);
        if let Some(seed) = seed {
            split = split.seed(seed);
        }
        let output = split.run_on_dataset(dataset, &[label_column])?;
        Self::from_labels(dataset, &output.labels)
    }
}

/// Concatenate all batches from a dataset into a single batch
fn concatenate_batches(dataset: &ArrowDataset) -> Result<RecordBatch> {
    use arrow::compute::concat_batches;

    match dataset.batches() {
        [single] => Ok(single.clone()),
        batches => Ok(concat_batches(&dataset.schema(), batches)?),
    }
}

/// Take rows at given indices from a batch
fn take_indices(batch: &RecordBatch, indices: &[u64]) -> Result<RecordBatch> {
    use arrow::compute::take;

    let indices_array = UInt64Array::from(indices.to_vec());

    let columns: Vec<Arc<dyn Array>> = batch
        .columns()
        .iter()
        .map(|col| take(col.as_ref(), &indices_array, None).map_err(Error::Arrow))
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use arrow::{
        array::{ArrayRef, DictionaryArray, Float64Array, Int32Array, Int64Array, StringArray},
        datatypes::{DataType, Field, Int32Type, Schema},
    };

    use super::*;

    fn int_column(values: Vec<i32>, partition_len: usize) -> PartitionedColumn {
        PartitionedColumn::from_array("y", Arc::new(Int32Array::from(values)), partition_len)
            .expect("column")
    }

    /// Helper to create a test dataset with n samples and 3 classes
    fn make_test_dataset(n: usize, batch_len: usize) -> ArrowDataset {
        let schema = Arc::new(Schema::new(vec![
            Field::new("feature", DataType::Float64, false),
            Field::new("label", DataType::Int32, false),
        ]));

        let batches = (0..n)
            .step_by(batch_len)
            .map(|start| {
                let end = (start + batch_len).min(n);
                let features: Vec<f64> = (start..end).map(|i| i as f64).collect();
                let labels: Vec<i32> = (start..end).map(|i| (i % 3) as i32).collect();
                RecordBatch::try_new(
                    Arc::clone(&schema),
                    vec![
                        Arc::new(Float64Array::from(features)),
                        Arc::new(Int32Array::from(labels)),
                    ],
                )
                .expect("batch creation failed")
            })
            .collect();

        ArrowDataset::new(batches).expect("dataset creation failed")
    }

    // ========== Orchestrator scenarios ==========

    #[test]
    fn test_two_class_scenario() {
        let column = int_column(vec![0, 0, 0, 1, 1, 1, 1], 2);
        let output = StratifiedSplit::new(0.5).seed(7).run(&column).expect("split");

        assert_eq!(output.labels.len(), 7);
        assert_eq!(output.labels.test_count(), 4);
        assert_eq!(output.report.classes[0].test_rows, 2);
        assert_eq!(output.report.classes[1].test_rows, 2);

        let test_rows = output.labels.indices_of(Label::Test);
        assert_eq!(test_rows.iter().filter(|&&r| r < 3).count(), 2);
        assert_eq!(test_rows.iter().filter(|&&r| r >= 3).count(), 2);
    }

    #[test]
    fn test_single_class_scenario() {
        let column = int_column(vec![5; 10], 4);
        let labels = stratified_split(&column, 0.1, 3).expect("split");
        assert_eq!(labels.test_count(), 1);
        assert_eq!(labels.train_count(), 9);
    }

    #[test]
    fn test_zero_fraction_one_per_class() {
        let column = int_column((0..60).map(|i| i % 4).collect(), 7);
        let output = StratifiedSplit::new(0.0).seed(1).run(&column).expect("split");
        assert_eq!(output.labels.test_count(), 4);
        assert!(output.report.classes.iter().all(|c| c.test_rows == 1));
    }

    #[test]
    fn test_full_fraction_all_test() {
        let column = int_column((0..25).map(|i| i % 3).collect(), 6);
        let labels = stratified_split(&column, 1.0, 9).expect("split");
        assert_eq!(labels.test_count(), 25);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let column = int_column((0..500).map(|i| (i * 31) % 7).collect(), 64);
        let a = stratified_split(&column, 0.3, 2024).expect("split");
        let b = stratified_split(&column, 0.3, 2024).expect("split");
        assert_eq!(a, b);
        assert_eq!(&*a.to_array().expect("array"), &*b.to_array().expect("array"));
    }

    #[test]
    fn test_independent_of_workers_and_partitioning() {
        let values: Vec<i32> = (0..400).map(|i| (i * 13) % 5).collect();
        let reference = StratifiedSplit::new(0.2)
            .seed(55)
            .run(&int_column(values.clone(), 400))
            .expect("split");

        for (partition_len, workers) in [(1, 0), (17, 2), (64, 4), (399, 3)] {
            let output = StratifiedSplit::new(0.2)
                .seed(55)
                .num_workers(workers)
                .run(&int_column(values.clone(), partition_len))
                .expect("split");
            assert_eq!(
                output.labels.indices_of(Label::Test),
                reference.labels.indices_of(Label::Test)
            );
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let column = int_column((0..300).map(|i| i % 2).collect(), 50);
        let a = stratified_split(&column, 0.5, 1).expect("split");
        let b = stratified_split(&column, 0.5, 2).expect("split");
        assert_eq!(a.test_count(), b.test_count());
        assert_ne!(a.indices_of(Label::Test), b.indices_of(Label::Test));
    }

    #[test]
    fn test_unseeded_reports_drawn_seed() {
        let column = int_column((0..200).map(|i| i % 4).collect(), 30);
        let output = StratifiedSplit::from_sentinel_seed(0.2, UNSEEDED)
            .run(&column)
            .expect("split");
        assert_eq!(output.labels.test_count(), 40);

        let replay = StratifiedSplit::new(0.2)
            .seed(output.report.seed)
            .run(&column)
            .expect("split");
        assert_eq!(replay.labels, output.labels);
    }

    #[test]
    fn test_sentinel_seed_mapping() {
        assert_eq!(StratifiedSplit::from_sentinel_seed(0.2, -1).get_seed(), None);
        assert_eq!(StratifiedSplit::from_sentinel_seed(0.2, 42).get_seed(), Some(42));
        assert_eq!(
            StratifiedSplit::from_sentinel_seed(0.2, -2).get_seed(),
            Some(u64::MAX - 1)
        );
    }

    #[test]
    fn test_empty_partitions_do_not_change_counts() {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(Vec::<i32>::new())),
            Arc::new(Int32Array::from(vec![0, 0, 0])),
            Arc::new(Int32Array::from(Vec::<i32>::new())),
            Arc::new(Int32Array::from(vec![1, 1, 1, 1])),
            Arc::new(Int32Array::from(Vec::<i32>::new())),
        ];
        let column = PartitionedColumn::from_arrays("y", arrays).expect("column");
        let output = StratifiedSplit::new(0.5)
            .seed(7)
            .num_workers(2)
            .run(&column)
            .expect("split");

        assert_eq!(output.labels.partitions().len(), 5);
        assert_eq!(output.labels.test_count(), 4);
    }

    #[test]
    fn test_categorical_column() {
        let keys = Int32Array::from(vec![0, 1, 1, 0, 1, 1, 1, 1]);
        let values = Arc::new(StringArray::from(vec!["spam", "ham", "unused"]));
        let dict: ArrayRef =
            Arc::new(DictionaryArray::<Int32Type>::try_new(keys, values).expect("dictionary"));
        let column = PartitionedColumn::from_array("y", dict, 3).expect("column");

        let output = StratifiedSplit::new(0.5).seed(4).run(&column).expect("split");
        assert_eq!(output.report.classes.len(), 3);
        assert_eq!(output.report.classes[0].label, "spam");
        assert_eq!(output.report.classes[0].test_rows, 1);
        assert_eq!(output.report.classes[1].test_rows, 3);
        assert_eq!(output.report.classes[2].rows, 0);
        assert_eq!(output.report.classes[2].test_rows, 0);
        assert_eq!(output.labels.test_count(), 4);
    }

    #[test]
    fn test_empty_categorical_partitions() {
        let dict = |keys: Vec<i32>, values: Vec<&str>| -> ArrayRef {
            Arc::new(
                DictionaryArray::<Int32Type>::try_new(
                    Int32Array::from(keys),
                    Arc::new(StringArray::from(values)),
                )
                .expect("dictionary"),
            )
        };
        let column = PartitionedColumn::from_arrays(
            "y",
            vec![
                dict(vec![0, 1, 0], vec!["a", "b"]),
                dict(vec![], vec![]),
                dict(vec![1, 0], vec!["a", "b"]),
                dict(vec![], vec![]),
            ],
        )
        .expect("column");

        let output = StratifiedSplit::new(0.5)
            .seed(11)
            .num_workers(2)
            .run(&column)
            .expect("split");
        assert_eq!(output.labels.partitions().len(), 4);
        assert_eq!(output.labels.len(), 5);
        assert_eq!(output.report.classes[0].rows, 3);
        assert_eq!(output.report.classes[0].test_rows, 2);
        assert_eq!(output.report.classes[1].rows, 2);
        assert_eq!(output.report.classes[1].test_rows, 1);
        assert_eq!(output.labels.test_count(), 3);
    }

    // ========== Validation tests ==========

    #[test]
    fn test_rejects_null_dictionary_values() {
        let keys = Int32Array::from(vec![0, 1, 0, 1]);
        let values = Arc::new(StringArray::from(vec![Some(""), None]));
        let array: ArrayRef =
            Arc::new(DictionaryArray::<Int32Type>::try_new(keys, values).expect("dictionary"));
        let column = PartitionedColumn::from_array("y", array, 2).expect("column");

        let err = stratified_split(&column, 0.5, 1).expect_err("null category");
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("2 null values"));
    }

    #[test]
    fn test_rejects_float_column() {
        let column =
            PartitionedColumn::from_array("x", Arc::new(Float64Array::from(vec![1.0, 2.0])), 1)
                .expect("column");
        let result = stratified_split(&column, 0.5, 1);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_rejects_string_column() {
        let column = PartitionedColumn::from_array(
            "x",
            Arc::new(StringArray::from(vec!["a", "b"])),
            1,
        )
        .expect("column");
        assert!(stratified_split(&column, 0.5, 1).is_err());
    }

    #[test]
    fn test_rejects_nulls() {
        let column = PartitionedColumn::from_array(
            "y",
            Arc::new(Int64Array::from(vec![Some(1), None])),
            1,
        )
        .expect("column");
        let err = stratified_split(&column, 0.5, 1).expect_err("nulls");
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn test_rejects_fraction_out_of_range() {
        let column = int_column(vec![0, 1], 1);
        for frac in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            let result = stratified_split(&column, frac, 1);
            assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        }
    }

    #[test]
    fn test_run_on_dataset_requires_one_column() {
        let dataset = make_test_dataset(30, 10);
        let split = StratifiedSplit::new(0.2).seed(1);

        let none = split.run_on_dataset(&dataset, &[]);
        assert!(matches!(none, Err(Error::InvalidArgument { .. })));

        let two = split.run_on_dataset(&dataset, &["label", "feature"]);
        let err = two.expect_err("two columns");
        assert!(err.to_string().contains("Got: 2 columns"));

        let missing = split.run_on_dataset(&dataset, &["nope"]);
        assert!(matches!(missing, Err(Error::ColumnNotFound { .. })));

        let ok = split.run_on_dataset(&dataset, &["label"]).expect("split");
        assert_eq!(ok.labels.len(), 30);
        assert_eq!(ok.labels.partitions().len(), 3);
    }

    // ========== Config tests ==========

    #[test]
    fn test_builder() {
        let split = StratifiedSplitBuilder::new()
            .test_frac(0.3)
            .seed(8)
            .num_workers(2)
            .build()
            .expect("build");
        assert_eq!(split.get_test_frac(), 0.3);
        assert_eq!(split.get_seed(), Some(8));
        assert_eq!(split.get_num_workers(), 2);
    }

    #[test]
    fn test_builder_validates() {
        assert!(StratifiedSplitBuilder::new().build().is_err());
        assert!(StratifiedSplitBuilder::new().test_frac(2.0).build().is_err());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let split = StratifiedSplit::new(0.25).seed(3).num_workers(4);
        let json = split.to_json().expect("json");
        assert_eq!(StratifiedSplit::from_json(&json).expect("parse"), split);

        let minimal = StratifiedSplit::from_json(br#"{"test_frac": 0.1}"#).expect("parse");
        assert_eq!(minimal.get_seed(), None);
        assert_eq!(minimal.get_num_workers(), 0);
    }

    // ========== DatasetSplit tests ==========

    #[test]
    fn test_new_creates_split() {
        let split = DatasetSplit::new(make_test_dataset(80, 80), make_test_dataset(20, 20));
        assert_eq!(split.train().len(), 80);
        assert_eq!(split.test().len(), 20);
    }

    #[test]
    fn test_stratified_preserves_class_distribution() {
        let dataset = make_test_dataset(90, 25);
        let split = DatasetSplit::stratified(&dataset, "label", 0.2, Some(42)).expect("split");

        assert_eq!(split.train().len() + split.test().len(), 90);
        assert_eq!(split.test().len(), 18);

        let mut test_counts = [0usize; 3];
        for batch in split.test().iter() {
            let labels = batch
                .column(1)
                .as_any()
                .downcast_ref::<Int32Array>()
                .expect("downcast");
            for val in labels.iter().flatten() {
                test_counts[val as usize] += 1;
            }
        }
        assert_eq!(test_counts, [6, 6, 6]);
    }

    #[test]
    fn test_split_no_data_overlap() {
        let dataset = make_test_dataset(100, 30);
        let split = DatasetSplit::stratified(&dataset, "label", 0.3, Some(42)).expect("split");

        let mut train_set: HashSet<u64> = HashSet::new();
        for batch in split.train().iter() {
            let features = batch
                .column(0)
                .as_any()
                .downcast_ref::<Float64Array>()
                .expect("downcast");
            for val in features.iter().flatten() {
                train_set.insert(val.to_bits());
            }
        }

        for batch in split.test().iter() {
            let features = batch
                .column(0)
                .as_any()
                .downcast_ref::<Float64Array>()
                .expect("downcast");
            for val in features.iter().flatten() {
                assert!(
                    !train_set.contains(&val.to_bits()),
                    "Found overlapping value {val} in train and test"
                );
            }
        }
    }

    #[test]
    fn test_split_preserves_schema() {
        let dataset = make_test_dataset(40, 40);
        let split = DatasetSplit::stratified(&dataset, "label", 0.25, Some(1)).expect("split");
        assert_eq!(split.train().schema(), dataset.schema());
        assert_eq!(split.test().schema(), dataset.schema());
    }

    #[test]
    fn test_from_labels_rejects_length_mismatch() {
        let dataset = make_test_dataset(10, 10);
        let labels = LabelColumn::allocate_like(&int_column(vec![0; 4], 4));
        let result = DatasetSplit::from_labels(&dataset, &labels);
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_full_fraction_leaves_empty_train() {
        let dataset = make_test_dataset(12, 5);
        let split = DatasetSplit::stratified(&dataset, "label", 1.0, Some(3)).expect("split");
        assert_eq!(split.train().len(), 0);
        assert_eq!(split.test().len(), 12);
    }

    #[test]
    fn test_stratified_rejects_missing_column() {
        let dataset = make_test_dataset(10, 10);
        let result = DatasetSplit::stratified(&dataset, "nonexistent", 0.2, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_stratified_rejects_feature_column() {
        let dataset = make_test_dataset(10, 10);
        let result = DatasetSplit::stratified(&dataset, "feature", 0.2, None);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }
}
