//! stratasplit - Deterministic Stratified Train/Test Splitting
//!
//! Labels every row of a partitioned Arrow column as `train` or `test` so
//! that each class (distinct integer value or category) contributes
//! `max(round(rows * test_frac), 1)` rows to the test group.
//!
//! # Design Principles
//!
//! 1. **Deterministic** - Same seed, same labels, regardless of worker
//!    count or partitioning
//! 2. **Partition-parallel** - Scan and labeling run one task per partition
//! 3. **Zero-copy** - Arrow arrays in, Arrow dictionary labels out
//! 4. **Ecosystem aligned** - Arrow 53, Parquet 53
//!
//! # Quick Start
//!
//! ```no_run
//! use stratasplit::{ArrowDataset, Dataset, StratifiedSplit};
//!
//! let dataset = ArrowDataset::from_parquet("data/train.parquet").unwrap();
//!
//! let output = StratifiedSplit::new(0.2)
//!     .seed(42)
//!     .num_workers(4)
//!     .run_on_dataset(&dataset, &["label"])
//!     .unwrap();
//!
//! println!(
//!     "{} of {} rows go to test",
//!     output.report.test_rows,
//!     dataset.len()
//! );
//! output.labels.commit().unwrap().to_parquet("data/split.parquet").unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::redundant_clone,
        clippy::needless_collect,
        clippy::too_many_lines,
        clippy::float_cmp,
        clippy::similar_names,
        clippy::unreadable_literal
    )
)]
// Allow some pedantic lints for cleaner code
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::map_unwrap_or)]

pub mod column;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod membership;
pub mod parallel;
pub mod report;
pub mod sampler;
pub mod scan;
pub mod split;

// Re-exports for convenience
pub use arrow::{
    array::{ArrayRef, RecordBatch},
    datatypes::{Schema, SchemaRef},
};
pub use column::{Label, LabelColumn, LabelPartition, Partition, PartitionedColumn, LABEL_COLUMN_NAME};
pub use dataset::{ArrowDataset, CsvOptions, Dataset};
pub use domain::{ClassDomain, ClassId};
pub use error::{Error, Result};
pub use membership::{assign_labels, MembershipSet};
pub use parallel::PartitionExecutor;
pub use report::{ClassSummary, SplitReport};
pub use sampler::{class_seed, test_count, StratifiedSampler};
pub use scan::{collect_class_indices, ClassIndices};
pub use split::{
    stratified_split, DatasetSplit, SplitOutput, StratifiedSplit, StratifiedSplitBuilder,
    UNSEEDED,
};
