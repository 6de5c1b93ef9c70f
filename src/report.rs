// Ratios over row counts; precision loss is acceptable
#![allow(clippy::cast_precision_loss)]

//! Split reports.
//!
//! A [`SplitReport`] records what one split invocation did: the seed that
//! was actually used (including one drawn from entropy), and per class how
//! many rows it had and how many went to test. It carries no row data and
//! serializes to JSON for audit trails.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ClassDomain, ClassId},
    error::Result,
    scan::ClassIndices,
};

/// Per-class outcome of a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    /// Class id.
    pub class_id: ClassId,
    /// Category or integer value of the class.
    pub label: String,
    /// Rows of this class.
    pub rows: u64,
    /// Rows of this class assigned to test.
    pub test_rows: u64,
}

/// Summary of one split invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitReport {
    /// Seed the sampler ran with.
    pub seed: u64,
    /// Requested test fraction.
    pub test_frac: f64,
    /// Rows in the column.
    pub total_rows: u64,
    /// Rows labeled test.
    pub test_rows: u64,
    /// Per-class summaries, indexed by class id.
    pub classes: Vec<ClassSummary>,
}

impl SplitReport {
    /// Builds a report from the collected indices and sampled selections.
    pub fn new(
        seed: u64,
        test_frac: f64,
        domain: &ClassDomain,
        indices: &ClassIndices,
        selections: &[Vec<u64>],
    ) -> Self {
        let classes: Vec<ClassSummary> = indices
            .lists()
            .iter()
            .zip(selections)
            .zip(0..)
            .map(|((rows, selected), class_id)| ClassSummary {
                class_id,
                label: domain.label(class_id).unwrap_or_default(),
                rows: rows.len() as u64,
                test_rows: selected.len() as u64,
            })
            .collect();

        Self {
            seed,
            test_frac,
            total_rows: classes.iter().map(|c| c.rows).sum(),
            test_rows: classes.iter().map(|c| c.test_rows).sum(),
            classes,
        }
    }

    /// Rows labeled train.
    pub fn train_rows(&self) -> u64 {
        self.total_rows - self.test_rows
    }

    /// Fraction of all rows that went to test.
    pub fn effective_test_ratio(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.test_rows as f64 / self.total_rows as f64
    }

    /// Classes with at least one row.
    pub fn non_empty_classes(&self) -> impl Iterator<Item = &ClassSummary> {
        self.classes.iter().filter(|c| c.rows > 0)
    }

    /// Serializes to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserializes from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid report.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
