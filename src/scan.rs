//! Per-class row index collection.
//!
//! Phase one of a split: every partition is scanned independently into a
//! [`ClassIndices`] holding, per class, the global rows of that class inside
//! the partition. Partition results are then merged pairwise by
//! concatenation, which is associative and commutative with respect to
//! membership, so partitions may finish in any order.

use tracing::debug;

use crate::{
    column::{Partition, PartitionedColumn},
    domain::{ClassDomain, ClassId},
    error::{Error, Result},
    parallel::PartitionExecutor,
};

/// Global row indices grouped by class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIndices {
    lists: Vec<Vec<u64>>,
}

impl ClassIndices {
    /// Empty lists for `num_classes` classes; the identity of [`Self::merge`].
    pub fn new(num_classes: usize) -> Self {
        Self {
            lists: vec![Vec::new(); num_classes],
        }
    }

    /// Builds indices directly from per-class lists.
    pub fn from_lists(lists: Vec<Vec<u64>>) -> Self {
        Self { lists }
    }

    /// Scans one partition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Classification`] if a row's class falls outside
    /// `[0, domain.len())` or the row cannot be classified at all.
    pub fn scan(partition_index: usize, partition: &Partition, domain: &ClassDomain) -> Result<Self> {
        let num_classes = domain.len();
        let mut indices = Self::new(num_classes);
        let start = partition.start();

        domain.classify(partition_index, partition, |local, class| {
            let row = start + local as u64;
            let list = usize::try_from(class)
                .ok()
                .and_then(|c| indices.lists.get_mut(c))
                .ok_or_else(|| {
                    Error::classification(
                        row,
                        format!("class {class} outside [0, {num_classes})"),
                    )
                })?;
            list.push(row);
            Ok(())
        })?;

        Ok(indices)
    }

    /// Concatenates `other` into `self`, class by class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Classification`] if the operands were built for a
    /// different number of classes.
    pub fn merge(mut self, other: Self) -> Result<Self> {
        if self.lists.len() != other.lists.len() {
            let row = other.lists.iter().flatten().next().copied().unwrap_or(0);
            return Err(Error::classification(
                row,
                format!(
                    "cannot merge index lists for {} classes into {}",
                    other.lists.len(),
                    self.lists.len()
                ),
            ));
        }
        for (mine, theirs) in self.lists.iter_mut().zip(other.lists) {
            if mine.is_empty() {
                *mine = theirs;
            } else {
                mine.extend(theirs);
            }
        }
        Ok(self)
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.lists.len()
    }

    /// Rows of one class.
    pub fn class(&self, class: ClassId) -> &[u64] {
        usize::try_from(class)
            .ok()
            .and_then(|c| self.lists.get(c))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All per-class lists, indexed by class id.
    pub fn lists(&self) -> &[Vec<u64>] {
        &self.lists
    }

    /// Row count per class.
    pub fn class_sizes(&self) -> Vec<usize> {
        self.lists.iter().map(Vec::len).collect()
    }

    /// Total rows across all classes.
    pub fn total_rows(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    /// Sorts every list so sampling does not depend on merge order.
    pub fn sort(&mut self) {
        for list in &mut self.lists {
            list.sort_unstable();
        }
    }
}

/// Scans every partition of `column` and reduces to global per-class lists.
///
/// # Errors
///
/// Fails if any partition fails to scan; partial results are dropped.
pub fn collect_class_indices(
    column: &PartitionedColumn,
    domain: &ClassDomain,
    executor: &PartitionExecutor,
) -> Result<ClassIndices> {
    let num_classes = domain.len();
    let indices = executor.try_map_reduce(
        column.partitions(),
        |i, partition| ClassIndices::scan(i, partition, domain),
        || ClassIndices::new(num_classes),
        ClassIndices::merge,
    )?;
    debug!(
        column = column.name(),
        partitions = column.num_partitions(),
        classes = num_classes,
        rows = indices.total_rows(),
        "collected class indices"
    );
    Ok(indices)
}
