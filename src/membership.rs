//! Test-row membership and label assignment.
//!
//! After sampling, the per-class selections are unioned into one
//! [`MembershipSet`]. The set is frozen behind an [`Arc`] and the same
//! handle is read by every label-assignment task, so phase five never
//! writes shared state.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::{
    column::{Label, LabelColumn},
    parallel::PartitionExecutor,
};

/// Global rows selected for the test group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    rows: FxHashSet<u64>,
}

impl MembershipSet {
    /// Unions per-class selections.
    pub fn from_selections<I>(selections: I) -> Self
    where
        I: IntoIterator<Item = Vec<u64>>,
    {
        let mut rows = FxHashSet::default();
        for selection in selections {
            rows.extend(selection);
        }
        Self { rows }
    }

    /// True if `row` was selected for test.
    pub fn contains(&self, row: u64) -> bool {
        self.rows.contains(&row)
    }

    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if no row was selected.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Freezes the set into a shared read-only handle.
    pub fn broadcast(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Marks every row in `membership` as test, one task per partition.
///
/// Rows not in the set keep their current label, which is train for a
/// freshly allocated column.
pub fn assign_labels(
    labels: &mut LabelColumn,
    membership: &Arc<MembershipSet>,
    executor: &PartitionExecutor,
) {
    if membership.is_empty() {
        return;
    }
    executor.for_each_mut(labels.partitions_mut(), |partition| {
        let start = partition.start();
        for (row, code) in (start..).zip(partition.codes_mut().iter_mut()) {
            if membership.contains(row) {
                *code = Label::Test.code();
            }
        }
    });
}
