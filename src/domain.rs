//! Class domains.
//!
//! A [`ClassDomain`] maps every raw value of a stratification column to a
//! [`ClassId`] in `[0, len)`:
//!
//! - categorical (dictionary-encoded) columns use the category code; the
//!   first partition's dictionary fixes codes `0..k`, categories that only
//!   appear in later dictionaries are appended in first-seen order, and each
//!   partition gets a key remap table;
//! - integer columns use the rank of the value among the column's sorted
//!   distinct values, discovered with a partition-parallel pass.

use std::collections::BTreeSet;

use arrow::{
    array::{Array, AsArray},
    compute::cast,
    datatypes::{
        ArrowPrimitiveType, DataType, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
        UInt32Type, UInt64Type, UInt8Type,
    },
};
use rustc_hash::FxHashMap;

use crate::{
    column::{Partition, PartitionedColumn},
    error::{Error, Result},
    parallel::PartitionExecutor,
};

/// Small integer code identifying a stratification class.
pub type ClassId = u32;

#[derive(Debug, Clone)]
enum DomainKind {
    Categorical {
        labels: Vec<String>,
        /// Per partition: dictionary key -> class id, `None` for a null entry.
        remaps: Vec<Vec<Option<ClassId>>>,
    },
    Integer {
        /// Sorted distinct values; the class id is the index.
        values: Vec<i128>,
    },
}

/// The set of classes of one column with a stable code assignment.
#[derive(Debug, Clone)]
pub struct ClassDomain {
    kind: DomainKind,
}

impl ClassDomain {
    /// Resolves the domain of `column`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the column is neither
    /// categorical nor integer, and [`Error::Classification`] if an integer
    /// partition contains a null.
    pub fn resolve(column: &PartitionedColumn, executor: &PartitionExecutor) -> Result<Self> {
        if column.is_categorical() {
            Self::resolve_categorical(column)
        } else if column.is_integer() {
            Self::resolve_integer(column, executor)
        } else {
            Err(unsupported_type(column.data_type()))
        }
    }

    fn resolve_categorical(column: &PartitionedColumn) -> Result<Self> {
        let mut labels: Vec<String> = Vec::new();
        let mut codes: FxHashMap<String, ClassId> = FxHashMap::default();
        let mut remaps = Vec::with_capacity(column.num_partitions());

        for partition in column.partitions() {
            let dictionary = partition
                .values()
                .as_any_dictionary_opt()
                .ok_or_else(|| unsupported_type(partition.values().data_type()))?;
            let values = cast(dictionary.values(), &DataType::Utf8)
                .map_err(|_| unsupported_type(partition.values().data_type()))?;
            let values = values.as_string::<i32>();

            let mut remap = Vec::with_capacity(values.len());
            for (key, value) in values.iter().enumerate() {
                debug_assert_eq!(remap.len(), key);
                let Some(value) = value else {
                    remap.push(None);
                    continue;
                };
                let class = match codes.get(value) {
                    Some(&class) => class,
                    None => {
                        let class = ClassId::try_from(labels.len()).map_err(|_| {
                            Error::invalid_argument("too many categories to stratify")
                        })?;
                        labels.push(value.to_string());
                        codes.insert(value.to_string(), class);
                        class
                    }
                };
                remap.push(Some(class));
            }
            remaps.push(remap);
        }

        Ok(Self {
            kind: DomainKind::Categorical { labels, remaps },
        })
    }

    fn resolve_integer(column: &PartitionedColumn, executor: &PartitionExecutor) -> Result<Self> {
        let distinct = executor.try_map_reduce(
            column.partitions(),
            |_, partition| {
                let mut seen = BTreeSet::new();
                for (i, value) in integer_values(partition.values())?.enumerate() {
                    let value = value.ok_or_else(|| null_row(partition, i))?;
                    seen.insert(value);
                }
                Ok(seen)
            },
            BTreeSet::new,
            |mut a, mut b| {
                if a.len() < b.len() {
                    std::mem::swap(&mut a, &mut b);
                }
                a.extend(b);
                Ok(a)
            },
        )?;

        if ClassId::try_from(distinct.len()).is_err() {
            return Err(Error::invalid_argument("too many distinct values to stratify"));
        }

        Ok(Self {
            kind: DomainKind::Integer {
                values: distinct.into_iter().collect(),
            },
        })
    }

    /// Number of classes (`nClass`).
    pub fn len(&self) -> usize {
        match &self.kind {
            DomainKind::Categorical { labels, .. } => labels.len(),
            DomainKind::Integer { values } => values.len(),
        }
    }

    /// True if the domain has no classes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for a categorical domain.
    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, DomainKind::Categorical { .. })
    }

    /// Display label of a class: the category, or the integer value.
    pub fn label(&self, class: ClassId) -> Option<String> {
        let idx = usize::try_from(class).ok()?;
        match &self.kind {
            DomainKind::Categorical { labels, .. } => labels.get(idx).cloned(),
            DomainKind::Integer { values } => values.get(idx).map(ToString::to_string),
        }
    }

    /// Labels of all classes, indexed by class id.
    pub fn labels(&self) -> Vec<String> {
        match &self.kind {
            DomainKind::Categorical { labels, .. } => labels.clone(),
            DomainKind::Integer { values } => values.iter().map(ToString::to_string).collect(),
        }
    }

    /// Class of an integer value, if the value belongs to the domain.
    pub fn class_of_integer(&self, value: i128) -> Option<ClassId> {
        match &self.kind {
            DomainKind::Integer { values } => values
                .binary_search(&value)
                .ok()
                .and_then(|rank| ClassId::try_from(rank).ok()),
            DomainKind::Categorical { .. } => None,
        }
    }

    /// Class of a dictionary key within the given partition.
    pub fn class_of_key(&self, partition: usize, key: usize) -> Option<ClassId> {
        match &self.kind {
            DomainKind::Categorical { remaps, .. } => remaps.get(partition)?.get(key).copied()?,
            DomainKind::Integer { .. } => None,
        }
    }

    /// Calls `emit(local_position, class)` for every row of a partition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Classification`] for a row with no class (null or a
    /// value outside the domain).
    pub fn classify<F>(&self, partition_index: usize, partition: &Partition, mut emit: F) -> Result<()>
    where
        F: FnMut(usize, ClassId) -> Result<()>,
    {
        let values = partition.values();
        match &self.kind {
            DomainKind::Categorical { .. } => {
                let dictionary = values
                    .as_any_dictionary_opt()
                    .ok_or_else(|| unsupported_type(values.data_type()))?;
                let keys = cast(dictionary.keys(), &DataType::UInt64)?;
                for (i, key) in keys.as_primitive::<UInt64Type>().iter().enumerate() {
                    let key = key.ok_or_else(|| null_row(partition, i))?;
                    let class = usize::try_from(key)
                        .ok()
                        .and_then(|k| self.class_of_key(partition_index, k))
                        .ok_or_else(|| {
                            Error::classification(
                                row_of(partition, i),
                                format!("dictionary key {key} has no category"),
                            )
                        })?;
                    emit(i, class)?;
                }
            }
            DomainKind::Integer { .. } => {
                for (i, value) in integer_values(values)?.enumerate() {
                    let value = value.ok_or_else(|| null_row(partition, i))?;
                    let class = self.class_of_integer(value).ok_or_else(|| {
                        Error::classification(
                            row_of(partition, i),
                            format!("value {value} is not in the column domain"),
                        )
                    })?;
                    emit(i, class)?;
                }
            }
        }
        Ok(())
    }
}

fn row_of(partition: &Partition, local: usize) -> u64 {
    partition.start() + local as u64
}

fn null_row(partition: &Partition, local: usize) -> Error {
    Error::classification(row_of(partition, local), "null value has no class")
}

fn unsupported_type(data_type: &DataType) -> Error {
    Error::invalid_argument(format!(
        "stratification only applies to integer and categorical columns, got {data_type}"
    ))
}

type IntegerIter<'a> = Box<dyn Iterator<Item = Option<i128>> + 'a>;

fn widen<T>(array: &dyn Array) -> IntegerIter<'_>
where
    T: ArrowPrimitiveType,
    T::Native: Into<i128>,
{
    Box::new(array.as_primitive::<T>().iter().map(|v| v.map(Into::into)))
}

/// Iterates an Arrow integer array as `i128`, covering signed and unsigned widths.
fn integer_values(array: &dyn Array) -> Result<IntegerIter<'_>> {
    let iter = match array.data_type() {
        DataType::Int8 => widen::<Int8Type>(array),
        DataType::Int16 => widen::<Int16Type>(array),
        DataType::Int32 => widen::<Int32Type>(array),
        DataType::Int64 => widen::<Int64Type>(array),
        DataType::UInt8 => widen::<UInt8Type>(array),
        DataType::UInt16 => widen::<UInt16Type>(array),
        DataType::UInt32 => widen::<UInt32Type>(array),
        DataType::UInt64 => widen::<UInt64Type>(array),
        dt => return Err(unsupported_type(dt)),
    };
    Ok(iter)
}
