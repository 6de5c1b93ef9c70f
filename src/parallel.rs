//! Partition-parallel task execution.
//!
//! [`PartitionExecutor`] runs one task per partition, either on the calling
//! thread (`num_workers == 0`) or on a dedicated rayon pool. It offers the
//! three shapes the split pipeline needs: a fallible map-reduce (index
//! collection, domain discovery), a fallible map (per-class sampling) and
//! an in-place mutation over disjoint items (label assignment).
//!
//! Each call returns only after every task finished, so call boundaries are
//! the pipeline's barriers.
//!
//! # Example
//!
//! ```
//! use stratasplit::parallel::PartitionExecutor;
//!
//! let executor = PartitionExecutor::new(2).unwrap();
//! let sum = executor
//!     .try_map_reduce(&[1u64, 2, 3], |_, v| Ok(*v), || 0, |a, b| Ok(a + b))
//!     .unwrap();
//! assert_eq!(sum, 6);
//! ```

use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};

use crate::error::{Error, Result};

/// Runs partition tasks on zero (inline) or more worker threads.
pub struct PartitionExecutor {
    num_workers: usize,
    pool: Option<ThreadPool>,
}

impl PartitionExecutor {
    /// Creates an executor with `num_workers` threads (0 = calling thread only).
    ///
    /// Note: On WASM targets, num_workers is always 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread pool cannot be built.
    pub fn new(num_workers: usize) -> Result<Self> {
        #[cfg(target_arch = "wasm32")]
        let num_workers = {
            let _ = num_workers;
            0
        };

        let pool = if num_workers == 0 {
            None
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(num_workers)
                .thread_name(|i| format!("stratasplit-worker-{i}"))
                .build()
                .map_err(|e| Error::invalid_argument(format!("cannot start workers: {e}")))?;
            Some(pool)
        };

        Ok(Self { num_workers, pool })
    }

    /// An executor that runs everything on the calling thread.
    pub fn inline() -> Self {
        Self {
            num_workers: 0,
            pool: None,
        }
    }

    /// Returns the number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Maps every item and reduces the results with an associative `reduce`.
    ///
    /// `map` receives the item's position. The reduce may combine results in
    /// any grouping, so it must be associative with `identity` as its unit.
    /// The first error aborts the whole call.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `map` or `reduce`.
    pub fn try_map_reduce<T, R, M, I, F>(
        &self,
        items: &[T],
        map: M,
        identity: I,
        reduce: F,
    ) -> Result<R>
    where
        T: Sync,
        R: Send,
        M: Fn(usize, &T) -> Result<R> + Sync + Send,
        I: Fn() -> R + Sync + Send,
        F: Fn(R, R) -> Result<R> + Sync + Send,
    {
        match &self.pool {
            None => items
                .iter()
                .enumerate()
                .try_fold(identity(), |acc, (i, item)| reduce(acc, map(i, item)?)),
            Some(pool) => pool.install(|| {
                items
                    .par_iter()
                    .enumerate()
                    .map(|(i, item)| map(i, item))
                    .try_reduce(&identity, &reduce)
            }),
        }
    }

    /// Maps every item, keeping results in item order.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `map`.
    pub fn try_map<T, R, M>(&self, items: &[T], map: M) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        M: Fn(usize, &T) -> Result<R> + Sync + Send,
    {
        match &self.pool {
            None => items.iter().enumerate().map(|(i, item)| map(i, item)).collect(),
            Some(pool) => pool.install(|| {
                items
                    .par_iter()
                    .enumerate()
                    .map(|(i, item)| map(i, item))
                    .collect()
            }),
        }
    }

    /// Mutates every item in place; items are disjoint so tasks never race.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        match &self.pool {
            None => items.iter_mut().for_each(f),
            Some(pool) => pool.install(|| items.par_iter_mut().for_each(f)),
        }
    }
}

impl std::fmt::Debug for PartitionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionExecutor")
            .field("num_workers", &self.num_workers)
            .finish()
    }
}
