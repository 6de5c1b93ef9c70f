// Class sizes times a fraction in [0, 1] never exceed the class size.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

//! Per-class test sampling.
//!
//! Every class gets its own pseudo-random stream seeded from
//! [`class_seed`]`(seed, class)`, so classes never share mutable state and
//! the result does not depend on which worker samples which class. Within
//! a class, positions are drawn uniformly and rejected when they land on
//! an already chosen row, which yields exactly `tnum` distinct rows.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::{
    domain::ClassId,
    error::{Error, Result},
    parallel::PartitionExecutor,
    scan::ClassIndices,
};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer; a bijection on `u64`.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derives the seed of one class's stream from the split seed.
///
/// This is the `class + 1`-th output of a SplitMix64 generator started at
/// `seed`, so distinct classes of one split always get distinct seeds.
pub fn class_seed(seed: u64, class: ClassId) -> u64 {
    mix64(seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(u64::from(class) + 1)))
}

/// Number of test rows for a class of `rows` rows: `max(round(rows * frac), 1)`,
/// or 0 for an empty class.
pub fn test_count(rows: usize, test_frac: f64) -> usize {
    if rows == 0 {
        return 0;
    }
    ((rows as f64 * test_frac).round() as usize).max(1)
}

fn distinct_count(rows: &[u64]) -> usize {
    if rows.windows(2).all(|w| w[0] <= w[1]) {
        rows.windows(2).filter(|w| w[0] != w[1]).count() + usize::from(!rows.is_empty())
    } else {
        rows.iter().collect::<FxHashSet<_>>().len()
    }
}

/// Samples the test rows of every class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StratifiedSampler {
    test_frac: f64,
    seed: u64,
}

impl StratifiedSampler {
    /// Creates a sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if `test_frac` is not a finite value in `[0, 1]`.
    pub fn new(test_frac: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&test_frac) {
            return Err(Error::invalid_argument(format!(
                "test_frac must be within [0, 1], got {test_frac}"
            )));
        }
        Ok(Self { test_frac, seed })
    }

    /// Target test fraction.
    pub fn test_frac(&self) -> f64 {
        self.test_frac
    }

    /// Split-wide seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed of one class's stream.
    pub fn class_seed(&self, class: ClassId) -> u64 {
        class_seed(self.seed, class)
    }

    /// Picks `test_count(rows.len())` distinct rows of one class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SamplingExhaustion`] if `rows` holds fewer distinct
    /// values than requested.
    pub fn sample_class(&self, class: ClassId, rows: &[u64]) -> Result<Vec<u64>> {
        let requested = test_count(rows.len(), self.test_frac);
        if requested == 0 {
            return Ok(Vec::new());
        }

        let available = distinct_count(rows);
        if requested > available {
            return Err(Error::SamplingExhaustion {
                class,
                requested,
                available,
            });
        }
        if requested == rows.len() {
            return Ok(rows.to_vec());
        }

        let mut rng = StdRng::seed_from_u64(self.class_seed(class));
        let mut chosen = FxHashSet::default();
        chosen.reserve(requested);
        let mut selection = Vec::with_capacity(requested);
        let mut draws = 0usize;
        while selection.len() < requested {
            let row = rows[rng.gen_range(0..rows.len())];
            draws += 1;
            if chosen.insert(row) {
                selection.push(row);
            }
        }

        trace!(class, rows = rows.len(), requested, draws, "sampled class");
        Ok(selection)
    }

    /// Samples every class, independently and possibly in parallel.
    ///
    /// The result is indexed by class id.
    ///
    /// # Errors
    ///
    /// Returns the first sampling error.
    pub fn sample_all(
        &self,
        indices: &ClassIndices,
        executor: &PartitionExecutor,
    ) -> Result<Vec<Vec<u64>>> {
        executor.try_map(indices.lists(), |class, rows| {
            let class = ClassId::try_from(class)
                .map_err(|_| Error::invalid_argument("class id exceeds u32"))?;
            self.sample_class(class, rows)
        })
    }
}
