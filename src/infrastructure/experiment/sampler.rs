//! Weighted random selection for experiment assignment
//!
//! One uniform draw per selection: the draw lands in `[0, W)` and the first
//! entry whose cumulative weight exceeds it wins.

use std::fmt;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::experiment::{ExperimentValidationError, WeightedSet};
use crate::domain::DomainError;

/// Random source shared by every draw the engine makes
pub struct WeightedSampler {
    rng: Mutex<StdRng>,
}

impl fmt::Debug for WeightedSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedSampler").finish_non_exhaustive()
    }
}

impl Default for WeightedSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedSampler {
    /// Sampler seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sampler for tests and reproducible tooling
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, DomainError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| DomainError::internal(format!("Sampler lock poisoned: {}", e)))?;
        Ok(f(&mut rng))
    }

    /// Picks one entry of `set` with probability proportional to its weight
    ///
    /// Fails with `InvalidInput` when the set is empty, a weight is negative or
    /// not finite, or the weights sum to zero.
    pub fn draw<'a, T>(&self, set: &'a WeightedSet<T>) -> Result<&'a T, DomainError> {
        let total = set.total_weight()?;
        let u = self.with_rng(|rng| rng.gen_range(0.0..total))?;
        Ok(pick(set, u))
    }

    /// Bernoulli draw: true with probability `probability`
    pub fn include(&self, probability: f64) -> Result<bool, DomainError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ExperimentValidationError::ProbabilityOutOfRange {
                index: 0,
                probability,
            }
            .into());
        }

        let u: f64 = self.with_rng(|rng| rng.gen_range(0.0..1.0))?;
        Ok(u < probability)
    }

    /// One independent Bernoulli draw per probability, in order
    pub fn include_each(&self, probabilities: &[f64]) -> Result<Vec<bool>, DomainError> {
        for (index, &probability) in probabilities.iter().enumerate() {
            if !(0.0..=1.0).contains(&probability) {
                return Err(
                    ExperimentValidationError::ProbabilityOutOfRange { index, probability }.into(),
                );
            }
        }

        self.with_rng(|rng| {
            probabilities
                .iter()
                .map(|&p| rng.gen_range(0.0..1.0) < p)
                .collect()
        })
    }
}

/// Scans cumulative weights for the first one exceeding `u`
///
/// `set` must already be validated. If rounding leaves `u` at or past the final
/// cumulative sum, the last positively weighted entry is chosen.
fn pick<T>(set: &WeightedSet<T>, u: f64) -> &T {
    let mut cumulative = 0.0;
    let mut last_positive = &set.entries()[0].item;

    for entry in set.iter() {
        cumulative += entry.weight;

        if entry.weight > 0.0 {
            last_positive = &entry.item;
        }

        if cumulative > u {
            return &entry.item;
        }
    }

    last_positive
}
