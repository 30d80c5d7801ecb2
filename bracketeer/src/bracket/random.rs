//! Randomness used to place participants into the bracket.

use crate::tournament::models::Participant;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Mutex;

/// Source of uniform randomness for bracket seeding
///
/// Implementors only supply [`RandomSource::below`]; the shuffle itself is a
/// Fisher–Yates pass so every source yields a uniform permutation.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..bound`. `bound` is always at least 1.
    fn below(&self, bound: usize) -> usize;

    /// Permute `entries` in place
    fn shuffle(&self, entries: &mut [Participant]) {
        for i in (1..entries.len()).rev() {
            let j = self.below(i + 1);
            entries.swap(i, j);
        }
    }
}

/// Thread-local OS-seeded generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}

/// Reproducible generator for tests and replayable simulations
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a generator from a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, bound: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .random_range(0..bound)
    }
}
