//! Test RNG: deterministic `DeterministicRng` implementations for tests.

use nightfall_core::rng::DeterministicRng;

/// A no-op RNG that always returns `min` for `next_u32_range`. Every random
/// pick takes the first candidate, and a shuffle rotates its input left by
/// one (`[a, b, c]` becomes `[b, c, a]`).
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }
}

/// An RNG that returns values from a predetermined sequence, clamped into the
/// requested range. Panics if the sequence is exhausted. Used in tests that
/// need a specific tie-break or fallback pick.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given values.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        let val = self.values[self.index];
        self.index += 1;
        val.clamp(min, max)
    }
}
