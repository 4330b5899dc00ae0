//! Random number generator abstraction for determinism.
//!
//! In production, this wraps a real RNG. In tests, a seeded or scripted
//! implementation is injected so role deals and tie-breaks are repeatable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;
}

/// Production RNG backed by `StdRng`.
#[derive(Debug)]
pub struct SystemRng(StdRng);

impl SystemRng {
    /// Creates an RNG seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Creates an RNG with a fixed seed, for reproducible sessions.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl DeterministicRng for SystemRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }
}

/// Returns a uniformly chosen index into a collection of `len` items.
#[allow(clippy::cast_possible_truncation)]
fn pick_index(rng: &mut dyn DeterministicRng, len: usize) -> usize {
    rng.next_u32_range(0, (len - 1) as u32) as usize
}

/// Shuffles `items` in place (Fisher-Yates).
pub fn shuffle<T>(rng: &mut dyn DeterministicRng, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = pick_index(rng, i + 1);
        items.swap(i, j);
    }
}

/// Picks one element uniformly at random, or `None` if `items` is empty.
pub fn choose<'a, T>(rng: &mut dyn DeterministicRng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(pick_index(rng, items.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_on_empty_slice_returns_none() {
        let mut rng = SystemRng::seeded(7);
        let empty: [u8; 0] = [];

        assert!(choose(&mut rng, &empty).is_none());
    }

    #[test]
    fn test_choose_single_element_returns_it() {
        let mut rng = SystemRng::seeded(7);

        assert_eq!(choose(&mut rng, &["only"]), Some(&"only"));
    }

    #[test]
    fn test_shuffle_preserves_elements() {
        let mut rng = SystemRng::seeded(42);
        let mut items: Vec<u32> = (0..20).collect();

        shuffle(&mut rng, &mut items);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = SystemRng::seeded(99);
        let mut b = SystemRng::seeded(99);
        let mut left: Vec<u32> = (0..10).collect();
        let mut right = left.clone();

        shuffle(&mut a, &mut left);
        shuffle(&mut b, &mut right);

        assert_eq!(left, right);
    }

    #[test]
    fn test_next_u32_range_stays_in_bounds() {
        let mut rng = SystemRng::seeded(3);
        for _ in 0..200 {
            let value = rng.next_u32_range(2, 5);
            assert!((2..=5).contains(&value));
        }
    }
}
