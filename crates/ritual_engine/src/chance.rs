//! Random draws used by the engine.
//!
//! Every probabilistic rule reads from the caller's injected [`RngCore`], so a
//! seeded generator replays a whole game exactly. Role dealing is the one
//! exception: it derives its own sequence from the seed string.

use rand::{Rng, RngCore};

/// Draws a uniform value in `[0, 1)`.
pub fn roll(rng: &mut dyn RngCore) -> f64 {
    rng.random::<f64>()
}

/// Returns true with probability `p`.
pub fn chance(rng: &mut dyn RngCore, p: f64) -> bool {
    roll(rng) < p
}

/// Picks an index in `0..len` as `floor(roll * len)`.
///
/// Returns `None` for an empty range.
pub fn pick_index(rng: &mut dyn RngCore, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let idx = (roll(rng) * len as f64) as usize;
    Some(idx.min(len - 1))
}

/// Picks one element uniformly.
pub fn pick<'a, T>(rng: &mut dyn RngCore, items: &'a [T]) -> Option<&'a T> {
    pick_index(rng, items.len()).map(|i| &items[i])
}

/// Seed-string generator used for dealing roles.
///
/// Hashes the seed with the classic 31-multiplier string hash and steps a
/// small linear congruential generator. The sequence is part of the replay
/// contract: changing it changes every dealt hand.
#[derive(Debug, Clone)]
pub struct SeedSequence {
    state: i64,
}

impl SeedSequence {
    const MULTIPLIER: i64 = 9301;
    const INCREMENT: i64 = 49297;
    const MODULUS: i64 = 233_280;

    /// Creates a sequence from a seed string.
    pub fn new(seed: &str) -> Self {
        let mut hash: i32 = 0;
        for unit in seed.encode_utf16() {
            hash = hash
                .wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit));
        }
        Self {
            state: i64::from(hash),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.state = (self.state * Self::MULTIPLIER + Self::INCREMENT).rem_euclid(Self::MODULUS);
        self.state as f64 / Self::MODULUS as f64
    }

    /// Fisher-Yates shuffle driven by this sequence.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = ((self.next_unit() * (i + 1) as f64) as usize).min(i);
            items.swap(i, j);
        }
    }
}
