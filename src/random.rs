//! Random source used for factor shuffling, round-count draws and abort dice

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Every random decision the negotiation makes goes through this trait
pub trait RandomSource: Send {
    /// Uniform integer in `[low, high]`, both inclusive
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32;

    /// Uniform index in `[0, upper)`
    fn index_below(&mut self, upper: usize) -> usize;
}

/// `StdRng`-backed source, seeded for reproducible runs or from OS entropy
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn index_below(&mut self, upper: usize) -> usize {
        if upper <= 1 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

/// Replays a fixed script of draws, clamped into the requested range.
///
/// Once the script runs out every draw returns the lower bound.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    draws: std::collections::VecDeque<u32>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    /// Draws not yet consumed
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }

    fn next_draw(&mut self) -> Option<u32> {
        self.draws.pop_front()
    }
}

impl RandomSource for ScriptedRandom {
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.next_draw().unwrap_or(low).clamp(low, high.max(low))
    }

    fn index_below(&mut self, upper: usize) -> usize {
        let draw = self.next_draw().unwrap_or(0) as usize;
        draw.min(upper.saturating_sub(1))
    }
}
