//! Injectable random source
//!
//! Every roll the engine makes (reaction chances, contest fuzz, AI tie-tier
//! selection) goes through [`RandomSource`], so a fixed seed reproduces a
//! whole fight and tests can script exact outcomes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of uniform rolls in `[0, 1)`
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`
    fn next_f32(&mut self) -> f32;

    /// Bernoulli trial; `p >= 1.0` always succeeds, `p <= 0.0` never does
    fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// Multiplicative contest fuzz in `[0.8, 1.2)`
    fn fuzz(&mut self) -> f32 {
        0.8 + self.next_f32() * 0.4
    }

    /// Uniform index in `0..len` (returns 0 for empty or single-element ranges)
    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        ((self.next_f32() * len as f32) as usize).min(len - 1)
    }
}

/// Seeded ChaCha8 generator; serializable so snapshots resume mid-fight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRng {
    inner: ChaCha8Rng,
}

impl CombatRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for CombatRng {
    fn next_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }
}

/// Scripted rolls, cycled in order
///
/// Lets tests force specific branches: a roll of `0.0` passes every chance
/// check, `0.99` fails nearly all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRng {
    rolls: Vec<f32>,
    cursor: usize,
}

impl SequenceRng {
    pub fn new(rolls: Vec<f32>) -> Self {
        Self { rolls, cursor: 0 }
    }

    /// Always returns the same roll
    pub fn constant(roll: f32) -> Self {
        Self::new(vec![roll])
    }
}

impl RandomSource for SequenceRng {
    fn next_f32(&mut self) -> f32 {
        if self.rolls.is_empty() {
            return 0.5;
        }
        let roll = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        roll.clamp(0.0, 0.999_999)
    }
}
