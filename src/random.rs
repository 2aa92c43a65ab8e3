//! The single randomness source threaded through the engine and strategies.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::Rng;

/// Every random decision of a battle goes through this trait so tests can
/// substitute fixed rolls for the seeded generator.
pub trait BattleRng {
    /// Uniform byte roll in `0..=255`, as the generation 1 hardware draws it.
    fn byte_roll(&mut self) -> u8;

    /// Uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Per-turn ordering tiebreak.
    fn tiebreak(&mut self) -> u64;

    /// Uniform damage spread in `[0.85, 1.0]`.
    fn damage_spread(&mut self) -> f64 {
        0.85 + 0.15 * self.unit()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.unit() * len as f64) as usize).min(len.saturating_sub(1))
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    /// Index drawn proportionally to `weights`; falls back to uniform when
    /// the weights do not form a distribution.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return self.index(weights.len());
        }
        let mut target = self.unit() * total;
        for (idx, w) in weights.iter().enumerate() {
            if target < *w {
                return idx;
            }
            target -= w;
        }
        weights.len() - 1
    }
}

impl BattleRng for SmallRng {
    fn byte_roll(&mut self) -> u8 {
        self.gen_range(0..=255)
    }

    fn unit(&mut self) -> f64 {
        self.gen()
    }

    fn tiebreak(&mut self) -> u64 {
        self.gen()
    }

    fn damage_spread(&mut self) -> f64 {
        self.gen_range(0.85..=1.0)
    }

    fn index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn weighted(&mut self, weights: &[f64]) -> usize {
        match WeightedIndex::new(weights) {
            Ok(dist) => dist.sample(self),
            Err(_) => self.gen_range(0..weights.len()),
        }
    }
}
