//! RNG oracle for deterministic random number generation.
//!
//! Randomised behaviour (duration jitter, dash sides, toxin headings,
//! bombardment scatter) is drawn from a stateless generator seeded from the
//! arena seed, the current time, the agent, and a per-call context value.
//! Identical inputs always reproduce identical fights.

use crate::state::{AgentId, Timestamp};

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }

    /// Uniform value in `0.0..1.0`.
    fn unit(&self, seed: u64) -> f32 {
        (self.next_u32(seed) >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform angle in `0.0..TAU`.
    fn angle(&self, seed: u64) -> f32 {
        self.unit(seed) * core::f32::consts::TAU
    }

    /// Fair coin flip.
    fn coin(&self, seed: u64) -> bool {
        self.next_u32(seed) & 1 == 1
    }
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// This implementation uses PCG-XSH-RR, which produces 32-bit output from
/// 64-bit state.
///
/// # Properties
///
/// - **Deterministic**: Same seed always produces same output
/// - **Fast**: Single multiply + xorshift + rotate
/// - **Small state**: Only 64 bits
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    /// PCG multiplier constant.
    const MULTIPLIER: u64 = 6364136223846793005;

    /// PCG increment constant.
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// PCG output function using XSH-RR (xorshift high, random rotate).
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        let state = Self::pcg_step(seed);
        Self::pcg_output(state)
    }
}

/// Compute a deterministic seed for one random draw.
///
/// # Arguments
///
/// * `arena_seed` - Base seed set at arena start
/// * `now` - Current clock reading
/// * `agent` - Agent making the draw
/// * `context` - Distinguishes multiple draws by the same agent in one tick
pub fn compute_seed(arena_seed: u64, now: Timestamp, agent: AgentId, context: u32) -> u64 {
    let mut hash = arena_seed;
    hash = hash.wrapping_mul(31).wrapping_add(now.as_millis());
    hash = hash.wrapping_mul(31).wrapping_add(agent.index as u64);
    hash = hash.wrapping_mul(31).wrapping_add(agent.generation as u64);
    hash = hash.wrapping_mul(31).wrapping_add(context as u64);
    // Final avalanche step (SplitMix64 finalizer)
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ceb9fe1a85ec53);
    hash ^= hash >> 33;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_value() {
        let rng = PcgRng;
        assert_eq!(rng.next_u32(42), rng.next_u32(42));
        assert_ne!(rng.next_u32(42), rng.next_u32(43));
    }

    #[test]
    fn range_and_unit_stay_in_bounds() {
        let rng = PcgRng;
        for seed in 0..500 {
            let value = rng.range(seed, 300, 700);
            assert!((300..=700).contains(&value));
            let unit = rng.unit(seed);
            assert!((0.0..1.0).contains(&unit));
        }
    }

    #[test]
    fn seeds_differ_by_context() {
        let agent = AgentId::new(3, 0);
        let a = compute_seed(7, Timestamp(100), agent, 0);
        let b = compute_seed(7, Timestamp(100), agent, 1);
        assert_ne!(a, b);
    }
}
