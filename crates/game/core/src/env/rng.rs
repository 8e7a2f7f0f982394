//! Injectable randomness.
//!
//! The engine never owns a stateful generator. Every draw hashes the session
//! seed, the state's draw cursor, the acting unit and a [`RollContext`] into a
//! one-shot seed, so a replay with the same seed and action sequence repeats
//! every crit, evasion and jitter draw exactly.

/// Source of random bits. Must be a pure function of `seed`.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;
}

/// Why a value is being drawn; mixed into the per-draw seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RollContext {
    Evasion = 1,
    Crit = 2,
    Initiative = 3,
    Paralysis = 4,
    StatusChance = 5,
}

impl From<RollContext> for u32 {
    fn from(ctx: RollContext) -> Self {
        ctx as u32
    }
}

/// PCG-XSH-RR output permutation over a single LCG step.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Returns the same value for every draw.
///
/// `FixedRng(0)` makes every chance-based check succeed and
/// `FixedRng(u32::MAX)` makes every one fail, which pins down crit and
/// evasion outcomes in tests and tooling.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedRng(pub u32);

impl RngOracle for FixedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        self.0
    }
}

/// Mixes the session seed, draw cursor, actor and context into one seed.
pub fn compute_seed(game_seed: u64, cursor: u64, actor_id: u32, context: u32) -> u64 {
    let mut hash = game_seed;
    hash ^= cursor.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor_id as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // murmur3 finalizer
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
