// Seedable, portable pseudo-random number generator for dig passes.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. The engine only ever asks it one kind of question, "does
// this dug wall leave a boulder?", which boils down to a uniform integer in
// [0, 100). Keeping the generator in its own crate lets the engine and its
// tests share one reproducible stream without pulling in an RNG ecosystem.
//
// **Critical constraint: determinism.** Two `DigRng`s built from the same
// seed must hand out identical sequences on every platform. No floats in the
// core step, no OS entropy, no thread-local state.

use serde::{Deserialize, Serialize};

/// xoshiro256++ state. Cheap to clone; cloning forks the stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigRng {
    s: [u64; 4],
}

impl DigRng {
    /// Seed a generator. SplitMix64 spreads the 64-bit seed over the full
    /// 256-bit state so that small seeds (0, 1, 2...) still diverge at once.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Upper 32 bits of the next output (the low bits of xoshiro are weaker).
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform integer in `[0, bound)`, without modulo bias.
    ///
    /// Panics if `bound == 0`.
    pub fn below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "below: bound must be positive");
        if bound.is_power_of_two() {
            return self.next_u64() & (bound - 1);
        }
        // Reject the short tail of the u64 range that would skew the modulo.
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    /// Uniform integer in `[0, 100)`.
    pub fn roll_percent(&mut self) -> u32 {
        self.below(100) as u32
    }

    /// `true` with probability `percent / 100`. Zero never succeeds and
    /// anything at or above 100 always does, but a roll is consumed either
    /// way so the stream stays aligned regardless of configuration.
    pub fn chance_percent(&mut self, percent: u32) -> bool {
        self.roll_percent() < percent
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
