// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// This is a hand-rolled implementation with zero external dependencies, chosen
// for portability and to guarantee identical output across all platforms.
//
// This crate is the single source of randomness for the Emberfield world map:
// `emberfield_worldmap` draws every weighted node-type sample, fork-count
// roll, and fork angle from one `WorldRng` owned by the grid. By avoiding
// external RNG crates (like `rand`) we guarantee that a map layout is a pure
// function of `(config, seed)`.
//
// **Critical constraint: determinism.** Every method on `WorldRng` must
// produce identical output given the same prior state, regardless of platform,
// compiler version, or optimization level. Do not use floating-point
// arithmetic in the core generator, stdlib PRNG, or any source of
// non-determinism in this module.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG — the world map's sole source of randomness.
///
/// The grid owns exactly one `WorldRng`, seeded at construction, ensuring a
/// single deterministic stream through generation and any later debug resets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldRng {
    s: [u64; 4],
}

impl WorldRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `WorldRng` instances created with the same seed will produce
    /// identical output sequences.
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

    /// Generate the next `u64` in the sequence.
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

    /// Generate a `u32` by taking the upper 32 bits of a `u64`.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a uniform `f32` in [0, 1).
    ///
    /// Uses the upper 24 bits of a `u64` to fill the mantissa of an f32.
    /// This is the standard technique — 24 bits gives full f32 precision.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// A fair coin flip. Used for the fork-angle band choice (clockwise vs
    /// counter-clockwise) during stream generation.
    pub fn coin_flip(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }

    /// Generate a uniform random value in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        assert!(low < high, "range_f32: low must be less than high");
        low + self.next_f32() * (high - low)
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        assert!(low < high, "range_u32: low must be less than high");
        let range = (high - low) as u64;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1)) as u32;
        }
        // Rejection sampling to avoid modulo bias.
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range) as u32;
            }
        }
    }
}

/// SplitMix64 — used only for seeding xoshiro256++ from a single `u64`.
///
/// This is the standard recommendation from the xoshiro authors for
/// expanding a small seed into a larger state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
