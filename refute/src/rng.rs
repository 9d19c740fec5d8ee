//! Splittable pseudo-random streams for deterministic generation.

use rand::RngCore;

/// Weyl-sequence increment from SplitMix64.
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// A deterministic, splittable pseudo-random stream.
///
/// A `Random` is a value: copying it forks the stream at its current state.
/// `split` derives an independent child stream from the current state and a
/// label without consuming anything from the parent, so nested draws replay
/// identically as long as the same (seed, path) is used. The generator is
/// SplitMix64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Random {
    state: u64,
    gamma: u64,
}

impl Random {
    /// Create a stream from a single seed value.
    pub fn from_seed(seed: u64) -> Self {
        Random {
            state: mix64(seed),
            gamma: mix_gamma(seed.wrapping_add(GOLDEN_GAMMA)),
        }
    }

    /// Create a stream seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::rngs::OsRng.next_u64())
    }

    /// Consume and return the next word of the stream.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(self.gamma);
        mix64(self.state)
    }

    /// Derive an independent child stream from this stream's current state
    /// and `label`. The parent is not advanced; the same (state, label)
    /// always yields the same child.
    pub fn split(&self, label: u64) -> Random {
        let base = mix64(self.state ^ mix64(label.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)));
        Random {
            state: base,
            gamma: mix_gamma(base.wrapping_add(GOLDEN_GAMMA)),
        }
    }

    /// Uniform draw in `[0, bound)` via rejection sampling, so every residue
    /// is equally likely even when `bound` does not divide `2^64`.
    ///
    /// `bound` must be non-zero.
    pub fn next_below(&mut self, bound: u64) -> u64 {
        debug_assert!(bound > 0, "next_below requires a non-zero bound");
        // Largest value below which `% bound` is unbiased.
        let zone = u64::MAX - (u64::MAX - bound + 1) % bound;
        loop {
            let word = self.next_u64();
            if word <= zone {
                return word % bound;
            }
        }
    }
}

impl RngCore for Random {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        Random::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let word = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// SplitMix64 finalizer.
fn mix64(mut word: u64) -> u64 {
    word = (word ^ (word >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    word = (word ^ (word >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    word ^ (word >> 31)
}

/// Derive an odd increment with enough bit transitions (Steele et al.).
fn mix_gamma(word: u64) -> u64 {
    let gamma = mix64(word) | 1;
    if (gamma ^ (gamma >> 1)).count_ones() < 24 {
        gamma ^ 0xaaaa_aaaa_aaaa_aaaa
    } else {
        gamma
    }
}
