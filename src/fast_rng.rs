// PCG-LCG random number streams, the same generator OpenMC uses in random_lcg.cpp.
//
// A run owns one global seed. Every consumer gets its own stream carved out of
// the single LCG sequence by skipping ahead a fixed stride, so the master
// stream, the material generator and each transport worker never share state.

use rand::{RngCore, SeedableRng};

/// LCG multiplier (same as OpenMC)
const PRN_MULT: u64 = 6364136223846793005;
/// LCG additive constant (same as OpenMC)
const PRN_ADD: u64 = 1442695040888963407;
/// Distance between consecutive streams in the underlying LCG sequence.
pub const STREAM_STRIDE: u64 = 1 << 48;

/// Stream used for source sampling and bank resampling.
pub const STREAM_MASTER: u64 = 0;
/// Stream used to generate the synthetic nuclide table.
pub const STREAM_MATERIAL: u64 = 1;
/// First stream handed to transport workers; worker `w` uses `STREAM_WORKER_BASE + w`.
pub const STREAM_WORKER_BASE: u64 = 2;

/// Fast RNG using OpenMC's PCG-LCG algorithm.
///
/// Reference: Melissa E. O'Neill, "PCG: A Family of Simple Fast Space-Efficient
/// Statistically Good Algorithms for Random Number Generation"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FastRng {
    seed: u64,
}

impl FastRng {
    /// Create a new FastRng with the given seed
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Independent stream `index` derived from the global `seed`.
    pub fn stream(seed: u64, index: u64) -> Self {
        Self::new(future_seed(index.wrapping_mul(STREAM_STRIDE), seed))
    }

    /// Stream private to transport worker `worker`.
    pub fn worker_stream(seed: u64, worker: usize) -> Self {
        Self::stream(seed, STREAM_WORKER_BASE + worker as u64)
    }

    /// Generate a random f64 in [0, 1) - matches OpenMC's prn() function
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        (self.next_u64() as f64) * 5.421010862427522e-20
    }

    /// Move this stream `n` draws forward without generating them.
    pub fn advance(&mut self, n: u64) {
        self.seed = future_seed(n, self.seed);
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.seed
    }
}

/// Seed reached after `n` LCG steps from `seed`, in O(log n).
///
/// Brown, "Random Number Generation with Arbitrary Stride" (1994).
pub fn future_seed(mut n: u64, seed: u64) -> u64 {
    let mut g = PRN_MULT;
    let mut c = PRN_ADD;
    let mut g_new: u64 = 1;
    let mut c_new: u64 = 0;

    while n > 0 {
        if n & 1 == 1 {
            g_new = g_new.wrapping_mul(g);
            c_new = c_new.wrapping_mul(g).wrapping_add(c);
        }
        c = g.wrapping_add(1).wrapping_mul(c);
        g = g.wrapping_mul(g);
        n >>= 1;
    }

    g_new.wrapping_mul(seed).wrapping_add(c_new)
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            seed: u64::from_le_bytes(seed),
        }
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        // Advance the LCG
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);

        // PCG output permutation (RXS-M-XS variant)
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut left = dest;
        while left.len() >= 8 {
            let bytes = self.next_u64().to_le_bytes();
            left[..8].copy_from_slice(&bytes);
            left = &mut left[8..];
        }
        if !left.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            left.copy_from_slice(&bytes[..left.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
