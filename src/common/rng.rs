/// Simple deterministic random number generator using Xorshift64.
///
/// This PRNG is:
/// - Minimal (a handful of bit operations)
/// - Fast (no lookup tables, no heavy math)
/// - Deterministic (identical output for the same seed on every platform)
///
/// It implements [`rand::RngCore`] and [`rand::SeedableRng`], so it can be
/// passed anywhere the estimator expects a `rand::Rng`. The SAEM driver uses
/// [`SimpleRng::fork`] to hand every parameter draw its own independent
/// stream, which keeps sequential and parallel runs bit-identical.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

/// Seed offset between forked streams (2^64 / golden ratio).
const STREAM_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;

impl SimpleRng {
    /// Create a new SimpleRng with the given seed.
    /// If seed is 0, uses 1 instead to avoid degenerate state.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generate the next u64 value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random f64 in [0, 1).
    #[inline]
    pub fn rand(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Derive an independent stream from this generator's current state.
    ///
    /// Does not advance `self`. Distinct `stream` values give distinct seeds.
    pub fn fork(&self, stream: u64) -> SimpleRng {
        let seed = self
            .state
            .wrapping_add(stream.wrapping_add(1).wrapping_mul(STREAM_OFFSET));
        // One scrambling round so neighbouring streams do not share low bits.
        let mut forked = SimpleRng::new(seed);
        forked.next_u64();
        forked
    }
}

impl rand::RngCore for SimpleRng {
    fn next_u32(&mut self) -> u32 {
        (SimpleRng::next_u64(self) >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        SimpleRng::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut i = 0;
        let len = dest.len();
        while i + 8 <= len {
            let bytes = SimpleRng::next_u64(self).to_le_bytes();
            dest[i..i + 8].copy_from_slice(&bytes);
            i += 8;
        }
        if i < len {
            let bytes = SimpleRng::next_u64(self).to_le_bytes();
            let remaining = len - i;
            dest[i..].copy_from_slice(&bytes[..remaining]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl rand::SeedableRng for SimpleRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        SimpleRng::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        SimpleRng::new(state)
    }
}
