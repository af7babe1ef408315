//! Seeded pseudo-random selection.
//!
//! Card and feed sampling is reproducible: every scenario gets its own
//! generator derived from the run seed and the scenario name, and the seed
//! is recorded in the scenario result.

use serde::{Deserialize, Serialize};

/// Seed for reproducible sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub u64);

impl Seed {
    /// Seed from the current time
    #[must_use]
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self(nanos)
    }

    /// Mix a label into this seed (FNV-1a over the label)
    #[must_use]
    pub fn derive(self, label: &str) -> Self {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in label.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Self(self.0 ^ hash)
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Xorshift64 generator
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
    seed: Seed,
}

impl SeededRng {
    /// Create a generator; a zero seed is remapped to keep the state non-zero
    #[must_use]
    pub const fn new(seed: Seed) -> Self {
        let state = if seed.0 == 0 { 1 } else { seed.0 };
        Self { state, seed }
    }

    /// Seed this generator was created with
    #[must_use]
    pub const fn seed(&self) -> Seed {
        self.seed
    }

    /// Next raw value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform index in `[0, bound)`; `bound` of zero yields zero
    pub fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        (self.next_u64() % bound as u64) as usize
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }

    /// Up to `count` distinct items in random order
    pub fn sample<T: Clone>(&mut self, items: &[T], count: usize) -> Vec<T> {
        let mut pool = items.to_vec();
        self.shuffle(&mut pool);
        pool.truncate(count);
        pool
    }
}
