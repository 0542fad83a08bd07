//! Entropy sources for response selection.
//!
//! Each read draws exactly one byte from an [`EntropySource`]. The driver does not care
//! where the byte comes from:
//!
//! - [`OsEntropy`]: operating-system randomness, the production default
//! - [`SeededEntropy`]: ChaCha8 seeded from a `u64`, for reproducible runs
//! - [`ScriptedEntropy`]: replays a fixed byte sequence, for tests

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Supplier of random bytes. Shared by every session, so it must be thread-safe.
pub trait EntropySource: Send + Sync {
    /// Next random byte.
    fn next_random_byte(&self) -> u8;
}

/// Randomness from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_random_byte(&self) -> u8 {
        OsRng.gen()
    }
}

/// Seeded generator for reproducible behaviour.
pub struct SeededEntropy {
    inner: Mutex<ChaCha8Rng>,
}

impl SeededEntropy {
    /// Generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn next_random_byte(&self) -> u8 {
        self.inner.lock().gen()
    }
}

impl std::fmt::Debug for SeededEntropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededEntropy")
            .field("inner", &"<Mutex<ChaCha8Rng>>")
            .finish()
    }
}

/// Replays `bytes` in order, wrapping around at the end.
#[derive(Debug)]
pub struct ScriptedEntropy {
    bytes: Vec<u8>,
    cursor: AtomicUsize,
}

impl ScriptedEntropy {
    /// Source cycling through `bytes`. An empty script always yields zero.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Source that always yields `byte`.
    pub fn constant(byte: u8) -> Self {
        Self::new(vec![byte])
    }
}

impl EntropySource for ScriptedEntropy {
    fn next_random_byte(&self) -> u8 {
        if self.bytes.is_empty() {
            return 0;
        }
        let position = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.bytes[position % self.bytes.len()]
    }
}
