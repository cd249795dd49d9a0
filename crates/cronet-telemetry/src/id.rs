//! Engine id generation.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random source for engine ids.
#[derive(Debug, Default)]
pub enum IdGenerator {
    /// Thread-local generator seeded by the OS.
    #[default]
    ThreadLocal,
    /// Deterministic generator for tests and replays.
    Seeded(Mutex<StdRng>),
}

impl IdGenerator {
    /// Deterministic generator seeded with `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::Seeded(Mutex::new(StdRng::seed_from_u64(seed)))
    }

    /// Draw an id that is never `i64::MIN`, `i64::MAX`, `0` or `-1`.
    pub fn generate(&self) -> i64 {
        let drawn = match self {
            Self::ThreadLocal => draw(&mut rand::rng()),
            Self::Seeded(rng) => draw(&mut *rng.lock().unwrap_or_else(PoisonError::into_inner)),
        };
        shift_past_sentinels(drawn)
    }
}

// Draws in [-1, MAX-3] move up by two, skipping -1 and 0 without reaching MAX.
const fn shift_past_sentinels(drawn: i64) -> i64 {
    if drawn >= -1 { drawn + 2 } else { drawn }
}

fn draw<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.random_range(i64::MIN + 1..i64::MAX - 2)
}
