use chrono::{Datelike as _, NaiveDate};
use rand::{Rng as _, RngCore as _, SeedableRng as _, rngs::StdRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Source of uniform random values for piece generation.
///
/// Both the shape draw and the color draw consume exactly one value each, so
/// two sources that yield the same sequence produce the same pieces.
pub trait RandomSource {
    /// Returns a uniformly distributed value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Unseeded generator backed by the operating system's entropy.
#[derive(Debug, Clone)]
pub struct SystemRandom {
    rng: StdRng,
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRandom {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SystemRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random()
    }
}

/// Position of a [`SeededRandom`] in its sequence.
///
/// Enough to resume the exact same stream after a save and load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedState {
    pub seed: u64,
    pub draws: u64,
}

/// Deterministic generator for reproducible boards.
///
/// Backed by [`Pcg32`], a permuted linear congruential generator. Every value
/// consumes exactly one step of the underlying LCG, which lets a saved session
/// jump straight back to its position with [`Pcg32::advance`].
///
/// # Example
///
/// ```
/// use block_bloom_engine::{RandomSource as _, SeededRandom};
///
/// let mut a = SeededRandom::new(20260101);
/// let mut b = SeededRandom::new(20260101);
/// assert_eq!(a.next_unit(), b.next_unit());
///
/// let mut resumed = SeededRandom::resume(a.state());
/// assert_eq!(resumed.next_unit(), a.next_unit());
/// ```
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: SeedState,
    rng: Pcg32,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::resume(SeedState { seed, draws: 0 })
    }

    /// Recreates the generator at a previously saved position.
    #[must_use]
    pub fn resume(state: SeedState) -> Self {
        let mut rng = Pcg32::seed_from_u64(state.seed);
        rng.advance(state.draws);
        Self { state, rng }
    }

    #[must_use]
    pub fn state(&self) -> SeedState {
        self.state
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / 4_294_967_296.0; // 2^-32
        self.state.draws += 1;
        f64::from(self.rng.next_u32()) * SCALE
    }
}

/// The generator a session uses, selected by game mode.
#[derive(Debug, Clone, derive_more::IsVariant)]
pub enum PieceRng {
    System(SystemRandom),
    Seeded(SeededRandom),
}

impl PieceRng {
    /// Seed and position for seeded generators; `None` for system randomness.
    #[must_use]
    pub fn seed_state(&self) -> Option<SeedState> {
        match self {
            PieceRng::System(_) => None,
            PieceRng::Seeded(rng) => Some(rng.state()),
        }
    }
}

impl RandomSource for PieceRng {
    fn next_unit(&mut self) -> f64 {
        match self {
            PieceRng::System(rng) => rng.next_unit(),
            PieceRng::Seeded(rng) => rng.next_unit(),
        }
    }
}

/// Seed shared by every daily-mode game played on `date`.
///
/// Encodes the date as the decimal number `YYYYMMDD`.
///
/// ```
/// use block_bloom_engine::daily_seed;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
/// assert_eq!(daily_seed(date), 20_260_309);
/// ```
#[must_use]
pub fn daily_seed(date: NaiveDate) -> u64 {
    let year = i64::from(date.year());
    let month = i64::from(date.month());
    let day = i64::from(date.day());
    (year * 10_000 + month * 100 + day).unsigned_abs()
}
