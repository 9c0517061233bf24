use std::fmt;

use serde::{Deserialize, Serialize};

/// Points for a single cleared line before the multi-line bonus.
const POINTS_PER_LINE: usize = 10;
/// Bonus for every line beyond the first cleared by the same placement.
const MULTI_LINE_BONUS: usize = 25;
/// Flow gained per cleared line.
const FLOW_PER_LINE: u8 = 15;

/// Combo multiplier, held in exact tenths.
///
/// Ranges from x1.0 to x3.0 in steps of 0.2 per consecutive clearing placement.
/// Keeping it in tenths makes `floor(points * multiplier)` exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ComboMultiplier(u8);

impl Default for ComboMultiplier {
    fn default() -> Self {
        Self::BASE
    }
}

impl ComboMultiplier {
    pub const BASE: Self = Self(10);
    pub const MAX: Self = Self(30);
    const STEP_TENTHS: usize = 2;

    /// Multiplier for a streak of `combo` consecutive clearing placements.
    ///
    /// `min(3.0, 1.0 + (combo - 1) * 0.2)`, and x1.0 when there is no streak.
    #[must_use]
    pub fn for_combo(combo: usize) -> Self {
        let tenths = usize::from(Self::BASE.0)
            .saturating_add(combo.saturating_sub(1).saturating_mul(Self::STEP_TENTHS))
            .min(usize::from(Self::MAX.0));
        #[expect(clippy::cast_possible_truncation)]
        let tenths = tenths as u8;
        Self(tenths)
    }

    #[must_use]
    pub const fn tenths(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// `floor(points * multiplier)`.
    #[must_use]
    pub fn apply(self, points: usize) -> usize {
        points * usize::from(self.0) / 10
    }
}

impl From<ComboMultiplier> for f64 {
    fn from(m: ComboMultiplier) -> Self {
        m.as_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("combo multiplier {_0} is not a multiple of 0.1 in 1.0..=3.0")]
pub struct MultiplierOutOfRange(#[error(not(source))] f64);

impl TryFrom<f64> for ComboMultiplier {
    type Error = MultiplierOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let tenths = (value * 10.0).round();
        let in_range = (f64::from(Self::BASE.0)..=f64::from(Self::MAX.0)).contains(&tenths);
        if !in_range || (value * 10.0 - tenths).abs() > 1e-6 {
            return Err(MultiplierOutOfRange(value));
        }
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let tenths = tenths as u8;
        Ok(Self(tenths))
    }
}

impl fmt::Display for ComboMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// The part of the scoring state that an undo rolls back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreCheckpoint {
    pub score: usize,
    pub combo: usize,
    pub multiplier: ComboMultiplier,
}

/// Score, combo and flow-meter bookkeeping for one game.
///
/// # Scoring
///
/// - Placing a piece scores one point per cell.
/// - Clearing `n` lines at once scores `n * 10`, plus `(n - 1) * 25` when
///   `n >= 2`, times the combo multiplier, rounded down.
/// - Each clearing placement extends the combo; a placement that clears
///   nothing resets it.
///
/// # Example
///
/// ```
/// use block_bloom_engine::engine::ScoringEngine;
///
/// let mut scoring = ScoringEngine::new();
/// scoring.record_placement(4);
/// assert_eq!(scoring.record_clear(2), 45);
/// assert_eq!(scoring.score(), 49);
/// assert_eq!(scoring.combo(), 1);
/// assert_eq!(scoring.flow_meter(), 30);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringEngine {
    score: usize,
    combo: usize,
    multiplier: ComboMultiplier,
    max_combo: usize,
    flow_meter: u8,
    lines_cleared: usize,
    pieces_placed: usize,
}

impl ScoringEngine {
    /// Upper bound of the flow meter.
    pub const MAX_FLOW: u8 = 100;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points for placing a piece of `cell_count` cells.
    #[must_use]
    pub const fn placement_score(cell_count: usize) -> usize {
        cell_count
    }

    /// Points for clearing `lines` lines at once under `multiplier`.
    #[must_use]
    pub fn line_score(lines: usize, multiplier: ComboMultiplier) -> usize {
        if lines == 0 {
            return 0;
        }
        let base = lines * POINTS_PER_LINE + (lines - 1) * MULTI_LINE_BONUS;
        multiplier.apply(base)
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub const fn combo(&self) -> usize {
        self.combo
    }

    #[must_use]
    pub const fn multiplier(&self) -> ComboMultiplier {
        self.multiplier
    }

    /// Longest combo reached in this game.
    #[must_use]
    pub const fn max_combo(&self) -> usize {
        self.max_combo
    }

    #[must_use]
    pub const fn flow_meter(&self) -> u8 {
        self.flow_meter
    }

    #[must_use]
    pub const fn lines_cleared(&self) -> usize {
        self.lines_cleared
    }

    #[must_use]
    pub const fn pieces_placed(&self) -> usize {
        self.pieces_placed
    }

    /// Updates combo, multiplier and flow after a placement cleared `lines`.
    pub fn on_lines_cleared(&mut self, lines: usize) {
        if lines == 0 {
            self.combo = 0;
            self.multiplier = ComboMultiplier::BASE;
            return;
        }
        self.combo += 1;
        self.multiplier = ComboMultiplier::for_combo(self.combo);
        self.max_combo = self.max_combo.max(self.combo);
        self.add_flow(lines);
    }

    fn add_flow(&mut self, lines: usize) {
        let gain = lines.saturating_mul(usize::from(FLOW_PER_LINE));
        let flow = usize::from(self.flow_meter).saturating_add(gain);
        #[expect(clippy::cast_possible_truncation)]
        let flow = flow.min(usize::from(Self::MAX_FLOW)) as u8;
        self.flow_meter = flow;
    }

    /// Drops the flow meter by one point, stopping at zero.
    pub fn decay_flow(&mut self) {
        self.flow_meter = self.flow_meter.saturating_sub(1);
    }

    /// Scores a placed piece and counts it. Returns the points awarded.
    pub fn record_placement(&mut self, cell_count: usize) -> usize {
        let points = Self::placement_score(cell_count);
        self.score += points;
        self.pieces_placed += 1;
        points
    }

    /// Applies the outcome of a placement that cleared `lines` lines.
    ///
    /// Updates the combo first, then scores the clear with the resulting
    /// multiplier. Returns the line points awarded.
    pub fn record_clear(&mut self, lines: usize) -> usize {
        self.on_lines_cleared(lines);
        if lines == 0 {
            return 0;
        }
        self.lines_cleared += lines;
        let points = Self::line_score(lines, self.multiplier);
        self.score += points;
        points
    }

    #[must_use]
    pub fn checkpoint(&self) -> ScoreCheckpoint {
        ScoreCheckpoint {
            score: self.score,
            combo: self.combo,
            multiplier: self.multiplier,
        }
    }

    /// Rolls score and combo back to `checkpoint`.
    ///
    /// Flow, max combo and the line/piece counters are left as they are.
    pub fn restore_checkpoint(&mut self, checkpoint: ScoreCheckpoint) {
        self.score = checkpoint.score;
        self.combo = checkpoint.combo;
        self.multiplier = checkpoint.multiplier;
    }

    /// Rebuilds the full scoring state from saved values.
    #[must_use]
    pub(crate) fn from_parts(parts: ScoringParts) -> Self {
        let ScoringParts {
            score,
            combo,
            multiplier,
            max_combo,
            flow_meter,
            lines_cleared,
            pieces_placed,
        } = parts;
        Self {
            score,
            combo,
            multiplier,
            max_combo,
            flow_meter: flow_meter.min(Self::MAX_FLOW),
            lines_cleared,
            pieces_placed,
        }
    }
}

/// Saved values for [`ScoringEngine::from_parts`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoringParts {
    pub score: usize,
    pub combo: usize,
    pub multiplier: ComboMultiplier,
    pub max_combo: usize,
    pub flow_meter: u8,
    pub lines_cleared: usize,
    pub pieces_placed: usize,
}
