use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::core::{
    board::{Board, FullLines},
    color::ColorPalette,
};

use super::{
    config::{ConfigError, GameConfig},
    history::MoveHistory,
    random::{PieceRng, SeedState, SeededRandom, SystemRandom, daily_seed},
    scoring::{ComboMultiplier, ScoreCheckpoint, ScoringEngine},
    snapshot::{SessionSnapshot, SnapshotError},
    tray::PieceTray,
};

/// Game mode chosen at start.
///
/// Only daily mode changes the rules of piece generation: it draws from a
/// generator seeded by the calendar date.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    #[display("classic")]
    Classic,
    #[display("daily")]
    Daily,
    #[display("zen")]
    Zen,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    NotStarted,
    Playing,
    GameOver,
}

/// What a successful placement did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOutcome {
    pub cells_placed: usize,
    pub cleared: FullLines,
    /// Points from cleared lines, after the combo multiplier.
    pub line_points: usize,
    /// Combo after this placement.
    pub combo: usize,
    /// Whether the tray ran out and a new batch was dealt.
    pub refilled: bool,
    pub game_over: bool,
}

impl PlacementOutcome {
    #[must_use]
    pub fn points(&self) -> usize {
        ScoringEngine::placement_score(self.cells_placed) + self.line_points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PlaceError {
    #[display("no game in progress")]
    NotPlaying,
    #[display("tray slot {slot} is empty")]
    EmptySlot { slot: usize },
    #[display("piece does not fit at ({x}, {y})")]
    InvalidPlacement { x: i32, y: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum UndoError {
    #[display("no game in progress")]
    NotPlaying,
    #[display("no undos remaining")]
    NoUndosRemaining,
    #[display("nothing to undo")]
    NothingToUndo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SwapError {
    #[display("no game in progress")]
    NotPlaying,
    #[display("no swaps remaining")]
    NoSwapsRemaining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BombError {
    #[display("no game in progress")]
    NotPlaying,
    #[display("no bombs remaining")]
    NoBombsRemaining,
    #[display("bomb is not armed")]
    NotArmed,
}

/// State rolled back by an undo.
#[derive(Debug, Clone)]
struct MoveSnapshot {
    board: Board,
    tray: PieceTray,
    score: ScoreCheckpoint,
}

/// One player's game, from start to game over and across restarts.
///
/// Every command either succeeds and bumps [`revision`](Self::revision), or
/// returns an error and leaves the session exactly as it was.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    palette: ColorPalette,
    mode: GameMode,
    state: SessionState,
    board: Board,
    tray: PieceTray,
    scoring: ScoringEngine,
    history: MoveHistory<MoveSnapshot>,
    rng: PieceRng,
    best_score: usize,
    undos: u32,
    swaps: u32,
    bombs: u32,
    bomb_armed: bool,
    decay_elapsed: Duration,
    revision: u64,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::with_valid_config(GameConfig::default())
    }
}

impl GameSession {
    /// Creates a session that has not started yet.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: GameConfig) -> Self {
        Self {
            palette: config.palette(),
            mode: GameMode::default(),
            state: SessionState::NotStarted,
            board: Board::new(config.grid_size),
            tray: PieceTray::new(),
            scoring: ScoringEngine::new(),
            history: MoveHistory::new(config.history_capacity),
            rng: PieceRng::System(SystemRandom::new()),
            best_score: 0,
            undos: config.starting_undos,
            swaps: config.starting_swaps,
            bombs: config.starting_bombs,
            bomb_armed: false,
            decay_elapsed: Duration::ZERO,
            revision: 0,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        !self.state.is_not_started()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn tray(&self) -> &PieceTray {
        &self.tray
    }

    #[must_use]
    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.scoring.score()
    }

    /// Highest score reached by this session object, across games.
    #[must_use]
    pub fn best_score(&self) -> usize {
        self.best_score
    }

    #[must_use]
    pub fn combo(&self) -> usize {
        self.scoring.combo()
    }

    #[must_use]
    pub fn multiplier(&self) -> ComboMultiplier {
        self.scoring.multiplier()
    }

    #[must_use]
    pub fn max_combo(&self) -> usize {
        self.scoring.max_combo()
    }

    #[must_use]
    pub fn flow_meter(&self) -> u8 {
        self.scoring.flow_meter()
    }

    #[must_use]
    pub fn lines_cleared(&self) -> usize {
        self.scoring.lines_cleared()
    }

    #[must_use]
    pub fn pieces_placed(&self) -> usize {
        self.scoring.pieces_placed()
    }

    #[must_use]
    pub fn undos_remaining(&self) -> u32 {
        self.undos
    }

    #[must_use]
    pub fn swaps_remaining(&self) -> u32 {
        self.swaps
    }

    #[must_use]
    pub fn bombs_remaining(&self) -> u32 {
        self.bombs
    }

    #[must_use]
    pub fn is_bomb_armed(&self) -> bool {
        self.bomb_armed
    }

    /// Number of moves that can currently be undone, ignoring the undo budget.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Seed and position of the piece generator, for seeded games.
    #[must_use]
    pub fn seed_state(&self) -> Option<SeedState> {
        self.rng.seed_state()
    }

    /// Counter bumped after every state change.
    ///
    /// Renderers poll this instead of diffing the whole session.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the piece in `slot` fits anywhere on the board.
    ///
    /// Empty slots never fit.
    #[must_use]
    pub fn can_place_slot(&self, slot: usize) -> bool {
        self.tray
            .get(slot)
            .is_some_and(|piece| self.board.has_any_placement(piece.shape()))
    }

    /// Starts a new game, using today's local date for daily mode.
    pub fn start(&mut self, mode: GameMode) {
        self.start_on(mode, Local::now().date_naive());
    }

    /// Starts a new game as if it were `date`.
    ///
    /// The date only matters for [`GameMode::Daily`].
    pub fn start_on(&mut self, mode: GameMode, date: NaiveDate) {
        let rng = match mode {
            GameMode::Daily => PieceRng::Seeded(SeededRandom::new(daily_seed(date))),
            GameMode::Classic | GameMode::Zen => PieceRng::System(SystemRandom::new()),
        };
        self.reset(mode, rng);
    }

    /// Starts a new game whose pieces come from a generator seeded with `seed`,
    /// whatever the mode.
    pub fn start_with_seed(&mut self, mode: GameMode, seed: u64) {
        self.reset(mode, PieceRng::Seeded(SeededRandom::new(seed)));
    }

    fn reset(&mut self, mode: GameMode, rng: PieceRng) {
        self.mode = mode;
        self.rng = rng;
        self.board = Board::new(self.config.grid_size);
        self.tray.clear();
        self.scoring = ScoringEngine::new();
        self.history.clear();
        self.undos = self.config.starting_undos;
        self.swaps = self.config.starting_swaps;
        self.bombs = self.config.starting_bombs;
        self.bomb_armed = false;
        self.decay_elapsed = Duration::ZERO;
        self.state = SessionState::Playing;
        self.refill();
        self.revision += 1;
        info!(%mode, seed = ?self.rng.seed_state(), "game started");
    }

    /// Places the piece in `slot` with its top-left corner at `(x, y)`.
    #[instrument(level = "debug", skip(self), err(level = "debug"))]
    pub fn place_piece(
        &mut self,
        slot: usize,
        x: i32,
        y: i32,
    ) -> Result<PlacementOutcome, PlaceError> {
        if !self.state.is_playing() {
            return Err(PlaceError::NotPlaying);
        }
        let piece = self.tray.get(slot).ok_or(PlaceError::EmptySlot { slot })?;
        if !self.board.can_place(piece.shape(), x, y) {
            return Err(PlaceError::InvalidPlacement { x, y });
        }

        self.push_history();
        let Some(piece) = self.tray.consume(slot) else {
            unreachable!("slot {slot} was checked to hold a piece");
        };
        self.board.place(piece.shape(), x, y, piece.color());
        self.scoring.record_placement(piece.cell_count());

        let cleared = self.board.detect_full_lines();
        self.board.clear_lines(&cleared);
        let line_points = self.scoring.record_clear(cleared.count());
        self.update_best_score();

        let refilled = self.tray.all_empty();
        if refilled {
            self.refill();
        }
        let game_over = self.check_game_over();
        self.revision += 1;

        debug!(
            shape = piece.shape_id(),
            lines = cleared.count(),
            line_points,
            combo = self.scoring.combo(),
            score = self.scoring.score(),
            "piece placed"
        );
        Ok(PlacementOutcome {
            cells_placed: piece.cell_count(),
            cleared,
            line_points,
            combo: self.scoring.combo(),
            refilled,
            game_over,
        })
    }

    /// Rolls back the most recent placement, swap or bomb.
    ///
    /// Restores the board, the tray, the score and the combo. Flow, power-up
    /// counts and the per-game counters keep their current values.
    #[instrument(level = "debug", skip(self), err(level = "debug"))]
    pub fn undo(&mut self) -> Result<(), UndoError> {
        if !self.state.is_playing() {
            return Err(UndoError::NotPlaying);
        }
        if self.undos == 0 {
            return Err(UndoError::NoUndosRemaining);
        }
        let snapshot = self.history.pop().ok_or(UndoError::NothingToUndo)?;
        self.board = snapshot.board;
        self.tray = snapshot.tray;
        self.scoring.restore_checkpoint(snapshot.score);
        self.undos -= 1;
        self.revision += 1;
        debug!(undos = self.undos, score = self.scoring.score(), "move undone");
        Ok(())
    }

    /// Discards the whole tray and deals a new batch.
    ///
    /// The game never ends here, even if nothing in the new batch fits, so
    /// the swap can still be undone.
    #[instrument(level = "debug", skip(self), err(level = "debug"))]
    pub fn swap_pieces(&mut self) -> Result<(), SwapError> {
        if !self.state.is_playing() {
            return Err(SwapError::NotPlaying);
        }
        if self.swaps == 0 {
            return Err(SwapError::NoSwapsRemaining);
        }
        self.push_history();
        self.tray.clear();
        self.refill();
        self.swaps -= 1;
        self.revision += 1;
        debug!(swaps = self.swaps, "pieces swapped");
        Ok(())
    }

    /// Arms the bomb so that the next [`use_bomb`](Self::use_bomb) detonates.
    #[instrument(level = "debug", skip(self), err(level = "debug"))]
    pub fn activate_bomb(&mut self) -> Result<(), BombError> {
        if !self.state.is_playing() {
            return Err(BombError::NotPlaying);
        }
        if self.bombs == 0 {
            return Err(BombError::NoBombsRemaining);
        }
        self.bomb_armed = true;
        self.revision += 1;
        debug!(bombs = self.bombs, "bomb armed");
        Ok(())
    }

    /// Disarms the bomb without using it. Returns whether it was armed.
    pub fn cancel_bomb(&mut self) -> bool {
        let was_armed = std::mem::take(&mut self.bomb_armed);
        if was_armed {
            self.revision += 1;
            debug!("bomb disarmed");
        }
        was_armed
    }

    /// Empties every cell around `(x, y)` within the configured radius.
    ///
    /// Cleared cells never count as cleared lines and score nothing.
    #[instrument(level = "debug", skip(self), err(level = "debug"))]
    pub fn use_bomb(&mut self, x: i32, y: i32) -> Result<(), BombError> {
        if !self.state.is_playing() {
            return Err(BombError::NotPlaying);
        }
        if !self.bomb_armed {
            return Err(BombError::NotArmed);
        }
        if self.bombs == 0 {
            return Err(BombError::NoBombsRemaining);
        }
        self.push_history();
        let cleared = self.board.clear_area(x, y, self.config.bomb_radius);
        self.bombs -= 1;
        self.bomb_armed = false;
        self.revision += 1;
        debug!(cleared, bombs = self.bombs, "bomb used");
        Ok(())
    }

    /// Advances the flow-meter clock by `elapsed`.
    ///
    /// The meter loses one point per full decay interval. Time only counts
    /// while a game is in progress, and the leftover is carried to the next
    /// tick. Returns how many points were lost.
    pub fn tick(&mut self, elapsed: Duration) -> u8 {
        if !self.state.is_playing() {
            return 0;
        }
        let interval = self.config.flow_decay_interval().as_nanos();
        let total = self.decay_elapsed.saturating_add(elapsed).as_nanos();
        let steps = u8::try_from(total / interval).unwrap_or(u8::MAX);
        let carry = u64::try_from(total % interval).unwrap_or(u64::MAX);
        self.decay_elapsed = Duration::from_nanos(carry);

        let before = self.scoring.flow_meter();
        for _ in 0..steps {
            self.scoring.decay_flow();
        }
        let decayed = before - self.scoring.flow_meter();
        if decayed > 0 {
            self.revision += 1;
            trace!(decayed, flow = self.scoring.flow_meter(), "flow decayed");
        }
        decayed
    }

    /// Captures everything needed to resume this game later.
    ///
    /// Undo history is not included.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            state: self.state,
            grid_size: self.board.size(),
            cells: self.board.cells().iter().map(|cell| cell.color()).collect(),
            tray: self.tray.clone(),
            score: self.scoring.score(),
            best_score: self.best_score,
            combo: self.scoring.combo(),
            multiplier: self.scoring.multiplier(),
            max_combo: self.scoring.max_combo(),
            flow_meter: self.scoring.flow_meter(),
            undos: self.undos,
            swaps: self.swaps,
            bombs: self.bombs,
            lines_cleared: self.scoring.lines_cleared(),
            pieces_placed: self.scoring.pieces_placed(),
            rng: self.rng.seed_state(),
        }
    }

    /// Replaces the current game with a saved one.
    ///
    /// The snapshot is fully validated first; on error the session is left
    /// untouched. The undo history starts out empty and the bomb disarmed. A
    /// game saved with no legal move left is ended on load.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<(), SnapshotError> {
        let restored = snapshot.validate(&self.config, &self.palette)?;
        self.mode = snapshot.mode;
        self.state = snapshot.state;
        self.board = restored.board;
        self.tray = snapshot.tray.clone();
        self.scoring = restored.scoring;
        self.rng = match snapshot.rng {
            Some(state) => PieceRng::Seeded(SeededRandom::resume(state)),
            None => PieceRng::System(SystemRandom::new()),
        };
        self.best_score = self
            .best_score
            .max(snapshot.best_score)
            .max(snapshot.score);
        self.undos = snapshot.undos;
        self.swaps = snapshot.swaps;
        self.bombs = snapshot.bombs;
        self.history.clear();
        self.bomb_armed = false;
        self.decay_elapsed = Duration::ZERO;
        if self.state.is_playing() {
            self.check_game_over();
        }
        self.revision += 1;
        info!(mode = %self.mode, state = ?self.state, score = snapshot.score, "game restored");
        Ok(())
    }

    fn push_history(&mut self) {
        self.history.push(MoveSnapshot {
            board: self.board.clone(),
            tray: self.tray.clone(),
            score: self.scoring.checkpoint(),
        });
    }

    fn refill(&mut self) {
        let filled = self
            .tray
            .refill_empty_slots(&self.config.catalog, &mut self.rng, &self.palette);
        trace!(filled, "tray refilled");
    }

    fn update_best_score(&mut self) {
        self.best_score = self.best_score.max(self.scoring.score());
    }

    /// True when the tray holds pieces and none of them fits anywhere.
    fn no_moves_left(&self) -> bool {
        if self.tray.all_empty() {
            return false;
        }
        self.tray
            .pieces()
            .all(|(_, piece)| !self.board.has_any_placement(piece.shape()))
    }

    /// Ends the game if no move is left. Returns whether it ended.
    fn check_game_over(&mut self) -> bool {
        if !self.no_moves_left() {
            return false;
        }
        self.state = SessionState::GameOver;
        self.bomb_armed = false;
        info!(
            score = self.scoring.score(),
            best_score = self.best_score,
            lines_cleared = self.scoring.lines_cleared(),
            pieces_placed = self.scoring.pieces_placed(),
            max_combo = self.scoring.max_combo(),
            "game over"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{
        board::Cell,
        color::ColorId,
        piece::Piece,
        shape::{CatalogEntry, PieceCatalog, PieceShape},
    };

    use super::*;

    fn dot_only_config() -> GameConfig {
        let catalog = PieceCatalog::new(vec![CatalogEntry {
            name: "dot".into(),
            shape: PieceShape::parse(["#"]).unwrap(),
            weight: 1,
        }])
        .unwrap();
        GameConfig {
            catalog,
            ..GameConfig::default()
        }
    }

    fn started(config: GameConfig) -> GameSession {
        let mut session = GameSession::new(config).unwrap();
        session.start_with_seed(GameMode::Classic, 1);
        session
    }

    fn board_from_fn(filled: impl Fn(usize, usize) -> bool) -> Board {
        let size = Board::DEFAULT_SIZE;
        let cells = (0..size * size)
            .map(|i| {
                if filled(i % size, i / size) {
                    Cell::filled(ColorId::new(0))
                } else {
                    Cell::EMPTY
                }
            })
            .collect();
        Board::from_cells(size, cells).unwrap()
    }

    fn tray_of(names: [Option<&str>; 3]) -> PieceTray {
        let catalog = PieceCatalog::standard();
        PieceTray::from_slots(
            names.map(|name| name.map(|n| Piece::new(catalog.get(n).unwrap(), ColorId::new(1)))),
        )
    }

    fn arrange(session: &mut GameSession, board: Board, tray: PieceTray) {
        session.board = board;
        session.tray = tray;
    }

    #[test]
    fn test_new_session_is_not_started() {
        let mut session = GameSession::default();
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(!session.is_started());
        assert!(session.tray().all_empty());
        assert_eq!(session.place_piece(0, 0, 0), Err(PlaceError::NotPlaying));
        assert_eq!(session.undo(), Err(UndoError::NotPlaying));
        assert_eq!(session.swap_pieces(), Err(SwapError::NotPlaying));
        assert_eq!(session.activate_bomb(), Err(BombError::NotPlaying));
        assert_eq!(session.use_bomb(0, 0), Err(BombError::NotPlaying));
        assert_eq!(session.tick(Duration::from_secs(5)), 0);
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = GameConfig {
            grid_size: 0,
            ..GameConfig::default()
        };
        assert_eq!(GameSession::new(config).err(), Some(ConfigError::ZeroGridSize));
    }

    #[test]
    fn test_start_resets_everything() {
        let config = GameConfig {
            starting_bombs: 2,
            ..GameConfig::default()
        };
        let mut session = started(config);
        assert!(session.state().is_playing());
        assert_eq!(session.tray().pieces().count(), 3);
        assert!(session.board().is_empty());
        assert_eq!(session.undos_remaining(), 3);
        assert_eq!(session.swaps_remaining(), 1);
        assert_eq!(session.bombs_remaining(), 2);
        assert_eq!(session.multiplier(), ComboMultiplier::BASE);
        assert_eq!(session.seed_state(), Some(SeedState { seed: 1, draws: 6 }));

        session.swap_pieces().unwrap();
        session.activate_bomb().unwrap();
        session.start(GameMode::Zen);
        assert_eq!(session.mode(), GameMode::Zen);
        assert_eq!(session.swaps_remaining(), 1);
        assert!(!session.is_bomb_armed());
        assert_eq!(session.history_len(), 0);
        assert_eq!(session.seed_state(), None);
    }

    #[test]
    fn test_place_scores_cells_and_consumes_slot() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            Board::new(10),
            tray_of([Some("tetro_t1"), Some("dot"), None]),
        );
        let revision = session.revision();

        let outcome = session.place_piece(0, 3, 3).unwrap();
        assert_eq!(outcome.cells_placed, 4);
        assert!(outcome.cleared.is_empty());
        assert_eq!(outcome.points(), 4);
        assert!(!outcome.refilled);
        assert!(!outcome.game_over);
        assert_eq!(session.score(), 4);
        assert_eq!(session.best_score(), 4);
        assert_eq!(session.pieces_placed(), 1);
        assert_eq!(session.board().filled_count(), 4);
        assert!(session.tray().get(0).is_none());
        assert!(session.tray().get(1).is_some());
        assert_eq!(session.revision(), revision + 1);
    }

    #[test]
    fn test_rejected_placements_change_nothing() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            board_from_fn(|x, y| x == 0 && y == 0),
            tray_of([Some("tetro_o"), None, Some("dot")]),
        );
        let before = session.snapshot();
        let revision = session.revision();

        assert_eq!(
            session.place_piece(1, 5, 5),
            Err(PlaceError::EmptySlot { slot: 1 })
        );
        assert_eq!(
            session.place_piece(7, 5, 5),
            Err(PlaceError::EmptySlot { slot: 7 })
        );
        assert_eq!(
            session.place_piece(0, -1, 0),
            Err(PlaceError::InvalidPlacement { x: -1, y: 0 })
        );
        assert_eq!(
            session.place_piece(0, 9, 0),
            Err(PlaceError::InvalidPlacement { x: 9, y: 0 })
        );
        assert_eq!(
            session.place_piece(2, 0, 0),
            Err(PlaceError::InvalidPlacement { x: 0, y: 0 })
        );
        assert_eq!(session.snapshot(), before);
        assert_eq!(session.revision(), revision);
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_line_clear_scoring_and_combo() {
        let mut session = started(GameConfig::default());
        // row 0 and row 1 each miss their last cell
        arrange(
            &mut session,
            board_from_fn(|x, y| y < 2 && x < 9),
            tray_of([Some("dot"), Some("dot"), Some("tetro_o")]),
        );

        let outcome = session.place_piece(0, 9, 0).unwrap();
        assert_eq!(outcome.cleared.rows, [0]);
        assert!(outcome.cleared.cols.is_empty());
        assert_eq!(outcome.line_points, 10);
        assert_eq!(outcome.combo, 1);
        assert_eq!(session.score(), 11);
        assert_eq!(session.flow_meter(), 15);
        assert_eq!(session.board().filled_count(), 9);

        let outcome = session.place_piece(1, 9, 1).unwrap();
        assert_eq!(outcome.line_points, 12);
        assert_eq!(session.combo(), 2);
        assert_eq!(session.multiplier().tenths(), 12);
        assert_eq!(session.score(), 11 + 13);
        assert!(session.board().is_empty());

        let outcome = session.place_piece(2, 0, 0).unwrap();
        assert_eq!(outcome.line_points, 0);
        assert_eq!(session.combo(), 0);
        assert_eq!(session.max_combo(), 2);
        assert_eq!(session.lines_cleared(), 2);
        assert!(outcome.refilled);
        assert_eq!(session.tray().pieces().count(), 3);
    }

    #[test]
    fn test_row_and_column_clear_together() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            board_from_fn(|x, y| (x == 0) != (y == 0)),
            tray_of([Some("dot"), Some("dot"), None]),
        );
        let outcome = session.place_piece(0, 0, 0).unwrap();
        assert_eq!(outcome.cleared.rows, [0]);
        assert_eq!(outcome.cleared.cols, [0]);
        assert_eq!(outcome.line_points, 45);
        assert_eq!(session.score(), 46);
        assert_eq!(session.flow_meter(), 30);
        assert!(session.board().is_empty());
    }

    #[test]
    fn test_empty_board_is_never_game_over() {
        let mut session = started(GameConfig::default());
        for name in ["big_square", "pento_i_h", "dot"] {
            arrange(&mut session, Board::new(10), tray_of([Some(name), None, None]));
            assert!(!session.no_moves_left());
        }
    }

    #[test]
    fn test_empty_tray_is_not_game_over() {
        let mut session = started(GameConfig::default());
        arrange(&mut session, board_from_fn(|_, _| true), PieceTray::new());
        assert!(!session.no_moves_left());
    }

    #[test]
    fn test_full_board_with_dots_is_game_over() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            board_from_fn(|_, _| true),
            tray_of([Some("dot"), Some("dot"), Some("dot")]),
        );
        assert!(session.no_moves_left());
        assert!(!session.can_place_slot(0));
    }

    #[test]
    fn test_single_hole_fits_dot_but_not_square() {
        let mut session = started(GameConfig::default());
        let holed = || board_from_fn(|x, y| (x, y) != (0, 0));

        arrange(&mut session, holed(), tray_of([Some("dot"), None, None]));
        assert!(!session.no_moves_left());
        assert!(session.can_place_slot(0));

        arrange(&mut session, holed(), tray_of([Some("tetro_o"), None, None]));
        assert!(session.no_moves_left());
        assert!(!session.can_place_slot(0));
        assert!(!session.can_place_slot(1));
    }

    #[test]
    fn test_placement_can_end_the_game() {
        let mut session = started(GameConfig::default());
        // two empty cells per row and column, never two side by side
        arrange(
            &mut session,
            board_from_fn(|x, y| x != y && x != (y + 2) % 10),
            tray_of([Some("dot"), Some("tetro_o"), Some("tetro_o")]),
        );
        let outcome = session.place_piece(0, 0, 0).unwrap();
        assert!(outcome.cleared.is_empty());
        assert!(outcome.game_over);
        assert!(session.is_game_over());
        assert_eq!(session.place_piece(1, 0, 0), Err(PlaceError::NotPlaying));
        assert_eq!(session.undo(), Err(UndoError::NotPlaying));
        assert_eq!(session.tick(Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_undo_restores_board_tray_and_score_only() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            board_from_fn(|x, y| y == 0 && x < 9),
            tray_of([Some("dot"), Some("dot"), None]),
        );
        let board = session.board().clone();
        let tray = session.tray().clone();

        session.place_piece(0, 9, 0).unwrap();
        assert_eq!(session.score(), 11);
        assert_eq!(session.combo(), 1);

        session.undo().unwrap();
        assert_eq!(session.board(), &board);
        assert_eq!(session.tray(), &tray);
        assert_eq!(session.score(), 0);
        assert_eq!(session.combo(), 0);
        assert_eq!(session.multiplier(), ComboMultiplier::BASE);
        assert_eq!(session.undos_remaining(), 2);
        // not rolled back
        assert_eq!(session.flow_meter(), 15);
        assert_eq!(session.lines_cleared(), 1);
        assert_eq!(session.pieces_placed(), 1);
        assert_eq!(session.max_combo(), 1);
        assert_eq!(session.best_score(), 11);

        assert_eq!(session.undo(), Err(UndoError::NothingToUndo));
        assert_eq!(session.undos_remaining(), 2);
    }

    #[test]
    fn test_undo_history_keeps_three_moves() {
        let config = GameConfig {
            starting_undos: 10,
            ..dot_only_config()
        };
        let mut session = started(config);
        // the tray refills after every third dot
        for (slot, x) in [0, 1, 2, 0, 1].into_iter().zip(0..) {
            session.place_piece(slot, x, 0).unwrap();
        }
        assert_eq!(session.history_len(), 3);
        for _ in 0..3 {
            session.undo().unwrap();
        }
        assert_eq!(session.board().filled_count(), 2);
        assert_eq!(session.undo(), Err(UndoError::NothingToUndo));
        assert_eq!(session.undos_remaining(), 7);
    }

    #[test]
    fn test_undo_budget_runs_out() {
        let config = GameConfig {
            starting_undos: 1,
            ..dot_only_config()
        };
        let mut session = started(config);
        session.place_piece(0, 0, 0).unwrap();
        session.place_piece(1, 1, 0).unwrap();
        session.undo().unwrap();
        assert_eq!(session.undo(), Err(UndoError::NoUndosRemaining));
        assert_eq!(session.board().filled_count(), 1);
    }

    #[test]
    fn test_swap_deals_new_batch_and_can_be_undone() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            Board::new(10),
            tray_of([Some("dot"), None, None]),
        );
        let tray = session.tray().clone();

        session.swap_pieces().unwrap();
        assert_eq!(session.swaps_remaining(), 0);
        assert_eq!(session.tray().pieces().count(), 3);
        assert_eq!(session.swap_pieces(), Err(SwapError::NoSwapsRemaining));

        session.undo().unwrap();
        assert_eq!(session.tray(), &tray);
        assert_eq!(session.swaps_remaining(), 0);
    }

    #[test]
    fn test_swap_into_dead_tray_can_be_undone() {
        let big_only = PieceCatalog::new(vec![CatalogEntry {
            name: "big_square".into(),
            shape: PieceShape::parse(["###", "###", "###"]).unwrap(),
            weight: 1,
        }])
        .unwrap();
        let mut session = started(GameConfig {
            catalog: big_only,
            ..GameConfig::default()
        });
        arrange(
            &mut session,
            board_from_fn(|x, y| (x + y) % 2 == 0),
            tray_of([Some("dot"), None, None]),
        );
        let tray = session.tray().clone();

        session.swap_pieces().unwrap();
        assert!(session.state().is_playing());
        assert!((0..3).all(|slot| !session.can_place_slot(slot)));

        session.undo().unwrap();
        assert_eq!(session.tray(), &tray);
        assert!(session.can_place_slot(0));
        assert_eq!(session.undos_remaining(), 2);
    }

    #[test]
    fn test_restore_dead_position_ends_game() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            board_from_fn(|x, y| (x + y) % 2 == 0),
            tray_of([Some("tetro_o"), None, None]),
        );
        let snapshot = session.snapshot();
        assert!(snapshot.state.is_playing());

        let mut other = GameSession::default();
        other.restore(&snapshot).unwrap();
        assert!(other.is_game_over());
        assert_eq!(other.score(), snapshot.score);
    }

    #[test]
    fn test_bomb_lifecycle() {
        let mut session = started(GameConfig::default());
        assert_eq!(session.activate_bomb(), Err(BombError::NoBombsRemaining));
        assert_eq!(session.use_bomb(5, 5), Err(BombError::NotArmed));

        let mut session = started(GameConfig {
            starting_bombs: 1,
            ..GameConfig::default()
        });
        arrange(
            &mut session,
            board_from_fn(|x, y| (x + y) % 2 == 1),
            tray_of([Some("dot"), None, None]),
        );
        let filled = session.board().filled_count();
        let score = session.score();

        session.activate_bomb().unwrap();
        assert!(session.is_bomb_armed());
        assert!(session.cancel_bomb());
        assert!(!session.cancel_bomb());
        assert_eq!(session.use_bomb(5, 5), Err(BombError::NotArmed));
        assert_eq!(session.bombs_remaining(), 1);

        session.activate_bomb().unwrap();
        session.use_bomb(5, 5).unwrap();
        assert!(!session.is_bomb_armed());
        assert_eq!(session.bombs_remaining(), 0);
        assert_eq!(session.board().filled_count(), filled - 4);
        for y in 4..=6 {
            for x in 4..=6 {
                assert!(session.board().cell(x, y).unwrap().is_empty());
            }
        }
        assert_eq!(session.score(), score);
        assert_eq!(session.activate_bomb(), Err(BombError::NoBombsRemaining));

        session.undo().unwrap();
        assert_eq!(session.board().filled_count(), filled);
        assert_eq!(session.bombs_remaining(), 0);
    }

    #[test]
    fn test_bomb_at_corner_stays_in_bounds() {
        let mut session = started(GameConfig {
            starting_bombs: 1,
            ..GameConfig::default()
        });
        arrange(
            &mut session,
            board_from_fn(|x, y| (x + y) % 3 != 0),
            tray_of([Some("dot"), None, None]),
        );
        let filled = session.board().filled_count();
        session.activate_bomb().unwrap();
        session.use_bomb(0, 0).unwrap();
        // (0,0) was already empty
        assert_eq!(session.board().filled_count(), filled - 3);
    }

    #[test]
    fn test_tick_decays_flow_with_carry() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            board_from_fn(|x, y| y == 0 && x < 9),
            tray_of([Some("dot"), Some("dot"), None]),
        );
        session.place_piece(0, 9, 0).unwrap();
        assert_eq!(session.flow_meter(), 15);

        assert_eq!(session.tick(Duration::from_millis(499)), 0);
        assert_eq!(session.flow_meter(), 15);
        assert_eq!(session.tick(Duration::from_millis(1)), 1);
        assert_eq!(session.flow_meter(), 14);
        assert_eq!(session.tick(Duration::from_millis(1_250)), 2);
        assert_eq!(session.tick(Duration::from_millis(250)), 1);
        assert_eq!(session.flow_meter(), 11);
        assert_eq!(session.tick(Duration::from_secs(3600)), 11);
        assert_eq!(session.flow_meter(), 0);
        assert_eq!(session.tick(Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_best_score_survives_restart() {
        let mut session = started(GameConfig::default());
        arrange(
            &mut session,
            Board::new(10),
            tray_of([Some("pento_plus"), None, None]),
        );
        session.place_piece(0, 0, 0).unwrap();
        assert_eq!(session.best_score(), 5);

        session.start_with_seed(GameMode::Classic, 2);
        assert_eq!(session.score(), 0);
        assert_eq!(session.best_score(), 5);
    }

    #[test]
    fn test_daily_mode_is_seeded_by_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut a = GameSession::default();
        let mut b = GameSession::default();
        a.start_on(GameMode::Daily, date);
        b.start_on(GameMode::Daily, date);
        assert_eq!(a.tray(), b.tray());
        assert_eq!(
            a.seed_state(),
            Some(SeedState {
                seed: 20_261_019,
                draws: 6
            })
        );

        a.start_on(GameMode::Classic, date);
        assert_eq!(a.seed_state(), None);
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(GameMode::Daily.to_string(), "daily");
        assert_eq!(serde_json::to_string(&GameMode::Zen).unwrap(), r#""zen""#);
        assert_eq!(
            serde_json::to_string(&SessionState::GameOver).unwrap(),
            r#""game_over""#
        );
    }
}
