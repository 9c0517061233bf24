use serde::{Deserialize, Serialize};

use crate::core::{
    board::{Board, BoardError, Cell},
    color::{ColorId, ColorPalette},
};

use super::{
    config::GameConfig,
    random::SeedState,
    scoring::{ComboMultiplier, ScoringEngine, ScoringParts},
    session::{GameMode, SessionState},
    tray::PieceTray,
};

/// A saved game.
///
/// Holds everything needed to resume play except the undo history. Produced
/// by [`GameSession::snapshot`](super::GameSession::snapshot) and consumed by
/// [`GameSession::restore`](super::GameSession::restore), which validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: GameMode,
    pub state: SessionState,
    pub grid_size: usize,
    /// Row-major cell colors; `None` for empty cells.
    pub cells: Vec<Option<ColorId>>,
    pub tray: PieceTray,
    pub score: usize,
    pub best_score: usize,
    pub combo: usize,
    pub multiplier: ComboMultiplier,
    pub max_combo: usize,
    pub flow_meter: u8,
    pub undos: u32,
    pub swaps: u32,
    pub bombs: u32,
    pub lines_cleared: usize,
    pub pieces_placed: usize,
    /// Generator position, present for seeded games.
    pub rng: Option<SeedState>,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SnapshotError {
    #[display("snapshot is for a {actual}x{actual} board, session uses {expected}x{expected}")]
    GridSizeMismatch { expected: usize, actual: usize },
    #[display("invalid board: {_0}")]
    Board(BoardError),
    #[display("color {_0} is not in the palette")]
    UnknownColor(#[error(not(source))] ColorId),
    #[display("combo {combo} does not match multiplier {multiplier}")]
    MultiplierMismatch {
        combo: usize,
        multiplier: ComboMultiplier,
    },
    #[display("flow meter {_0} exceeds 100")]
    FlowOutOfRange(#[error(not(source))] u8),
    #[display("max combo {max_combo} is below current combo {combo}")]
    MaxComboBelowCombo { combo: usize, max_combo: usize },
    #[display("game in progress with an empty tray")]
    EmptyTray,
    #[display("daily game without a seed")]
    MissingSeed,
}

/// Validated parts of a snapshot, ready to install into a session.
#[derive(Debug)]
pub(crate) struct RestoredParts {
    pub board: Board,
    pub scoring: ScoringEngine,
}

impl SessionSnapshot {
    pub(crate) fn validate(
        &self,
        config: &GameConfig,
        palette: &ColorPalette,
    ) -> Result<RestoredParts, SnapshotError> {
        if self.grid_size != config.grid_size {
            return Err(SnapshotError::GridSizeMismatch {
                expected: config.grid_size,
                actual: self.grid_size,
            });
        }
        let cells = self
            .cells
            .iter()
            .map(|color| match *color {
                Some(color) if !palette.contains(color) => Err(SnapshotError::UnknownColor(color)),
                Some(color) => Ok(Cell::filled(color)),
                None => Ok(Cell::EMPTY),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let board = Board::from_cells(self.grid_size, cells).map_err(SnapshotError::Board)?;

        if let Some((_, piece)) = self.tray.pieces().find(|(_, p)| !palette.contains(p.color())) {
            return Err(SnapshotError::UnknownColor(piece.color()));
        }
        if self.state.is_playing() && self.tray.all_empty() {
            return Err(SnapshotError::EmptyTray);
        }
        if self.multiplier != ComboMultiplier::for_combo(self.combo) {
            return Err(SnapshotError::MultiplierMismatch {
                combo: self.combo,
                multiplier: self.multiplier,
            });
        }
        if self.max_combo < self.combo {
            return Err(SnapshotError::MaxComboBelowCombo {
                combo: self.combo,
                max_combo: self.max_combo,
            });
        }
        if self.flow_meter > ScoringEngine::MAX_FLOW {
            return Err(SnapshotError::FlowOutOfRange(self.flow_meter));
        }
        if self.mode == GameMode::Daily && self.rng.is_none() {
            return Err(SnapshotError::MissingSeed);
        }

        let scoring = ScoringEngine::from_parts(ScoringParts {
            score: self.score,
            combo: self.combo,
            multiplier: self.multiplier,
            max_combo: self.max_combo,
            flow_meter: self.flow_meter,
            lines_cleared: self.lines_cleared,
            pieces_placed: self.pieces_placed,
        });
        Ok(RestoredParts { board, scoring })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::engine::session::GameSession;

    use super::*;

    fn daily_session() -> GameSession {
        let mut session = GameSession::default();
        session.start_on(GameMode::Daily, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        session
    }

    fn play_a_bit(session: &mut GameSession) {
        for _ in 0..4 {
            let Some((slot, x, y)) = session.tray().pieces().find_map(|(slot, piece)| {
                session
                    .board()
                    .placements(piece.shape())
                    .next()
                    .map(|(x, y)| (slot, x, y))
            }) else {
                break;
            };
            session.place_piece(slot, x, y).unwrap();
        }
    }

    #[test]
    fn test_roundtrip_resumes_same_game() {
        let mut session = daily_session();
        play_a_bit(&mut session);
        let snapshot = session.snapshot();

        let json = serde_json::to_string(&snapshot).unwrap();
        let loaded: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, snapshot);

        let mut resumed = GameSession::default();
        resumed.restore(&loaded).unwrap();
        assert_eq!(resumed.snapshot(), snapshot);
        assert_eq!(resumed.history_len(), 0);

        // both continue with the same pieces
        session.swap_pieces().unwrap();
        resumed.swap_pieces().unwrap();
        assert_eq!(session.tray(), resumed.tray());
    }

    #[test]
    fn test_restore_failure_leaves_session_untouched() {
        let mut session = daily_session();
        play_a_bit(&mut session);
        let before = session.snapshot();
        let revision = session.revision();

        let mut bad = before.clone();
        bad.cells.pop();
        assert_eq!(
            session.restore(&bad),
            Err(SnapshotError::Board(BoardError::CellCountMismatch {
                expected: 100,
                actual: 99
            }))
        );

        let mut bad = before.clone();
        bad.grid_size = 8;
        assert!(matches!(
            session.restore(&bad),
            Err(SnapshotError::GridSizeMismatch { expected: 10, actual: 8 })
        ));

        let mut bad = before.clone();
        bad.flow_meter = 101;
        assert_eq!(session.restore(&bad), Err(SnapshotError::FlowOutOfRange(101)));

        let mut bad = before.clone();
        bad.cells[0] = Some(ColorId::new(42));
        assert_eq!(
            session.restore(&bad),
            Err(SnapshotError::UnknownColor(ColorId::new(42)))
        );

        let mut bad = before.clone();
        bad.combo = before.combo + 2;
        bad.max_combo = bad.combo;
        assert!(matches!(
            session.restore(&bad),
            Err(SnapshotError::MultiplierMismatch { .. })
        ));

        let mut bad = before.clone();
        bad.max_combo = 0;
        bad.combo = 1;
        bad.multiplier = ComboMultiplier::BASE;
        assert_eq!(
            session.restore(&bad),
            Err(SnapshotError::MaxComboBelowCombo {
                combo: 1,
                max_combo: 0
            })
        );

        let mut bad = before.clone();
        bad.rng = None;
        assert_eq!(session.restore(&bad), Err(SnapshotError::MissingSeed));

        let mut bad = before.clone();
        bad.tray = PieceTray::new();
        assert_eq!(session.restore(&bad), Err(SnapshotError::EmptyTray));

        assert_eq!(session.snapshot(), before);
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn test_corrupt_json_is_rejected() {
        let snapshot = daily_session().snapshot();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["multiplier"] = serde_json::json!(5.0);
        assert!(serde_json::from_value::<SessionSnapshot>(value).is_err());

        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["tray"]["slots"][0]["cell_count"] = serde_json::json!(99);
        assert!(serde_json::from_value::<SessionSnapshot>(value).is_err());
    }

    #[test]
    fn test_restore_keeps_higher_best_score() {
        let mut session = daily_session();
        play_a_bit(&mut session);
        let mut snapshot = session.snapshot();
        snapshot.best_score = 1_000;

        let mut other = GameSession::default();
        other.restore(&snapshot).unwrap();
        assert_eq!(other.best_score(), 1_000);
        assert_eq!(other.mode(), GameMode::Daily);
        assert!(other.state().is_playing());
    }
}
