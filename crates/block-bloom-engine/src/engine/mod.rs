//! Game rules and session state.
//!
//! This module assembles the core data structures into a playable game:
//!
//! - [`GameSession`] - One game from start to game over, plus power-ups and undo
//! - [`PieceTray`] - The three pieces on offer
//! - [`ScoringEngine`] - Score, combo multiplier and flow meter
//! - [`MoveHistory`] - Bounded undo stack
//! - [`RandomSource`] - Uniform values for piece generation, seeded or not
//! - [`GameConfig`] - Rules fixed for the lifetime of a session
//! - [`SessionSnapshot`] - Saved game for later resumption
//!
//! # Game Flow
//!
//! 1. [`GameSession::start`] clears the board and deals three pieces
//! 2. The player places a piece from the tray onto the board
//! 3. Full rows and columns are cleared and scored
//! 4. Once the tray is empty a new batch of three is dealt
//! 5. Repeat until no piece in the tray fits anywhere
//!
//! # Example
//!
//! ```
//! use block_bloom_engine::{GameMode, GameSession};
//!
//! let mut session = GameSession::default();
//! session.start_with_seed(GameMode::Classic, 42);
//!
//! // place the first piece that fits, at its first legal position
//! let (slot, x, y) = session
//!     .tray()
//!     .pieces()
//!     .find_map(|(slot, piece)| {
//!         let (x, y) = session.board().placements(piece.shape()).next()?;
//!         Some((slot, x, y))
//!     })
//!     .unwrap();
//! let outcome = session.place_piece(slot, x, y).unwrap();
//! assert_eq!(session.score(), outcome.points());
//!
//! session.undo().unwrap();
//! assert_eq!(session.score(), 0);
//! ```

pub use self::{config::*, history::*, random::*, scoring::*, session::*, snapshot::*, tray::*};

pub(crate) mod config;
pub(crate) mod history;
pub(crate) mod random;
pub(crate) mod scoring;
pub(crate) mod session;
pub(crate) mod snapshot;
pub(crate) mod tray;
