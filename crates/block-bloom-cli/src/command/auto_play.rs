use std::{cmp::Reverse, path::PathBuf};

use block_bloom_engine::{GameSession, PlacementOutcome};
use rand::{Rng, SeedableRng as _, rngs::StdRng, seq::IndexedRandom as _};
use serde::Serialize;

use super::SessionArg;
use crate::{render, util::Output};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum Strategy {
    /// Take the move that scores the most right now
    #[default]
    Greedy,
    /// Pick uniformly among legal moves
    Random,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    #[clap(flatten)]
    session: SessionArg,
    /// Number of games to play
    #[clap(long, default_value_t = 1)]
    games: usize,
    /// How moves are chosen
    #[clap(long, value_enum, default_value_t)]
    strategy: Strategy,
    /// Stop a game after this many placements
    #[clap(long, default_value_t = 10_000)]
    max_moves: usize,
    /// Print the board after every move
    #[clap(long)]
    verbose: bool,
    /// Write per-game results to this file (JSON format)
    #[clap(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Move {
    slot: usize,
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, Serialize)]
struct GameSummary {
    game: usize,
    seed: Option<u64>,
    score: usize,
    lines_cleared: usize,
    pieces_placed: usize,
    max_combo: usize,
    finished: bool,
}

#[derive(Debug, Clone, Serialize)]
struct RunSummary {
    strategy: &'static str,
    games: Vec<GameSummary>,
    best_score: usize,
    mean_score: f64,
}

fn legal_moves(session: &GameSession) -> Vec<Move> {
    session
        .tray()
        .pieces()
        .flat_map(|(slot, piece)| {
            session
                .board()
                .placements(piece.shape())
                .map(move |(x, y)| Move { slot, x, y })
        })
        .collect()
}

/// Points the move would earn, with fewer filled cells afterwards as the
/// tie-breaker.
fn evaluate(session: &GameSession, mv: Move) -> Option<(usize, Reverse<usize>)> {
    let mut trial = session.clone();
    let outcome: PlacementOutcome = trial.place_piece(mv.slot, mv.x, mv.y).ok()?;
    let survives = !outcome.game_over;
    let points = if survives { outcome.points() + 1 } else { 0 };
    Some((points, Reverse(trial.board().filled_count())))
}

fn choose_move<R>(session: &GameSession, strategy: Strategy, rng: &mut R) -> Option<Move>
where
    R: Rng + ?Sized,
{
    let moves = legal_moves(session);
    match strategy {
        Strategy::Random => moves.choose(rng).copied(),
        Strategy::Greedy => moves
            .iter()
            .filter_map(|&mv| Some((evaluate(session, mv)?, mv)))
            .max_by_key(|(key, _)| *key)
            .map(|(_, mv)| mv),
    }
}

/// Plays until game over or `max_moves` placements. Returns whether the game
/// ended.
fn play_game<R>(
    session: &mut GameSession,
    strategy: Strategy,
    max_moves: usize,
    verbose: bool,
    rng: &mut R,
) -> bool
where
    R: Rng + ?Sized,
{
    for _ in 0..max_moves {
        if session.is_game_over() {
            return true;
        }
        let Some(mv) = choose_move(session, strategy, rng) else {
            return true;
        };
        if let Err(e) = session.place_piece(mv.slot, mv.x, mv.y) {
            tracing::warn!(?mv, error = %e, "chosen move was rejected");
            return false;
        }
        if verbose {
            println!("{}\n", render::session(session));
        }
    }
    session.is_game_over()
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let AutoPlayArg {
        session: session_arg,
        games,
        strategy,
        max_moves,
        verbose,
        output,
    } = arg;

    let mut session = session_arg.new_session()?;
    let mut rng = match session_arg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut summaries = Vec::with_capacity(*games);
    for (game, offset) in (0..*games).zip(0u64..) {
        let mut game_arg = session_arg.clone();
        game_arg.seed = session_arg.seed.map(|seed| seed.wrapping_add(offset));
        game_arg.start(&mut session);

        let finished = play_game(&mut session, *strategy, *max_moves, *verbose, &mut rng);
        let summary = GameSummary {
            game,
            seed: session.seed_state().map(|state| state.seed),
            score: session.score(),
            lines_cleared: session.lines_cleared(),
            pieces_placed: session.pieces_placed(),
            max_combo: session.max_combo(),
            finished,
        };
        eprintln!(
            "game {game}: score {}, {} lines, {} pieces, max combo {}",
            summary.score, summary.lines_cleared, summary.pieces_placed, summary.max_combo
        );
        summaries.push(summary);
    }

    #[expect(clippy::cast_precision_loss)]
    let mean_score = if summaries.is_empty() {
        0.0
    } else {
        summaries.iter().map(|s| s.score as f64).sum::<f64>() / summaries.len() as f64
    };
    let result = RunSummary {
        strategy: match strategy {
            Strategy::Greedy => "greedy",
            Strategy::Random => "random",
        },
        best_score: session.best_score(),
        mean_score,
        games: summaries,
    };
    eprintln!(
        "best score {}, mean score {:.1}",
        result.best_score, result.mean_score
    );

    if let Some(path) = output {
        Output::save_json(&result, Some(path.clone()))?;
        eprintln!("Saved results to {}", path.display());
    }
    Ok(())
}
