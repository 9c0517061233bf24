use std::path::PathBuf;

use anyhow::Context as _;

use block_bloom_engine::GameSession;

use crate::{render, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Saved game file (JSON format)
    saved_game: PathBuf,
    /// Game configuration the saved game was played with (JSON format)
    #[clap(long)]
    config: Option<PathBuf>,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg { saved_game, config } = arg;

    let snapshot = util::read_snapshot_file(saved_game)?;
    let mut session = GameSession::new(util::load_config(config.as_deref())?)?;
    session
        .restore(&snapshot)
        .with_context(|| format!("Invalid saved game: {}", saved_game.display()))?;

    println!("mode: {}  state: {:?}", session.mode(), session.state());
    if let Some(state) = session.seed_state() {
        println!("seed: {} ({} draws)", state.seed, state.draws);
    }
    println!(
        "lines cleared: {}  pieces placed: {}  max combo: {}",
        session.lines_cleared(),
        session.pieces_placed(),
        session.max_combo()
    );
    println!();
    println!("{}", render::session(&session));
    Ok(())
}
