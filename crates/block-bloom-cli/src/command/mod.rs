use std::path::PathBuf;

use block_bloom_engine::{GameMode, GameSession};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use self::{
    auto_play::AutoPlayArg, catalog::CatalogArg, daily_seed::DailySeedArg, inspect::InspectArg,
    play::PlayArg,
};
use crate::util;

mod auto_play;
mod catalog;
mod daily_seed;
mod inspect;
mod play;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play in the terminal, one command per line
    Play(#[clap(flatten)] PlayArg),
    /// Simulate games with a built-in placement strategy
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Print the daily-mode seed for a date
    DailySeed(#[clap(flatten)] DailySeedArg),
    /// Print a saved game
    Inspect(#[clap(flatten)] InspectArg),
    /// Print the piece catalog
    Catalog(#[clap(flatten)] CatalogArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Play(PlayArg::default())) {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
        Mode::DailySeed(arg) => daily_seed::run(&arg),
        Mode::Inspect(arg) => inspect::run(&arg)?,
        Mode::Catalog(arg) => catalog::run(&arg)?,
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum ModeArg {
    #[default]
    Classic,
    Daily,
    Zen,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Classic => GameMode::Classic,
            ModeArg::Daily => GameMode::Daily,
            ModeArg::Zen => GameMode::Zen,
        }
    }
}

/// Options shared by every command that starts a game.
#[derive(Default, Debug, Clone, clap::Args)]
struct SessionArg {
    /// Game configuration file (JSON format)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Game mode
    #[clap(long, value_enum, default_value_t)]
    mode: ModeArg,
    /// Seed for piece generation, overriding the mode's default randomness
    #[clap(long)]
    seed: Option<u64>,
    /// Date used by daily mode instead of today (YYYY-MM-DD)
    #[clap(long)]
    date: Option<NaiveDate>,
}

impl SessionArg {
    fn new_session(&self) -> anyhow::Result<GameSession> {
        let config = util::load_config(self.config.as_deref())?;
        let session = GameSession::new(config)?;
        Ok(session)
    }

    /// Starts (or restarts) `session` according to these options.
    fn start(&self, session: &mut GameSession) {
        let mode = GameMode::from(self.mode);
        match (self.seed, self.date) {
            (Some(seed), _) => session.start_with_seed(mode, seed),
            (None, Some(date)) => session.start_on(mode, date),
            (None, None) => session.start(mode),
        }
    }
}
