use std::{
    io::{self, BufRead as _, Write as _},
    path::PathBuf,
    str::FromStr,
    time::Instant,
};

use anyhow::{Context as _, bail};
use block_bloom_engine::GameSession;

use super::SessionArg;
use crate::{render, util};

const HELP: &str = "\
commands:
  place <slot> <x> <y>   place a tray piece with its top-left corner at (x, y)
  undo                   take back the last move
  swap                   replace the whole tray
  bomb                   arm a bomb
  detonate <x> <y>       use the armed bomb centered on (x, y)
  cancel                 disarm the bomb
  hint                   show where each piece fits
  show                   redraw the board
  save <file>            write the game to a JSON file
  load <file>            resume a game from a JSON file
  new                    start over
  quit                   leave";

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    #[clap(flatten)]
    session: SessionArg,
    /// Resume a saved game instead of starting a new one
    #[clap(long)]
    load: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlayCommand {
    Place { slot: usize, x: i32, y: i32 },
    Undo,
    Swap,
    Bomb,
    Detonate { x: i32, y: i32 },
    Cancel,
    Hint,
    Show,
    Save(PathBuf),
    Load(PathBuf),
    New,
    Help,
    Quit,
}

fn parse_arg<T>(args: &[&str], index: usize, name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(arg) = args.get(index) else {
        bail!("missing {name}");
    };
    arg.parse()
        .with_context(|| format!("invalid {name}: {arg:?}"))
}

impl FromStr for PlayCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            bail!("empty command");
        };
        let command = match name {
            "place" | "p" => PlayCommand::Place {
                slot: parse_arg(args, 0, "slot")?,
                x: parse_arg(args, 1, "x")?,
                y: parse_arg(args, 2, "y")?,
            },
            "undo" | "u" => PlayCommand::Undo,
            "swap" | "s" => PlayCommand::Swap,
            "bomb" | "b" => PlayCommand::Bomb,
            "detonate" | "d" => PlayCommand::Detonate {
                x: parse_arg(args, 0, "x")?,
                y: parse_arg(args, 1, "y")?,
            },
            "cancel" | "c" => PlayCommand::Cancel,
            "hint" | "h" => PlayCommand::Hint,
            "show" => PlayCommand::Show,
            "save" => PlayCommand::Save(parse_arg(args, 0, "file")?),
            "load" => PlayCommand::Load(parse_arg(args, 0, "file")?),
            "new" => PlayCommand::New,
            "help" | "?" => PlayCommand::Help,
            "quit" | "q" | "exit" => PlayCommand::Quit,
            _ => bail!("unknown command {name:?}, try `help`"),
        };
        Ok(command)
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg { session: session_arg, load } = arg;

    let mut session = session_arg.new_session()?;
    match load {
        Some(path) => {
            let snapshot = util::read_snapshot_file(path)?;
            session
                .restore(&snapshot)
                .with_context(|| format!("Failed to restore saved game: {}", path.display()))?;
        }
        None => session_arg.start(&mut session),
    }

    println!("{}", render::session(&session));
    println!("type `help` for commands");

    let stdin = io::stdin();
    let mut last_tick = Instant::now();
    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read command")?
            == 0
        {
            break;
        }

        let now = Instant::now();
        session.tick(now - last_tick);
        last_tick = now;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let command = match line.parse::<PlayCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e:#}");
                continue;
            }
        };
        if command == PlayCommand::Quit {
            break;
        }

        let was_over = session.is_game_over();
        if let Err(e) = execute(&mut session, session_arg, command) {
            println!("error: {e:#}");
            continue;
        }
        if session.is_game_over() && !was_over {
            println!(
                "game over! score {}, {} lines, {} pieces, max combo {}",
                session.score(),
                session.lines_cleared(),
                session.pieces_placed(),
                session.max_combo()
            );
            println!("type `new` to play again");
        }
    }
    Ok(())
}

fn execute(
    session: &mut GameSession,
    session_arg: &SessionArg,
    command: PlayCommand,
) -> anyhow::Result<()> {
    match command {
        PlayCommand::Place { slot, x, y } => {
            let outcome = session.place_piece(slot, x, y)?;
            if !outcome.cleared.is_empty() {
                println!(
                    "cleared {} line(s) for {} points, combo {}",
                    outcome.cleared.count(),
                    outcome.line_points,
                    outcome.combo
                );
            }
            println!("{}", render::session(session));
        }
        PlayCommand::Undo => {
            session.undo()?;
            println!("{}", render::session(session));
        }
        PlayCommand::Swap => {
            session.swap_pieces()?;
            println!("{}", render::session(session));
        }
        PlayCommand::Bomb => {
            session.activate_bomb()?;
            println!("bomb armed, `detonate <x> <y>` to use it");
        }
        PlayCommand::Detonate { x, y } => {
            session.use_bomb(x, y)?;
            println!("{}", render::session(session));
        }
        PlayCommand::Cancel => {
            if session.cancel_bomb() {
                println!("bomb disarmed");
            }
        }
        PlayCommand::Hint => {
            for (slot, piece) in session.tray().pieces() {
                let mut placements = session.board().placements(piece.shape());
                match placements.next() {
                    Some((x, y)) => println!(
                        "[{slot}] {} fits at ({x}, {y}) and {} other spot(s)",
                        piece.shape_id(),
                        placements.count()
                    ),
                    None => println!("[{slot}] {} does not fit anywhere", piece.shape_id()),
                }
            }
        }
        PlayCommand::Show => println!("{}", render::session(session)),
        PlayCommand::Save(path) => {
            util::Output::save_json(&session.snapshot(), Some(path.clone()))?;
            println!("saved to {}", path.display());
        }
        PlayCommand::Load(path) => {
            let snapshot = util::read_snapshot_file(&path)?;
            session
                .restore(&snapshot)
                .with_context(|| format!("Failed to restore saved game: {}", path.display()))?;
            println!("{}", render::session(session));
        }
        PlayCommand::New => {
            session_arg.start(session);
            println!("{}", render::session(session));
        }
        PlayCommand::Help => println!("{HELP}"),
        PlayCommand::Quit => {}
    }
    Ok(())
}
