use block_bloom_engine::{Board, Cell, GameSession, MAX_SHAPE_SIDE, PieceTray};

const TRAY_COLUMN_WIDTH: usize = MAX_SHAPE_SIDE + 6;

fn cell_char(cell: Cell) -> char {
    match cell.color() {
        Some(color) => char::from(b'A' + color.index() % 26),
        None => '.',
    }
}

/// Board with column and row indices; filled cells show their color letter.
pub fn board(board: &Board) -> String {
    let header: String = (0..board.size()).map(|x| format!("{:>2}", x % 100)).collect();
    let rows = board.rows().enumerate().map(|(y, row)| {
        let cells: String = row.iter().map(|&c| format!(" {}", cell_char(c))).collect();
        format!("{y:>2} {cells}")
    });
    std::iter::once(format!("   {header}"))
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The three tray slots side by side.
pub fn tray(tray: &PieceTray, board: &Board) -> String {
    let columns: Vec<Vec<String>> = tray
        .slots()
        .enumerate()
        .map(|(slot, piece)| {
            let Some(piece) = piece else {
                return vec![format!("[{slot}] -")];
            };
            let fits = board.has_any_placement(piece.shape());
            let mut lines = vec![format!(
                "[{slot}] {}{}",
                piece.cell_count(),
                if fits { "" } else { " x" }
            )];
            lines.extend(piece.shape().rows());
            lines
        })
        .collect();

    let height = columns.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = String::new();
    for i in 0..height {
        if i > 0 {
            out.push('\n');
        }
        let line: String = columns
            .iter()
            .map(|column| {
                let text = column.get(i).map_or("", String::as_str);
                format!("{text:<TRAY_COLUMN_WIDTH$}")
            })
            .collect();
        out.push_str(line.trim_end());
    }
    out
}

/// One-line summary of score and power-ups.
pub fn status(session: &GameSession) -> String {
    let mut out = format!(
        "score {} (best {})  combo {} {}  flow {}%  undo {}  swap {}  bomb {}",
        session.score(),
        session.best_score(),
        session.combo(),
        session.multiplier(),
        session.flow_meter(),
        session.undos_remaining(),
        session.swaps_remaining(),
        session.bombs_remaining(),
    );
    if session.is_bomb_armed() {
        out.push_str("  [bomb armed]");
    }
    out
}

/// Board, tray and status together.
pub fn session(session: &GameSession) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        board(session.board()),
        tray(session.tray(), session.board()),
        status(session)
    )
}
