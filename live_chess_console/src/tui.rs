use console::Style;
use instant::Instant;
use itertools::Itertools;
use live_chess::clock::ClockShowing;
use live_chess::coord::{Col, Coord, Row};
use live_chess::force::Force;
use live_chess::move_record::MoveRecord;
use live_chess::piece::piece_to_pictogram;
use live_chess::rules::Position;
use live_chess::session::GameSession;


fn render_clock(showing: &ClockShowing) -> String {
    let clock_str = showing.ui_string();
    if showing.out_of_time {
        Style::new().on_red().apply_to(clock_str).to_string()
    } else if showing.is_active {
        Style::new().reverse().apply_to(clock_str).to_string()
    } else {
        clock_str
    }
}

pub fn render_position(position: &Position) -> String {
    let mut lines = vec![];
    for row in Row::all().rev() {
        let squares = Col::all()
            .map(|col| match position.piece_at(Coord::new(row, col)) {
                Some(piece) => piece_to_pictogram(piece.kind, piece.force),
                None => '·',
            })
            .join(" ");
        lines.push(format!("{} {squares}", row.to_algebraic()));
    }
    lines.push(format!("  {}", Col::all().map(|col| col.to_algebraic()).join(" ")));
    lines.join("\n")
}

// Moves in the usual "1. e2e4 e7e5" form. Unconfirmed local moves are marked with '?'.
pub fn render_history(history: &[MoveRecord]) -> String {
    history
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let moves = pair
                .iter()
                .map(|r| format!("{}{}", r.mv, if r.is_confirmed() { "" } else { "?" }))
                .join(" ");
            format!("{}. {moves}", i + 1)
        })
        .join(" ")
}

pub fn render_session(session: &GameSession, now: Instant) -> String {
    let header = |force: Force| {
        format!(
            "{}  {}",
            render_clock(&session.showing_for(force, now)),
            session.player(force).name
        )
    };
    let started = match session.start_time() {
        Some(t) => format!("Game {}, started {t}", session.id()),
        None => format!("Game {}", session.id()),
    };
    let mut out = format!(
        "{started}\n{}\n{}\n{}\n{}",
        header(Force::Black),
        render_position(&session.position()),
        header(Force::White),
        render_history(session.history()),
    );
    let pending = session.pending_indices().collect_vec();
    if !pending.is_empty() {
        out.push_str(&format!("\nWaiting for earlier moves; stashed: {pending:?}"));
    }
    if !session.is_in_progress() {
        out.push_str("\nGame over");
    }
    out
}
