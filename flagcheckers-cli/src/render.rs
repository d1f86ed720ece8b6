//! Text rendering of snapshots and events for the terminal

use flagcheckers_core::board::{Square, Team, BOARD_SIZE};
use flagcheckers_core::snapshot::{PieceSummary, Snapshot};
use flagcheckers_core::{GameEvent, KnightSelection};

/// Three-character cell: team initial, kind letter (`K` for knights), then
/// `*` on a flagbearer
fn piece_cell(piece: &PieceSummary) -> String {
    let kind = if piece.is_knight { 'K' } else { piece.kind.letter() };
    let carry = if piece.is_flagbearer { '*' } else { ' ' };
    format!("{}{}{}", piece.team.initial(), kind, carry)
}

fn empty_cell(snapshot: &Snapshot, square: Square) -> String {
    let home = snapshot
        .flags
        .iter()
        .find(|f| f.home == square && !f.is_captured);
    match home {
        Some(flag) => format!("{}F ", flag.team.initial().to_ascii_lowercase()),
        None => " . ".to_string(),
    }
}

/// Board with row 7 on top, files a-h along the bottom
pub fn board(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for row in (0..BOARD_SIZE).rev() {
        out.push_str(&format!("{} |", row + 1));
        for col in 0..BOARD_SIZE {
            let square = Square::new(row, col);
            let cell = match snapshot.board.at(square) {
                Some(piece) => piece_cell(piece),
                None => empty_cell(snapshot, square),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out.push_str("   ");
    for col in 0..BOARD_SIZE {
        out.push_str(&format!(" {} ", (b'a' + col as u8) as char));
    }
    out.push('\n');
    out
}

/// One-line status under the board
pub fn status(snapshot: &Snapshot) -> String {
    if let Some(team) = snapshot.winner {
        return format!("Game over: {} wins", team);
    }
    let mut line = format!(
        "Turn {}: {} to move ({} acted{})",
        snapshot.turn_number,
        snapshot.current_team,
        snapshot.moved_this_turn.len(),
        if snapshot.used_pass_this_turn { ", pass used" } else { "" }
    );
    if let KnightSelection::Awaiting { team, remaining } = snapshot.knight_selection {
        line.push_str(&format!(" | {} must pick {} knight(s)", team, remaining));
    }
    for team in Team::ALL {
        let benched: Vec<String> = snapshot
            .bench_of(team)
            .map(|b| format!("{}({})", b.label, b.respawn_countdown))
            .collect();
        if !benched.is_empty() {
            line.push_str(&format!(" | {} bench: {}", team, benched.join(" ")));
        }
    }
    line
}

/// Human-readable event line
pub fn event(event: &GameEvent) -> String {
    match event {
        GameEvent::Moved { piece, from, to } => format!("#{} moved {} -> {}", piece, from, to),
        GameEvent::Captured { piece, by, at } => format!("#{} captured #{} at {}", by, piece, at),
        GameEvent::FlagReturned { flag } => format!("{} flag freed", flag),
        GameEvent::FlagPickedUp { flag, by } => format!("#{} picked up the {} flag", by, flag),
        GameEvent::FlagPassed { flag, from, to } => {
            format!("{} flag passed #{} -> #{}", flag, from, to)
        }
        GameEvent::KnightSelectionRequired { team, remaining } => {
            format!("{} must choose {} knight(s)", team, remaining)
        }
        GameEvent::KnightPromoted { piece, team } => format!("{} crowned #{} knight", team, piece),
        GameEvent::KnightSelectionResolved { team } => format!("{} knight selection done", team),
        GameEvent::Respawned { piece, at } => format!("#{} respawned at {}", piece, at),
        GameEvent::RespawnBlocked { piece } => format!("#{} respawn blocked, retrying", piece),
        GameEvent::TurnEnded { team, turn_number } => {
            format!("{} ended turn {}", team, turn_number)
        }
        GameEvent::TurnStarted { team, turn_number } => {
            format!("Turn {}: {} to move", turn_number, team)
        }
        GameEvent::WinnerDecided { team } => format!("{} wins!", team),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagcheckers_core::{Game, GameConfig};

    #[test]
    fn test_board_shows_standard_layout() {
        let game = Game::standard(GameConfig::hot_seat());
        let text = board(&game.snapshot());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("8 |RM RM RM"));
        assert!(lines[1].starts_with("7 |RP "));
        assert!(lines[7].starts_with("1 |BM "));
        assert!(lines[8].contains(" h "));
    }

    #[test]
    fn test_freed_flag_wording() {
        let line = event(&GameEvent::FlagReturned { flag: Team::Red });
        assert_eq!(line, "Red flag freed");
    }

    #[test]
    fn test_status_mentions_turn() {
        let game = Game::standard(GameConfig::hot_seat());
        assert_eq!(status(&game.snapshot()), "Turn 1: Blue to move (0 acted)");
    }
}
