//! Read-only views of the game for presentation layers

use serde::{Deserialize, Serialize};

use crate::board::{Board, Square, Team};
use crate::knights::KnightSelection;
use crate::pieces::{Flag, Piece, PieceId, PieceKind};

/// What a board square shows
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSummary {
    pub id: PieceId,
    pub label: String,
    pub team: Team,
    pub kind: PieceKind,
    pub is_flagbearer: bool,
    pub is_knight: bool,
}

impl From<&Piece> for PieceSummary {
    fn from(piece: &Piece) -> Self {
        Self {
            id: piece.id,
            label: piece.label(),
            team: piece.team,
            kind: piece.kind,
            is_flagbearer: piece.is_flagbearer,
            is_knight: piece.is_knight,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupiedSquare {
    pub square: Square,
    pub piece: PieceSummary,
}

/// Occupied squares, sorted by (row, col)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub squares: Vec<OccupiedSquare>,
}

impl BoardSnapshot {
    pub fn of(board: &Board) -> Self {
        let mut squares: Vec<OccupiedSquare> = board
            .pieces()
            .iter()
            .filter_map(|p| {
                p.pos.map(|square| OccupiedSquare {
                    square,
                    piece: PieceSummary::from(p),
                })
            })
            .collect();
        squares.sort_by_key(|s| s.square);
        Self { squares }
    }

    pub fn at(&self, square: Square) -> Option<&PieceSummary> {
        self.squares
            .binary_search_by_key(&square, |s| s.square)
            .ok()
            .map(|i| &self.squares[i].piece)
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSnapshot {
    pub team: Team,
    pub home: Square,
    pub is_captured: bool,
    pub carried_by: Option<PieceId>,
}

impl FlagSnapshot {
    pub fn of(team: Team, flag: &Flag) -> Self {
        Self {
            team,
            home: flag.home,
            is_captured: flag.is_captured,
            carried_by: flag.carried_by,
        }
    }
}

/// A benched piece and the own-team turns left before it tries to return
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchEntry {
    pub id: PieceId,
    pub label: String,
    pub team: Team,
    pub respawn_countdown: u8,
}

impl BenchEntry {
    pub fn of(piece: &Piece) -> Option<Self> {
        if piece.pos.is_some() {
            return None;
        }
        piece.respawn_countdown.map(|n| Self {
            id: piece.id,
            label: piece.label(),
            team: piece.team,
            respawn_countdown: n,
        })
    }
}

/// Everything a presentation layer needs to draw the game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn_number: u32,
    pub current_team: Team,
    pub winner: Option<Team>,
    pub knight_selection: KnightSelection,
    pub used_pass_this_turn: bool,
    pub moved_this_turn: Vec<PieceId>,
    pub board: BoardSnapshot,
    pub flags: Vec<FlagSnapshot>,
    pub bench: Vec<BenchEntry>,
}

impl Snapshot {
    pub fn flag(&self, team: Team) -> Option<&FlagSnapshot> {
        self.flags.iter().find(|f| f.team == team)
    }

    pub fn bench_of(&self, team: Team) -> impl Iterator<Item = &BenchEntry> + '_ {
        self.bench.iter().filter(move |b| b.team == team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::Setup;

    #[test]
    fn test_board_snapshot_sorted_lookup() {
        let (board, _) = Setup::standard().build().unwrap();
        let snap = BoardSnapshot::of(&board);
        assert_eq!(snap.len(), 32);
        assert!(snap.squares.windows(2).all(|w| w[0].square < w[1].square));
        assert_eq!(snap.at(Square::new(7, 3)).unwrap().label, "R-M3");
        assert!(snap.at(Square::new(4, 4)).is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let (board, _) = Setup::standard().build().unwrap();
        let json = serde_json::to_string(&BoardSnapshot::of(&board)).unwrap();
        assert!(json.contains("\"label\":\"B-P0\""));
    }
}
