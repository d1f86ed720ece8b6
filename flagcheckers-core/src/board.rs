//! Board geometry and occupancy

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::pieces::{Piece, PieceId};

/// Board size (rows and columns)
pub const BOARD_SIZE: i8 = 8;

/// All 8 one-square offsets (dr, dc), in row-major order
pub const NEIGHBOR_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Check if (row, col) lies on the board
pub fn in_bounds(row: i8, col: i8) -> bool {
    (0..BOARD_SIZE).contains(&row) && (0..BOARD_SIZE).contains(&col)
}

// ============================================================================
// SQUARE
// ============================================================================

/// Board coordinate, row 0 is Blue's back rank
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

impl Square {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// Check if this square is on the board
    pub fn is_valid(&self) -> bool {
        in_bounds(self.row, self.col)
    }

    /// Square shifted by (dr, dc), if still on the board
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Square> {
        let sq = Square::new(self.row + dr, self.col + dc);
        sq.is_valid().then_some(sq)
    }

    /// 8-neighbourhood adjacency (a square is not adjacent to itself)
    pub fn is_adjacent(&self, other: Square) -> bool {
        *self != other && (self.row - other.row).abs() <= 1 && (self.col - other.col).abs() <= 1
    }

    /// Euclidean distance
    pub fn distance_to(&self, other: Square) -> f64 {
        let dr = f64::from(self.row - other.row);
        let dc = f64::from(self.col - other.col);
        dr.hypot(dc)
    }

    /// Minimum row distance to any of the given rows
    pub fn row_distance_to(&self, rows: &[i8]) -> i8 {
        rows.iter()
            .map(|r| (r - self.row).abs())
            .min()
            .unwrap_or(0)
    }

    /// Parse "r,c" or algebraic "d2" (file a-h = column, rank 1-8 = row 0-7)
    pub fn parse(text: &str) -> Option<Square> {
        let text = text.trim();
        let sq = if let Some((r, c)) = text.split_once(',') {
            Square::new(r.trim().parse().ok()?, c.trim().parse().ok()?)
        } else {
            let mut chars = text.chars();
            let file = chars.next()?.to_ascii_lowercase();
            let rank: u8 = chars.as_str().parse().ok()?;
            if !file.is_ascii_lowercase() || !(1..=BOARD_SIZE as u8).contains(&rank) {
                return None;
            }
            Square::new((rank - 1) as i8, (file as u8 - b'a') as i8)
        };
        sq.is_valid().then_some(sq)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

// ============================================================================
// TEAM
// ============================================================================

/// Team colour. Blue starts on rows 0-1 and moves toward row 7.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Blue = 0,
    Red = 1,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    pub fn opponent(self) -> Self {
        match self {
            Team::Blue => Team::Red,
            Team::Red => Team::Blue,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Row step of a forward move
    pub fn forward_direction(self) -> i8 {
        match self {
            Team::Blue => 1,
            Team::Red => -1,
        }
    }

    /// The two back-rank rows on this team's starting side
    pub fn own_side_rows(self) -> [i8; 2] {
        match self {
            Team::Blue => [0, 1],
            Team::Red => [BOARD_SIZE - 2, BOARD_SIZE - 1],
        }
    }

    /// The rank farthest from this team's start
    pub fn opponent_back_rank(self) -> i8 {
        match self {
            Team::Blue => BOARD_SIZE - 1,
            Team::Red => 0,
        }
    }

    pub fn initial(self) -> char {
        match self {
            Team::Blue => 'B',
            Team::Red => 'R',
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Blue => write!(f, "Blue"),
            Team::Red => write!(f, "Red"),
        }
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// All pieces of the game plus a square -> piece index.
///
/// Pieces are never removed; a captured piece stays in `pieces` with no
/// position. Piece ids are indices into `pieces`.
#[derive(Clone, Debug, Default)]
pub struct Board {
    pieces: Vec<Piece>,
    occupancy: FxHashMap<Square, PieceId>,
}

impl Board {
    /// Build from pieces whose ids equal their index. Callers validate
    /// overlaps first (see `Setup::build`).
    pub(crate) fn from_pieces(pieces: Vec<Piece>) -> Self {
        let occupancy = pieces
            .iter()
            .filter_map(|p| p.pos.map(|sq| (sq, p.id)))
            .collect();
        Self { pieces, occupancy }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id as usize)
    }

    pub(crate) fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id as usize)
    }

    /// Piece standing on `sq`
    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.occupancy.get(&sq).and_then(|&id| self.piece(id))
    }

    pub fn is_occupied(&self, sq: Square) -> bool {
        self.occupancy.contains_key(&sq)
    }

    /// On-board pieces of a team, in id order
    pub fn team_pieces(&self, team: Team) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces
            .iter()
            .filter(move |p| p.team == team && p.pos.is_some())
    }

    /// Benched pieces of a team, in id order
    pub fn benched(&self, team: Team) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces
            .iter()
            .filter(move |p| p.team == team && p.pos.is_none())
    }

    /// Take a piece off the board
    pub(crate) fn lift(&mut self, id: PieceId) -> Option<Square> {
        let piece = self.pieces.get_mut(id as usize)?;
        let sq = piece.pos.take()?;
        self.occupancy.remove(&sq);
        Some(sq)
    }

    /// Put a piece on an empty square (moving it if already on the board)
    pub(crate) fn place(&mut self, id: PieceId, sq: Square) {
        if let Some(old) = self.pieces[id as usize].pos {
            self.occupancy.remove(&old);
        }
        self.pieces[id as usize].pos = Some(sq);
        self.occupancy.insert(sq, id);
    }

    /// Number of occupied squares according to the index
    pub fn occupied_count(&self) -> usize {
        self.occupancy.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
