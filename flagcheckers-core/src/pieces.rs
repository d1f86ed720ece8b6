//! Piece and flag definitions

use serde::{Deserialize, Serialize};

use crate::board::{Square, Team};

/// Stable piece identifier (index into the board's piece list)
pub type PieceId = u8;

/// Turns a captured piece waits on the bench: the first own-team turn start
/// after capture brings it to 1, the second brings it back.
pub const RESPAWN_TURNS: u8 = 2;

/// Countdown used when a respawn finds its origin occupied
pub const RESPAWN_RETRY_TURNS: u8 = 1;

/// Piece rank in the standard setup. Both kinds move identically; the kind
/// only decides the starting rank and the label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Major,
    Pawn,
}

impl PieceKind {
    pub fn letter(self) -> char {
        match self {
            PieceKind::Major => 'M',
            PieceKind::Pawn => 'P',
        }
    }
}

/// A piece, on the board or benched
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub team: Team,
    pub kind: PieceKind,
    /// Current square; `None` while benched
    pub pos: Option<Square>,
    /// Home square, fixed for the whole game
    pub origin: Square,
    pub is_flagbearer: bool,
    pub is_knight: bool,
    /// Set only while benched
    pub respawn_countdown: Option<u8>,
}

impl Piece {
    pub fn new(id: PieceId, team: Team, kind: PieceKind, origin: Square) -> Self {
        Self {
            id,
            team,
            kind,
            pos: Some(origin),
            origin,
            is_flagbearer: false,
            is_knight: false,
            respawn_countdown: None,
        }
    }

    pub fn is_on_board(&self) -> bool {
        self.pos.is_some()
    }

    /// Flagbearers and Knights step one square in any direction
    pub fn is_omnidirectional(&self) -> bool {
        self.is_flagbearer || self.is_knight
    }

    /// Display label such as `B-M3`
    pub fn label(&self) -> String {
        format!("{}-{}{}", self.team.initial(), self.kind.letter(), self.origin.col)
    }

    /// Bench state after capture. The caller clears the board index.
    pub(crate) fn bench(&mut self) {
        self.pos = None;
        self.is_flagbearer = false;
        self.respawn_countdown = Some(RESPAWN_TURNS);
    }
}

// ============================================================================
// FLAGS
// ============================================================================

/// A team's flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub home: Square,
    pub is_captured: bool,
    /// Enemy piece carrying this flag; set iff `is_captured`
    pub carried_by: Option<PieceId>,
}

impl Flag {
    pub fn new(home: Square) -> Self {
        Self {
            home,
            is_captured: false,
            carried_by: None,
        }
    }

    pub(crate) fn pick_up(&mut self, carrier: PieceId) {
        self.is_captured = true;
        self.carried_by = Some(carrier);
    }

    pub(crate) fn release(&mut self) {
        self.is_captured = false;
        self.carried_by = None;
    }
}

/// Both flags, indexed by owning team
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub blue: Flag,
    pub red: Flag,
}

impl Flags {
    pub fn new(blue_home: Square, red_home: Square) -> Self {
        Self {
            blue: Flag::new(blue_home),
            red: Flag::new(red_home),
        }
    }

    /// Flag owned by `team`
    pub fn get(&self, team: Team) -> &Flag {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
        }
    }

    pub(crate) fn get_mut(&mut self, team: Team) -> &mut Flag {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }
}
