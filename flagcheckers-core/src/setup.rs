//! Setup - starting position definition

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Square, Team, BOARD_SIZE};
use crate::error::RuleError;
use crate::pieces::{Flags, Piece, PieceId, PieceKind};

/// Column of both flag homes in the standard setup
pub const FLAG_COL: i8 = 3;

/// One piece of a setup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSetup {
    pub team: Team,
    pub kind: PieceKind,
    pub origin: Square,
    /// Starting square if not the origin. Ignored when `benched` is set.
    #[serde(default)]
    pub pos: Option<Square>,
    /// Start on the bench with a full respawn countdown
    #[serde(default)]
    pub benched: bool,
    #[serde(default)]
    pub knight: bool,
    /// Start carrying the enemy flag
    #[serde(default)]
    pub flagbearer: bool,
}

impl PieceSetup {
    pub fn new(team: Team, kind: PieceKind, origin: Square) -> Self {
        Self {
            team,
            kind,
            origin,
            pos: None,
            benched: false,
            knight: false,
            flagbearer: false,
        }
    }

    pub fn at(mut self, pos: Square) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn benched(mut self) -> Self {
        self.benched = true;
        self
    }

    pub fn knight(mut self) -> Self {
        self.knight = true;
        self
    }

    pub fn flagbearer(mut self) -> Self {
        self.flagbearer = true;
        self
    }
}

/// Starting position: pieces in id order plus both flag homes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    pub name: String,
    pub blue_flag: Square,
    pub red_flag: Square,
    pub pieces: Vec<PieceSetup>,
}

impl Setup {
    /// Standard opening: majors on the back ranks, pawns in front.
    /// Ids run Blue majors, Blue pawns, Red majors, Red pawns.
    pub fn standard() -> Self {
        let last = BOARD_SIZE - 1;
        let ranks = [
            (Team::Blue, PieceKind::Major, 0),
            (Team::Blue, PieceKind::Pawn, 1),
            (Team::Red, PieceKind::Major, last),
            (Team::Red, PieceKind::Pawn, last - 1),
        ];

        let pieces = ranks
            .iter()
            .flat_map(|&(team, kind, row)| {
                (0..BOARD_SIZE).map(move |col| PieceSetup::new(team, kind, Square::new(row, col)))
            })
            .collect();

        Self {
            name: "standard".to_string(),
            blue_flag: Square::new(0, FLAG_COL),
            red_flag: Square::new(last, FLAG_COL),
            pieces,
        }
    }

    /// Empty board with the standard flag homes
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blue_flag: Square::new(0, FLAG_COL),
            red_flag: Square::new(BOARD_SIZE - 1, FLAG_COL),
            pieces: Vec::new(),
        }
    }

    pub fn with_piece(mut self, piece: PieceSetup) -> Self {
        self.pieces.push(piece);
        self
    }

    /// Validate and materialise the board and flags
    pub fn build(&self) -> Result<(Board, Flags), RuleError> {
        if self.pieces.len() > usize::from(PieceId::MAX) + 1 {
            return Err(RuleError::InvalidSetup(format!(
                "too many pieces: {}",
                self.pieces.len()
            )));
        }
        for (team, home) in [(Team::Blue, self.blue_flag), (Team::Red, self.red_flag)] {
            if !home.is_valid() {
                return Err(RuleError::InvalidSetup(format!(
                    "{} flag home {} is off the board",
                    team, home
                )));
            }
        }

        let mut flags = Flags::new(self.blue_flag, self.red_flag);
        let mut origins = FxHashSet::default();
        let mut occupied = FxHashSet::default();
        let mut pieces = Vec::with_capacity(self.pieces.len());

        for (idx, entry) in self.pieces.iter().enumerate() {
            let id = idx as PieceId;
            let mut piece = Piece::new(id, entry.team, entry.kind, entry.origin);
            piece.is_knight = entry.knight;

            if !entry.origin.is_valid() {
                return Err(RuleError::InvalidSetup(format!(
                    "piece {} origin {} is off the board",
                    id, entry.origin
                )));
            }
            if !origins.insert(entry.origin) {
                return Err(RuleError::InvalidSetup(format!(
                    "two pieces share origin {}",
                    entry.origin
                )));
            }

            if entry.benched {
                if entry.flagbearer {
                    return Err(RuleError::InvalidSetup(format!(
                        "benched piece {} cannot carry a flag",
                        id
                    )));
                }
                piece.bench();
            } else {
                let pos = entry.pos.unwrap_or(entry.origin);
                if !pos.is_valid() {
                    return Err(RuleError::InvalidSetup(format!(
                        "piece {} starts off the board at {}",
                        id, pos
                    )));
                }
                if !occupied.insert(pos) {
                    return Err(RuleError::InvalidSetup(format!(
                        "two pieces start on {}",
                        pos
                    )));
                }
                piece.pos = Some(pos);
            }

            if entry.flagbearer {
                let flag = flags.get_mut(entry.team.opponent());
                if flag.is_captured {
                    return Err(RuleError::InvalidSetup(format!(
                        "{} has more than one flagbearer",
                        entry.team
                    )));
                }
                flag.pick_up(id);
                piece.is_flagbearer = true;
            }

            pieces.push(piece);
        }

        Ok((Board::from_pieces(pieces), flags))
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let setup: Setup = serde_json::from_str(&content)?;
        Ok(setup)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Setup {
    fn default() -> Self {
        Self::standard()
    }
}
