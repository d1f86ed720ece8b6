//! Knight selection after a flag is taken
//!
//! When a team loses its flag, two of its on-board pieces are crowned
//! Knights. A human team picks them one at a time; a scripted team gets the
//! two pieces closest to its flag home straight away.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Square, Team};
use crate::pieces::PieceId;

/// Knights crowned per flag loss
pub const KNIGHTS_PER_CAPTURE: u8 = 2;

/// Selection state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnightSelection {
    #[default]
    Idle,
    Awaiting { team: Team, remaining: u8 },
}

impl KnightSelection {
    /// Team that still has knights to pick
    pub fn pending_team(&self) -> Option<Team> {
        match self {
            KnightSelection::Idle => None,
            KnightSelection::Awaiting { team, .. } => Some(*team),
        }
    }

    pub fn is_pending_for(&self, team: Team) -> bool {
        self.pending_team() == Some(team)
    }

    /// State after one successful pick
    pub(crate) fn after_pick(self) -> Self {
        match self {
            KnightSelection::Awaiting { team, remaining } if remaining > 1 => {
                KnightSelection::Awaiting {
                    team,
                    remaining: remaining - 1,
                }
            }
            _ => KnightSelection::Idle,
        }
    }
}

/// Pieces that may still be crowned: on the board and not yet Knights
pub fn eligible(board: &Board, team: Team) -> impl Iterator<Item = PieceId> + '_ {
    board
        .team_pieces(team)
        .filter(|p| !p.is_knight)
        .map(|p| p.id)
}

/// The `count` eligible pieces nearest to `home` by Euclidean distance;
/// ties keep id order.
pub fn nearest_candidates(board: &Board, team: Team, home: Square, count: usize) -> Vec<PieceId> {
    let mut candidates: Vec<(PieceId, f64)> = board
        .team_pieces(team)
        .filter(|p| !p.is_knight)
        .filter_map(|p| p.pos.map(|sq| (p.id, sq.distance_to(home))))
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates.into_iter().take(count).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;
    use crate::setup::{PieceSetup, Setup};

    #[test]
    fn test_after_pick_counts_down() {
        let sel = KnightSelection::Awaiting {
            team: Team::Red,
            remaining: 2,
        };
        let sel = sel.after_pick();
        assert_eq!(
            sel,
            KnightSelection::Awaiting {
                team: Team::Red,
                remaining: 1
            }
        );
        assert_eq!(sel.after_pick(), KnightSelection::Idle);
        assert!(!KnightSelection::Idle.is_pending_for(Team::Red));
    }

    #[test]
    fn test_nearest_candidates_standard() {
        let (board, flags) = Setup::standard().build().unwrap();
        let home = flags.get(Team::Blue).home;
        let picks = nearest_candidates(&board, Team::Blue, home, 2);
        // B-M3 stands on the flag home, then B-M2 ties with B-M4 and B-P3 at
        // distance 1; id order breaks the tie.
        assert_eq!(picks, vec![3, 2]);
    }

    #[test]
    fn test_nearest_skips_knights_and_benched() {
        let (board, _) = Setup::empty("skip")
            .with_piece(PieceSetup::new(Team::Red, PieceKind::Major, Square::new(7, 3)).knight())
            .with_piece(PieceSetup::new(Team::Red, PieceKind::Major, Square::new(7, 4)).benched())
            .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 0)))
            .build()
            .unwrap();
        assert_eq!(nearest_candidates(&board, Team::Red, Square::new(7, 3), 2), vec![2]);
        assert_eq!(eligible(&board, Team::Red).count(), 1);
    }
}
