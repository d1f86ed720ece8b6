//! Move legality

use rustc_hash::FxHashSet;

use crate::board::{Board, Square, NEIGHBOR_OFFSETS};
use crate::pieces::{Piece, PieceId};

/// One-square offsets a piece may try from where it stands.
///
/// Flagbearers and Knights get all 8 neighbours. Everyone else moves
/// forward (straight and both diagonals), plus sideways while standing on
/// the opponent's back rank.
pub fn candidate_offsets(piece: &Piece) -> Vec<(i8, i8)> {
    if piece.is_omnidirectional() {
        return NEIGHBOR_OFFSETS.to_vec();
    }

    let dir = piece.team.forward_direction();
    let mut offsets = vec![(dir, 0), (dir, -1), (dir, 1)];

    let on_enemy_back_rank = piece
        .pos
        .is_some_and(|sq| sq.row == piece.team.opponent_back_rank());
    if on_enemy_back_rank {
        offsets.push((0, -1));
        offsets.push((0, 1));
    }

    offsets
}

/// Legal destinations for `piece`, in offset order.
///
/// Empty when the piece is benched or has already acted this turn. A
/// destination is either empty or holds an enemy piece (capture by
/// displacement); friendly squares are never legal.
pub fn legal_destinations(board: &Board, piece: &Piece, moved: &FxHashSet<PieceId>) -> Vec<Square> {
    let from = match piece.pos {
        Some(sq) => sq,
        None => return vec![],
    };
    if moved.contains(&piece.id) {
        return vec![];
    }

    candidate_offsets(piece)
        .into_iter()
        .filter_map(|(dr, dc)| from.offset(dr, dc))
        .filter(|&to| match board.piece_at(to) {
            Some(occupant) => occupant.team != piece.team,
            None => true,
        })
        .collect()
}
