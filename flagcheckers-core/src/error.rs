//! Rejection reasons for player actions
//!
//! Every rejected action leaves the game untouched; these are outcomes to
//! report to the caller, not faults.

use crate::board::{Square, Team};
use crate::pieces::PieceId;

/// Error types for game actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),

    #[error("invalid knight selection: {0}")]
    InvalidSelection(#[from] InvalidSelection),

    #[error("invalid pass: {0}")]
    InvalidPass(#[from] InvalidPass),

    #[error("invalid setup: {0}")]
    InvalidSetup(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("the game is already over")]
    GameOver,

    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),

    #[error("it is not {0}'s turn")]
    NotYourTurn(Team),

    #[error("piece {0} already acted this turn")]
    AlreadyActed(PieceId),

    #[error("piece {0} is not on the board")]
    OffBoard(PieceId),

    #[error("{team} must finish choosing knights first")]
    SelectionPending { team: Team },

    #[error("piece {piece} cannot reach {to}")]
    Unreachable { piece: PieceId, to: Square },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSelection {
    #[error("the game is already over")]
    GameOver,

    #[error("no knight selection is open")]
    NotOpen,

    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),

    #[error("piece {0} does not belong to the defending team")]
    WrongTeam(PieceId),

    #[error("piece {0} is already a knight")]
    AlreadyKnight(PieceId),

    #[error("piece {0} is not on the board")]
    OffBoard(PieceId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPass {
    #[error("the game is already over")]
    GameOver,

    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),

    #[error("it is not {0}'s turn")]
    NotYourTurn(Team),

    #[error("{team} must finish choosing knights first")]
    SelectionPending { team: Team },

    #[error("piece {0} is not carrying the enemy flag")]
    NotCarrying(PieceId),

    #[error("piece {0} already acted this turn")]
    AlreadyActed(PieceId),

    #[error("pass already used this turn")]
    AlreadyUsed,

    #[error("piece {0} is not a teammate on the board")]
    BadReceiver(PieceId),

    #[error("pieces {from} and {to} are not adjacent")]
    NotAdjacent { from: PieceId, to: PieceId },
}

pub type Result<T> = std::result::Result<T, RuleError>;
