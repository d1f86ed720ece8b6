//! Flag Checkers Core - Rules engine and scripted AI
//!
//! This crate provides the core game logic for Flag Checkers:
//! - Board geometry (8x8 grid, row/column squares)
//! - Pieces, flags and the standard setup
//! - Move legality, captures, flag pickup and passing
//! - Turn hand-off with respawns and knight selection
//! - A session facade with events and snapshots
//! - Greedy scripted AI and a random player

pub mod board;
pub mod pieces;
pub mod error;
pub mod setup;
pub mod moves;
pub mod knights;
pub mod events;
pub mod config;
pub mod game;
pub mod snapshot;
pub mod session;
pub mod ai;

// Re-exports for convenient access
pub use board::{Board, Square, Team, BOARD_SIZE};
pub use pieces::{Flag, Flags, Piece, PieceId, PieceKind, RESPAWN_TURNS};
pub use error::{IllegalMove, InvalidPass, InvalidSelection, RuleError};
pub use setup::{PieceSetup, Setup};
pub use knights::{KnightSelection, KNIGHTS_PER_CAPTURE};
pub use events::{EventLog, GameEvent, GameListener};
pub use config::{Controller, GameConfig};
pub use game::GameState;
pub use snapshot::{BoardSnapshot, FlagSnapshot, Snapshot};
pub use session::{Game, Outcome};
pub use ai::{choose_next_action, Action, RandomPlayer, ScriptedDriver, StopReason, TurnReport};
