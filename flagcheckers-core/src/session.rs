//! Game session - the single entry point for every action
//!
//! Humans, the turn timer and the scripted driver all submit through the
//! same methods, one at a time. Each call either commits fully or is
//! rejected with the state unchanged.

use crate::board::{Square, Team};
use crate::config::GameConfig;
use crate::error::Result;
use crate::events::{dispatch, GameEvent, GameListener};
use crate::game::GameState;
use crate::pieces::PieceId;
use crate::setup::Setup;
use crate::snapshot::{BoardSnapshot, FlagSnapshot, Snapshot};

/// Result of an accepted action
#[derive(Clone, Debug)]
pub struct Outcome {
    pub events: Vec<GameEvent>,
    pub snapshot: Snapshot,
}

/// Owned game plus its subscribers.
///
/// Accepted submissions return an `Outcome` with the new snapshot. A
/// rejection returns only the `RuleError`: the state is untouched, so
/// `snapshot()` after an `Err` is the snapshot to show.
pub struct Game {
    state: GameState,
    listeners: Vec<Box<dyn GameListener>>,
}

impl Game {
    pub fn new(setup: &Setup, config: GameConfig) -> Result<Self> {
        Ok(Self::from_state(GameState::new(setup, config)?))
    }

    pub fn standard(config: GameConfig) -> Self {
        Self::from_state(GameState::standard(config))
    }

    pub fn from_state(state: GameState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn GameListener>) {
        self.listeners.push(listener);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn board_snapshot(&self) -> BoardSnapshot {
        self.state.board_snapshot()
    }

    pub fn flags_snapshot(&self) -> Vec<FlagSnapshot> {
        self.state.flags_snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Move hints for a piece
    pub fn legal_destinations(&self, id: PieceId) -> Vec<Square> {
        self.state.legal_destinations(id)
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    pub fn submit_move(&mut self, id: PieceId, to: Square) -> Result<Outcome> {
        let result = self.state.apply_move(id, to);
        self.finish("move", result)
    }

    pub fn submit_pass(&mut self, from: PieceId, to: PieceId) -> Result<Outcome> {
        let result = self.state.apply_pass(from, to);
        self.finish("pass", result)
    }

    pub fn submit_knight_selection(&mut self, id: PieceId) -> Result<Outcome> {
        let result = self.state.select_knight(id);
        self.finish("knight selection", result)
    }

    pub fn end_turn_now(&mut self) -> Result<Outcome> {
        let result = self.state.end_turn();
        self.finish("end turn", result)
    }

    /// Timer expiry for `turn_number`. A stale or post-game expiry is a
    /// no-op, so a late timer can never cut a later turn short.
    pub fn expire_turn(&mut self, turn_number: u32) -> Result<Option<Outcome>> {
        if self.state.is_over() || self.state.turn_number() != turn_number {
            tracing::debug!("Ignoring stale timer for turn {}", turn_number);
            return Ok(None);
        }
        tracing::info!("Turn {} timed out", turn_number);
        self.end_turn_now().map(Some)
    }

    /// Finish `team`'s open knight selection with the nearest pieces
    pub fn auto_select_knights(&mut self, team: Team) -> Outcome {
        let events = self.state.resolve_pending_knights(team);
        self.publish(events)
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    fn finish(&mut self, action: &str, result: Result<Vec<GameEvent>>) -> Result<Outcome> {
        match result {
            Ok(events) => Ok(self.publish(events)),
            Err(e) => {
                tracing::debug!("Rejected {}: {}", action, e);
                Err(e)
            }
        }
    }

    fn publish(&mut self, events: Vec<GameEvent>) -> Outcome {
        for event in &events {
            match event {
                GameEvent::WinnerDecided { team } => tracing::info!("{} wins", team),
                GameEvent::TurnStarted { team, turn_number } => {
                    tracing::info!("Turn {}: {} to move", turn_number, team)
                }
                _ => tracing::debug!("{:?}", event),
            }
            for listener in &mut self.listeners {
                dispatch(listener.as_mut(), event);
            }
        }

        Outcome {
            events,
            snapshot: self.state.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::events::EventLog;

    #[derive(Default)]
    struct Counters {
        turns_ended: u32,
        winners: Vec<Team>,
        selections: Vec<(Team, u8)>,
    }

    impl GameListener for Counters {
        fn on_turn_ended(&mut self, _team: Team, _turn_number: u32) {
            self.turns_ended += 1;
        }

        fn on_winner_decided(&mut self, team: Team) {
            self.winners.push(team);
        }

        fn on_knight_selection_required(&mut self, team: Team, remaining: u8) {
            self.selections.push((team, remaining));
        }
    }

    #[test]
    fn test_listeners_receive_events() {
        let mut game = Game::standard(GameConfig::hot_seat());
        let log = Rc::new(RefCell::new(EventLog::default()));
        let counters = Rc::new(RefCell::new(Counters::default()));
        game.subscribe(Box::new(log.clone()));
        game.subscribe(Box::new(counters.clone()));

        let pawn = game.board_snapshot().at(Square::new(1, 3)).unwrap().id;
        let outcome = game.submit_move(pawn, Square::new(2, 3)).unwrap();
        assert_eq!(outcome.snapshot.board.at(Square::new(2, 3)).unwrap().id, pawn);

        game.end_turn_now().unwrap();
        assert_eq!(counters.borrow().turns_ended, 1);
        assert!(counters.borrow().winners.is_empty());
        assert!(counters.borrow().selections.is_empty());
        assert_eq!(log.borrow().events.len(), 3);
    }

    #[test]
    fn test_rejection_publishes_nothing() {
        let mut game = Game::standard(GameConfig::hot_seat());
        let log = Rc::new(RefCell::new(EventLog::default()));
        game.subscribe(Box::new(log.clone()));

        assert!(game.submit_move(0, Square::new(4, 4)).is_err());
        assert!(game.submit_pass(0, 1).is_err());
        assert!(game.submit_knight_selection(0).is_err());
        assert!(log.borrow().events.is_empty());
    }

    #[test]
    fn test_snapshot_after_rejection_is_unchanged() {
        let mut game = Game::standard(GameConfig::hot_seat());
        let before = game.snapshot();

        let red_pawn = game.board_snapshot().at(Square::new(6, 3)).unwrap().id;
        assert!(game.submit_move(red_pawn, Square::new(5, 3)).is_err());
        assert!(game.end_turn_now().is_ok());
        assert!(game.submit_pass(red_pawn, red_pawn).is_err());

        // Only the accepted end of turn shows up
        let after = game.snapshot();
        assert_eq!(after.board, before.board);
        assert_eq!(after.turn_number, 2);
        assert_eq!(after.current_team, Team::Red);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut game = Game::standard(GameConfig::hot_seat());
        game.end_turn_now().unwrap();
        assert_eq!(game.state().turn_number(), 2);

        // Timer armed for turn 1 fires late
        assert!(game.expire_turn(1).unwrap().is_none());
        assert_eq!(game.state().turn_number(), 2);

        assert!(game.expire_turn(2).unwrap().is_some());
        assert_eq!(game.state().turn_number(), 3);
        assert_eq!(game.state().current_team(), Team::Blue);
    }
}
