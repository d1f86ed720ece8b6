//! Game events and listeners

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::board::{Square, Team};
use crate::pieces::PieceId;

/// Something that happened while resolving an action, in resolution order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Moved { piece: PieceId, from: Square, to: Square },
    Captured { piece: PieceId, by: PieceId, at: Square },
    /// Carrier captured; `flag` names the owning team
    FlagReturned { flag: Team },
    FlagPickedUp { flag: Team, by: PieceId },
    FlagPassed { flag: Team, from: PieceId, to: PieceId },
    KnightSelectionRequired { team: Team, remaining: u8 },
    KnightPromoted { piece: PieceId, team: Team },
    KnightSelectionResolved { team: Team },
    Respawned { piece: PieceId, at: Square },
    RespawnBlocked { piece: PieceId },
    TurnEnded { team: Team, turn_number: u32 },
    TurnStarted { team: Team, turn_number: u32 },
    WinnerDecided { team: Team },
}

/// Subscriber for game notifications.
///
/// All methods default to no-ops; `on_event` sees every event, the others
/// only their own.
pub trait GameListener {
    fn on_event(&mut self, _event: &GameEvent) {}

    fn on_turn_ended(&mut self, _team: Team, _turn_number: u32) {}

    fn on_winner_decided(&mut self, _team: Team) {}

    fn on_knight_selection_required(&mut self, _team: Team, _remaining: u8) {}
}

/// Shared listener, so the subscriber can still be inspected afterwards
impl<L: GameListener> GameListener for Rc<RefCell<L>> {
    fn on_event(&mut self, event: &GameEvent) {
        self.borrow_mut().on_event(event);
    }

    fn on_turn_ended(&mut self, team: Team, turn_number: u32) {
        self.borrow_mut().on_turn_ended(team, turn_number);
    }

    fn on_winner_decided(&mut self, team: Team) {
        self.borrow_mut().on_winner_decided(team);
    }

    fn on_knight_selection_required(&mut self, team: Team, remaining: u8) {
        self.borrow_mut().on_knight_selection_required(team, remaining);
    }
}

/// Forward one event to a listener
pub(crate) fn dispatch(listener: &mut dyn GameListener, event: &GameEvent) {
    listener.on_event(event);
    match *event {
        GameEvent::TurnEnded { team, turn_number } => listener.on_turn_ended(team, turn_number),
        GameEvent::WinnerDecided { team } => listener.on_winner_decided(team),
        GameEvent::KnightSelectionRequired { team, remaining } => {
            listener.on_knight_selection_required(team, remaining)
        }
        _ => {}
    }
}

/// Listener that records every event (used by the CLI log and tests)
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl GameListener for EventLog {
    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}
