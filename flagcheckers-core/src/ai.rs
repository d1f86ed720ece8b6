//! Scripted AI and random player
//!
//! The scripted team plays a whole turn as a sequence of independent
//! actions: pass the flag if a teammate is closer to home, otherwise make
//! the best-scoring move across the team. Each action goes through the same
//! `Game` submissions a human uses.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Square, Team};
use crate::config::GameConfig;
use crate::game::GameState;
use crate::knights;
use crate::pieces::{Piece, PieceId};
use crate::session::Game;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Taking an enemy piece
pub const SCORE_CAPTURE: f64 = 1000.0;

/// Stepping onto the enemy flag while it is at home
pub const SCORE_FLAG_GRAB: f64 = 900.0;

/// Flagbearer base score, minus `CARRY_ROW_PENALTY` per row from home
pub const SCORE_CARRY: f64 = 800.0;
pub const CARRY_ROW_PENALTY: f64 = 10.0;

/// Everyone else: base score minus distance to the enemy flag
pub const SCORE_ADVANCE: f64 = 100.0;

// ============================================================================
// ACTIONS
// ============================================================================

/// One player action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move { piece: PieceId, to: Square },
    Pass { from: PieceId, to: PieceId },
}

impl Action {
    /// Submit through the session
    pub fn submit(self, game: &mut Game) -> crate::error::Result<crate::session::Outcome> {
        match self {
            Action::Move { piece, to } => game.submit_move(piece, to),
            Action::Pass { from, to } => game.submit_pass(from, to),
        }
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Score a move (higher = better)
pub fn score_move(state: &GameState, piece: &Piece, to: Square) -> f64 {
    if let Some(target) = state.board().piece_at(to) {
        if target.team != piece.team {
            return SCORE_CAPTURE;
        }
    }

    let enemy_flag = state.flags().get(piece.team.opponent());
    if !enemy_flag.is_captured && to == enemy_flag.home {
        return SCORE_FLAG_GRAB;
    }

    if piece.is_flagbearer {
        let rows = piece.team.own_side_rows();
        return SCORE_CARRY - CARRY_ROW_PENALTY * f64::from(to.row_distance_to(&rows));
    }

    SCORE_ADVANCE - to.distance_to(enemy_flag.home)
}

/// Pass to the adjacent teammate nearest home, if strictly nearer than the
/// carrier
pub fn find_pass(state: &GameState, team: Team) -> Option<Action> {
    if state.used_pass_this_turn() {
        return None;
    }

    let board = state.board();
    let carrier = board
        .team_pieces(team)
        .find(|p| p.is_flagbearer && !state.has_acted(p.id))?;
    let here = carrier.pos?;
    let rows = team.own_side_rows();

    let (ally, ally_dist) = board
        .team_pieces(team)
        .filter(|q| q.id != carrier.id)
        .filter_map(|q| q.pos.map(|sq| (q, sq)))
        .filter(|(_, sq)| sq.is_adjacent(here))
        .map(|(q, sq)| (q.id, sq.row_distance_to(&rows)))
        .min_by_key(|&(_, dist)| dist)?;

    (ally_dist < here.row_distance_to(&rows)).then_some(Action::Pass {
        from: carrier.id,
        to: ally,
    })
}

/// Best (piece, destination) over every piece that has not acted; ties
/// keep the first found in piece-id then offset order
pub fn best_move(state: &GameState, team: Team) -> Option<(Action, f64)> {
    let mut best: Option<(Action, f64)> = None;

    for piece in state.board().team_pieces(team) {
        for to in state.legal_destinations(piece.id) {
            let score = score_move(state, piece, to);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((Action::Move { piece: piece.id, to }, score));
            }
        }
    }

    best
}

/// Next action for `team` given the committed state, or `None` when the
/// team cannot act
pub fn choose_next_action(state: &GameState, team: Team) -> Option<Action> {
    if state.is_over()
        || state.current_team() != team
        || state.knight_selection().is_pending_for(team)
    {
        return None;
    }

    find_pass(state, team).or_else(|| best_move(state, team).map(|(action, _)| action))
}

// ============================================================================
// SCRIPTED DRIVER
// ============================================================================

/// Why a scripted turn stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No legal action left
    Exhausted,
    /// Per-turn action cap reached
    ActionCap,
    WinnerDecided,
    /// Someone else ended the turn (timer, caller)
    TurnChanged,
}

/// Result of one driver step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Acted(Action),
    Stopped(StopReason),
}

/// Summary of a finished turn
#[derive(Clone, Debug)]
pub struct TurnReport {
    pub team: Team,
    pub actions: Vec<Action>,
    pub stop: StopReason,
}

/// Drives a team's turn with the greedy heuristic
#[derive(Clone, Copy, Debug)]
pub struct ScriptedDriver {
    pub action_cap: usize,
}

impl ScriptedDriver {
    pub fn new(action_cap: usize) -> Self {
        Self { action_cap }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.ai_action_cap)
    }

    /// Start the current team's turn: finish any pending knight selection
    /// first, then hand back a stepper bound to this turn
    pub fn begin_turn(&self, game: &mut Game) -> ScriptedTurn {
        let team = game.state().current_team();
        if game.state().knight_selection().is_pending_for(team) {
            game.auto_select_knights(team);
        }

        ScriptedTurn {
            team,
            turn_number: game.state().turn_number(),
            taken: 0,
            cap: self.action_cap,
        }
    }

    /// Play the current team's whole turn and hand the turn over
    pub fn play_turn(&self, game: &mut Game) -> TurnReport {
        let mut turn = self.begin_turn(game);
        let mut actions = Vec::new();

        let stop = loop {
            match turn.step(game) {
                Step::Acted(action) => actions.push(action),
                Step::Stopped(reason) => break reason,
            }
        };

        if matches!(stop, StopReason::Exhausted | StopReason::ActionCap) {
            if let Err(e) = game.end_turn_now() {
                tracing::warn!("Scripted {} could not end turn: {}", turn.team, e);
            }
        }

        tracing::debug!("{} took {} actions ({:?})", turn.team, actions.len(), stop);

        TurnReport {
            team: turn.team,
            actions,
            stop,
        }
    }
}

/// One scripted turn in progress. Each `step` re-reads the committed state
/// and stops once the turn or game has moved on.
#[derive(Clone, Debug)]
pub struct ScriptedTurn {
    team: Team,
    turn_number: u32,
    taken: usize,
    cap: usize,
}

impl ScriptedTurn {
    pub fn team(&self) -> Team {
        self.team
    }

    pub fn actions_taken(&self) -> usize {
        self.taken
    }

    pub fn step(&mut self, game: &mut Game) -> Step {
        let state = game.state();
        if state.is_over() {
            return Step::Stopped(StopReason::WinnerDecided);
        }
        if state.current_team() != self.team || state.turn_number() != self.turn_number {
            return Step::Stopped(StopReason::TurnChanged);
        }
        if self.taken >= self.cap {
            return Step::Stopped(StopReason::ActionCap);
        }

        let Some(action) = choose_next_action(state, self.team) else {
            return Step::Stopped(StopReason::Exhausted);
        };

        match action.submit(game) {
            Ok(_) => {
                self.taken += 1;
                Step::Acted(action)
            }
            Err(e) => {
                tracing::warn!("Scripted action {:?} rejected: {}", action, e);
                Step::Stopped(StopReason::Exhausted)
            }
        }
    }
}

// ============================================================================
// RANDOM PLAYER
// ============================================================================

/// Plays uniformly random legal moves; picks knights at random too
pub struct RandomPlayer {
    pub action_cap: usize,
    rng: ChaCha8Rng,
}

impl RandomPlayer {
    pub fn new(action_cap: usize) -> Self {
        Self::with_seed(action_cap, 42)
    }

    pub fn with_seed(action_cap: usize, seed: u64) -> Self {
        Self {
            action_cap,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Random legal move for `team`
    pub fn choose(&mut self, state: &GameState, team: Team) -> Option<Action> {
        if state.is_over() || state.current_team() != team {
            return None;
        }
        let options: Vec<Action> = state
            .board()
            .team_pieces(team)
            .flat_map(|p| {
                state
                    .legal_destinations(p.id)
                    .into_iter()
                    .map(move |to| Action::Move { piece: p.id, to })
            })
            .collect();
        options.choose(&mut self.rng).copied()
    }

    /// Crown random pieces until `team`'s selection closes
    pub fn pick_knights(&mut self, game: &mut Game, team: Team) {
        while game.state().knight_selection().is_pending_for(team) {
            let candidates: Vec<PieceId> = knights::eligible(game.state().board(), team).collect();
            let Some(&id) = candidates.choose(&mut self.rng) else {
                break;
            };
            if let Err(e) = game.submit_knight_selection(id) {
                tracing::warn!("Random knight pick rejected: {}", e);
                break;
            }
        }
    }

    /// Play the current team's turn and hand it over
    pub fn play_turn(&mut self, game: &mut Game) -> TurnReport {
        let team = game.state().current_team();
        self.pick_knights(game, team);

        let mut actions = Vec::new();
        let stop = loop {
            if game.state().is_over() {
                break StopReason::WinnerDecided;
            }
            if actions.len() >= self.action_cap {
                break StopReason::ActionCap;
            }
            let Some(action) = self.choose(game.state(), team) else {
                break StopReason::Exhausted;
            };
            match action.submit(game) {
                Ok(_) => actions.push(action),
                Err(e) => {
                    tracing::warn!("Random action {:?} rejected: {}", action, e);
                    break StopReason::Exhausted;
                }
            }
        };

        if stop != StopReason::WinnerDecided {
            if let Err(e) = game.end_turn_now() {
                tracing::warn!("Random {} could not end turn: {}", team, e);
            }
        }

        TurnReport { team, actions, stop }
    }
}

// ============================================================================
// TESTS
// ============================================================================
