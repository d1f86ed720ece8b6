//! Game state and turn resolution

use rustc_hash::FxHashSet;

use crate::board::{Board, Square, Team};
use crate::config::{Controller, GameConfig};
use crate::error::{IllegalMove, InvalidPass, InvalidSelection, Result};
use crate::events::GameEvent;
use crate::knights::{self, KnightSelection, KNIGHTS_PER_CAPTURE};
use crate::moves;
use crate::pieces::{Flags, PieceId, RESPAWN_RETRY_TURNS};
use crate::setup::Setup;
use crate::snapshot::{BenchEntry, BoardSnapshot, FlagSnapshot, Snapshot};

// ============================================================================
// GAME STATE
// ============================================================================

/// Complete rules state. Mutated only through `apply_move`, `apply_pass`,
/// `select_knight`, `resolve_pending_knights` and `end_turn`, each of which
/// either succeeds or leaves the state untouched.
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    flags: Flags,
    config: GameConfig,

    /// Team to move
    current_team: Team,

    /// Turn counter, starts at 1 and increments on every hand-off
    turn_number: u32,

    /// Pieces that already moved or passed this turn
    moved_this_turn: FxHashSet<PieceId>,
    used_pass_this_turn: bool,

    knight_selection: KnightSelection,
    winner: Option<Team>,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn new(setup: &Setup, config: GameConfig) -> Result<Self> {
        let (board, flags) = setup.build()?;
        Ok(Self {
            board,
            flags,
            current_team: config.first_team,
            config,
            turn_number: 1,
            moved_this_turn: FxHashSet::default(),
            used_pass_this_turn: false,
            knight_selection: KnightSelection::Idle,
            winner: None,
        })
    }

    /// Standard 16-a-side opening
    pub fn standard(config: GameConfig) -> Self {
        Self::new(&Setup::standard(), config).expect("standard setup is valid")
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_team(&self) -> Team {
        self.current_team
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn moved_this_turn(&self) -> &FxHashSet<PieceId> {
        &self.moved_this_turn
    }

    pub fn has_acted(&self, id: PieceId) -> bool {
        self.moved_this_turn.contains(&id)
    }

    pub fn used_pass_this_turn(&self) -> bool {
        self.used_pass_this_turn
    }

    pub fn knight_selection(&self) -> KnightSelection {
        self.knight_selection
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Destinations `apply_move` would accept for a piece right now. Empty
    /// for unknown ids, off-turn pieces, a finished game or while the
    /// piece's team owes a knight selection.
    pub fn legal_destinations(&self, id: PieceId) -> Vec<Square> {
        match self.board.piece(id) {
            Some(piece)
                if self.winner.is_none()
                    && piece.team == self.current_team
                    && !self.knight_selection.is_pending_for(piece.team) =>
            {
                moves::legal_destinations(&self.board, piece, &self.moved_this_turn)
            }
            _ => vec![],
        }
    }

    // ========================================================================
    // MOVE
    // ========================================================================

    /// Move a piece, resolving in order: capture, relocate, flag pickup,
    /// win check, mark as acted.
    pub fn apply_move(&mut self, id: PieceId, to: Square) -> Result<Vec<GameEvent>> {
        let from = self.check_move(id, to)?;
        let team = self.current_team;
        let enemy = team.opponent();
        let mut events = Vec::new();

        // 1. Capture
        if let Some(target) = self.board.piece_at(to).map(|p| p.id) {
            let was_carrier = self.flags.get(team).carried_by == Some(target);
            self.board.lift(target);
            if let Some(victim) = self.board.piece_mut(target) {
                victim.bench();
            }
            events.push(GameEvent::Captured { piece: target, by: id, at: to });

            // The victim was carrying our flag: it is freed, not dropped
            if was_carrier {
                self.flags.get_mut(team).release();
                events.push(GameEvent::FlagReturned { flag: team });
            }
            events.extend(self.settle_selection());
        }

        // 2. Relocate
        self.board.place(id, to);
        events.push(GameEvent::Moved { piece: id, from, to });

        // 3. Flag pickup
        let enemy_flag = self.flags.get(enemy);
        if !enemy_flag.is_captured && to == enemy_flag.home {
            self.flags.get_mut(enemy).pick_up(id);
            if let Some(mover) = self.board.piece_mut(id) {
                mover.is_flagbearer = true;
            }
            events.push(GameEvent::FlagPickedUp { flag: enemy, by: id });
            events.extend(self.open_knight_selection(enemy));
        }

        // 4. Win check
        let carrying = self.board.piece(id).is_some_and(|p| p.is_flagbearer);
        if carrying && team.own_side_rows().contains(&to.row) {
            self.winner = Some(team);
            events.push(GameEvent::WinnerDecided { team });
        }

        // 5. Consume the piece for this turn
        self.moved_this_turn.insert(id);

        Ok(events)
    }

    fn check_move(&self, id: PieceId, to: Square) -> Result<Square> {
        if self.winner.is_some() {
            return Err(IllegalMove::GameOver.into());
        }
        let piece = self.board.piece(id).ok_or(IllegalMove::UnknownPiece(id))?;
        if piece.team != self.current_team {
            return Err(IllegalMove::NotYourTurn(piece.team).into());
        }
        if self.knight_selection.is_pending_for(piece.team) {
            return Err(IllegalMove::SelectionPending { team: piece.team }.into());
        }
        if self.moved_this_turn.contains(&id) {
            return Err(IllegalMove::AlreadyActed(id).into());
        }
        let from = piece.pos.ok_or(IllegalMove::OffBoard(id))?;
        if !moves::legal_destinations(&self.board, piece, &self.moved_this_turn).contains(&to) {
            return Err(IllegalMove::Unreachable { piece: id, to }.into());
        }
        Ok(from)
    }

    // ========================================================================
    // PASS
    // ========================================================================

    /// Hand the carried enemy flag to an adjacent teammate. The passer is
    /// consumed for the turn; the receiver is not.
    pub fn apply_pass(&mut self, from: PieceId, to: PieceId) -> Result<Vec<GameEvent>> {
        self.check_pass(from, to)?;
        let team = self.current_team;
        let enemy = team.opponent();

        if let Some(passer) = self.board.piece_mut(from) {
            passer.is_flagbearer = false;
        }
        if let Some(receiver) = self.board.piece_mut(to) {
            receiver.is_flagbearer = true;
        }
        self.flags.get_mut(enemy).pick_up(to);
        self.moved_this_turn.insert(from);
        self.used_pass_this_turn = true;

        Ok(vec![GameEvent::FlagPassed { flag: enemy, from, to }])
    }

    fn check_pass(&self, from: PieceId, to: PieceId) -> Result<()> {
        if self.winner.is_some() {
            return Err(InvalidPass::GameOver.into());
        }
        let passer = self.board.piece(from).ok_or(InvalidPass::UnknownPiece(from))?;
        let team = passer.team;
        if team != self.current_team {
            return Err(InvalidPass::NotYourTurn(team).into());
        }
        if self.knight_selection.is_pending_for(team) {
            return Err(InvalidPass::SelectionPending { team }.into());
        }
        if self.used_pass_this_turn {
            return Err(InvalidPass::AlreadyUsed.into());
        }
        if self.moved_this_turn.contains(&from) {
            return Err(InvalidPass::AlreadyActed(from).into());
        }
        let carrying = passer.is_flagbearer
            && passer.pos.is_some()
            && self.flags.get(team.opponent()).carried_by == Some(from);
        if !carrying {
            return Err(InvalidPass::NotCarrying(from).into());
        }

        let receiver = self.board.piece(to).ok_or(InvalidPass::UnknownPiece(to))?;
        if to == from || receiver.team != team {
            return Err(InvalidPass::BadReceiver(to).into());
        }
        match (passer.pos, receiver.pos) {
            (Some(a), Some(b)) if a.is_adjacent(b) => Ok(()),
            (_, None) => Err(InvalidPass::BadReceiver(to).into()),
            _ => Err(InvalidPass::NotAdjacent { from, to }.into()),
        }
    }

    // ========================================================================
    // KNIGHT SELECTION
    // ========================================================================

    /// Start the knight protocol for a team that just lost its flag
    fn open_knight_selection(&mut self, defending: Team) -> Vec<GameEvent> {
        let available = knights::eligible(&self.board, defending).count();
        let count = available.min(usize::from(KNIGHTS_PER_CAPTURE)) as u8;
        if count == 0 {
            return vec![];
        }

        match self.config.controller(defending) {
            Controller::Scripted => self.promote_nearest(defending, count),
            Controller::Human => {
                self.knight_selection = KnightSelection::Awaiting {
                    team: defending,
                    remaining: count,
                };
                vec![GameEvent::KnightSelectionRequired {
                    team: defending,
                    remaining: count,
                }]
            }
        }
    }

    /// Crown the `count` eligible pieces nearest to the team's flag home
    fn promote_nearest(&mut self, team: Team, count: u8) -> Vec<GameEvent> {
        let home = self.flags.get(team).home;
        let picks = knights::nearest_candidates(&self.board, team, home, usize::from(count));
        let mut events = Vec::with_capacity(picks.len());
        for id in picks {
            if let Some(piece) = self.board.piece_mut(id) {
                piece.is_knight = true;
                events.push(GameEvent::KnightPromoted { piece: id, team });
            }
        }
        events
    }

    /// Crown one piece for the team whose selection is open
    pub fn select_knight(&mut self, id: PieceId) -> Result<Vec<GameEvent>> {
        if self.winner.is_some() {
            return Err(InvalidSelection::GameOver.into());
        }
        let team = self
            .knight_selection
            .pending_team()
            .ok_or(InvalidSelection::NotOpen)?;
        let piece = self.board.piece(id).ok_or(InvalidSelection::UnknownPiece(id))?;
        if piece.team != team {
            return Err(InvalidSelection::WrongTeam(id).into());
        }
        if piece.pos.is_none() {
            return Err(InvalidSelection::OffBoard(id).into());
        }
        if piece.is_knight {
            return Err(InvalidSelection::AlreadyKnight(id).into());
        }

        if let Some(piece) = self.board.piece_mut(id) {
            piece.is_knight = true;
        }
        let mut events = vec![GameEvent::KnightPromoted { piece: id, team }];

        self.knight_selection = self.knight_selection.after_pick();
        if self.knight_selection == KnightSelection::Idle {
            events.push(GameEvent::KnightSelectionResolved { team });
        } else {
            events.extend(self.settle_selection());
        }
        Ok(events)
    }

    /// Finish an open selection for `team` automatically (nearest pieces)
    pub fn resolve_pending_knights(&mut self, team: Team) -> Vec<GameEvent> {
        let remaining = match self.knight_selection {
            KnightSelection::Awaiting { team: t, remaining } if t == team => remaining,
            _ => return vec![],
        };
        let mut events = self.promote_nearest(team, remaining);
        self.knight_selection = KnightSelection::Idle;
        events.push(GameEvent::KnightSelectionResolved { team });
        events
    }

    /// Close an open selection once no piece is left to crown
    fn settle_selection(&mut self) -> Vec<GameEvent> {
        if let KnightSelection::Awaiting { team, .. } = self.knight_selection {
            if knights::eligible(&self.board, team).next().is_none() {
                self.knight_selection = KnightSelection::Idle;
                return vec![GameEvent::KnightSelectionResolved { team }];
            }
        }
        vec![]
    }

    // ========================================================================
    // TURN HAND-OFF
    // ========================================================================

    /// Hand the turn to the other team and run its respawns
    pub fn end_turn(&mut self) -> Result<Vec<GameEvent>> {
        if self.winner.is_some() {
            return Err(IllegalMove::GameOver.into());
        }

        let mut events = vec![GameEvent::TurnEnded {
            team: self.current_team,
            turn_number: self.turn_number,
        }];

        self.current_team = self.current_team.opponent();
        self.turn_number += 1;
        self.moved_this_turn.clear();
        self.used_pass_this_turn = false;

        events.push(GameEvent::TurnStarted {
            team: self.current_team,
            turn_number: self.turn_number,
        });
        events.extend(self.process_respawns(self.current_team));

        Ok(events)
    }

    /// Count down benched pieces of `team`; return those whose origin is free
    fn process_respawns(&mut self, team: Team) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let benched: Vec<PieceId> = self.board.benched(team).map(|p| p.id).collect();

        for id in benched {
            let (countdown, origin) = match self.board.piece(id) {
                Some(p) => (p.respawn_countdown, p.origin),
                None => continue,
            };
            let Some(countdown) = countdown else { continue };

            let left = countdown.saturating_sub(1);
            if left > 0 {
                self.set_countdown(id, Some(left));
                continue;
            }

            if self.board.is_occupied(origin) {
                // Retry next own turn, never the full wait again
                self.set_countdown(id, Some(RESPAWN_RETRY_TURNS));
                events.push(GameEvent::RespawnBlocked { piece: id });
            } else {
                self.set_countdown(id, None);
                self.board.place(id, origin);
                events.push(GameEvent::Respawned { piece: id, at: origin });
            }
        }

        events
    }

    fn set_countdown(&mut self, id: PieceId, countdown: Option<u8>) {
        if let Some(piece) = self.board.piece_mut(id) {
            piece.respawn_countdown = countdown;
        }
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    pub fn board_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::of(&self.board)
    }

    pub fn flags_snapshot(&self) -> Vec<FlagSnapshot> {
        Team::ALL
            .iter()
            .map(|&team| FlagSnapshot::of(team, self.flags.get(team)))
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut moved: Vec<PieceId> = self.moved_this_turn.iter().copied().collect();
        moved.sort_unstable();

        Snapshot {
            turn_number: self.turn_number,
            current_team: self.current_team,
            winner: self.winner,
            knight_selection: self.knight_selection,
            used_pass_this_turn: self.used_pass_this_turn,
            moved_this_turn: moved,
            board: self.board_snapshot(),
            flags: self.flags_snapshot(),
            bench: self
                .board
                .pieces()
                .iter()
                .filter_map(BenchEntry::of)
                .collect(),
        }
    }

    // ========================================================================
    // INVARIANTS
    // ========================================================================

    /// Broken invariants, empty when the state is consistent
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = FxHashSet::default();
        let mut on_board = 0;

        for piece in self.board.pieces() {
            match (piece.pos, piece.respawn_countdown) {
                (Some(sq), None) => {
                    on_board += 1;
                    if !seen.insert(sq) {
                        problems.push(format!("two pieces on {}", sq));
                    }
                    if self.board.piece_at(sq).map(|p| p.id) != Some(piece.id) {
                        problems.push(format!("index out of sync for {}", piece.label()));
                    }
                }
                (None, Some(n)) if n > 0 => {}
                _ => problems.push(format!(
                    "{} has pos {:?} and countdown {:?}",
                    piece.label(),
                    piece.pos,
                    piece.respawn_countdown
                )),
            }

            if piece.is_flagbearer
                && self.flags.get(piece.team.opponent()).carried_by != Some(piece.id)
            {
                problems.push(format!("{} bears no flag", piece.label()));
            }
        }

        if self.board.occupied_count() != on_board {
            problems.push(format!(
                "index holds {} squares, {} pieces on board",
                self.board.occupied_count(),
                on_board
            ));
        }

        for team in Team::ALL {
            let flag = self.flags.get(team);
            match (flag.is_captured, flag.carried_by) {
                (false, None) => {}
                (true, Some(id)) => {
                    let valid = self.board.piece(id).is_some_and(|p| {
                        p.team == team.opponent() && p.pos.is_some() && p.is_flagbearer
                    });
                    if !valid {
                        problems.push(format!("{} flag carried by invalid piece {}", team, id));
                    }
                }
                _ => problems.push(format!("{} flag capture state out of sync", team)),
            }
        }

        problems
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::pieces::{PieceKind, RESPAWN_TURNS};
    use crate::setup::PieceSetup;

    fn hot_seat(setup: Setup) -> GameState {
        GameState::new(&setup, GameConfig::hot_seat()).unwrap()
    }

    fn assert_consistent(state: &GameState) {
        let problems = state.invariant_violations();
        assert!(problems.is_empty(), "invariants broken: {:?}", problems);
    }

    #[test]
    fn test_game_creation() {
        let game = GameState::standard(GameConfig::default());
        assert_eq!(game.current_team(), Team::Blue);
        assert_eq!(game.turn_number(), 1);
        assert_eq!(game.winner(), None);
        assert_eq!(game.knight_selection(), KnightSelection::Idle);
        assert_consistent(&game);
    }

    #[test]
    fn test_simple_forward_move() {
        let mut game = GameState::standard(GameConfig::hot_seat());
        let pawn = game.board().piece_at(Square::new(1, 3)).unwrap().id;
        let events = game.apply_move(pawn, Square::new(2, 3)).unwrap();

        assert_eq!(
            events,
            vec![GameEvent::Moved {
                piece: pawn,
                from: Square::new(1, 3),
                to: Square::new(2, 3)
            }]
        );
        assert_eq!(game.board().piece(pawn).unwrap().pos, Some(Square::new(2, 3)));
        assert!(game.has_acted(pawn));
        assert_consistent(&game);
    }

    #[test]
    fn test_piece_acts_once_per_turn() {
        let mut game = GameState::standard(GameConfig::hot_seat());
        let pawn = game.board().piece_at(Square::new(1, 3)).unwrap().id;
        game.apply_move(pawn, Square::new(2, 3)).unwrap();
        let err = game.apply_move(pawn, Square::new(3, 3)).unwrap_err();
        assert_eq!(err, RuleError::IllegalMove(IllegalMove::AlreadyActed(pawn)));
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let mut game = GameState::standard(GameConfig::hot_seat());
        let before = game.snapshot();

        let pawn = game.board().piece_at(Square::new(1, 3)).unwrap().id;
        assert!(game.apply_move(pawn, Square::new(3, 3)).is_err());
        let red = game.board().piece_at(Square::new(6, 3)).unwrap().id;
        assert_eq!(
            game.apply_move(red, Square::new(5, 3)).unwrap_err(),
            RuleError::IllegalMove(IllegalMove::NotYourTurn(Team::Red))
        );
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_capture_benches_target() {
        let mut game = hot_seat(
            Setup::empty("capture")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(4, 4)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 1)).at(Square::new(5, 4))),
        );
        let events = game.apply_move(0, Square::new(5, 4)).unwrap();

        let victim = game.board().piece(1).unwrap();
        assert_eq!(victim.pos, None);
        assert_eq!(victim.respawn_countdown, Some(RESPAWN_TURNS));
        assert_eq!(events[0], GameEvent::Captured { piece: 1, by: 0, at: Square::new(5, 4) });
        assert_consistent(&game);
    }

    #[test]
    fn test_capturing_carrier_frees_flag() {
        // Red carries Blue's flag; Blue knocks the carrier out
        let mut game = hot_seat(
            Setup::empty("free flag")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(3, 3)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 1)).at(Square::new(4, 3)).flagbearer()),
        );
        assert!(game.flags().get(Team::Blue).is_captured);

        let events = game.apply_move(0, Square::new(4, 3)).unwrap();
        assert!(events.contains(&GameEvent::FlagReturned { flag: Team::Blue }));
        let flag = game.flags().get(Team::Blue);
        assert!(!flag.is_captured);
        assert_eq!(flag.carried_by, None);
        assert_eq!(flag.home, Square::new(0, 3));
        assert!(!game.board().piece(1).unwrap().is_flagbearer);
        assert_consistent(&game);
    }

    #[test]
    fn test_flag_pickup_opens_selection_for_human_defender() {
        let mut game = hot_seat(
            Setup::empty("pickup")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(6, 3)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 0)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 6))),
        );
        let events = game.apply_move(0, Square::new(7, 3)).unwrap();

        assert!(events.contains(&GameEvent::FlagPickedUp { flag: Team::Red, by: 0 }));
        assert!(events.contains(&GameEvent::KnightSelectionRequired { team: Team::Red, remaining: 2 }));
        assert_eq!(game.flags().get(Team::Red).carried_by, Some(0));
        assert!(game.board().piece(0).unwrap().is_flagbearer);
        assert_eq!(
            game.knight_selection(),
            KnightSelection::Awaiting { team: Team::Red, remaining: 2 }
        );
        assert_consistent(&game);
    }

    #[test]
    fn test_flag_pickup_auto_promotes_scripted_defender() {
        let config = GameConfig::hot_seat().with_controller(Team::Red, Controller::Scripted);
        let setup = Setup::empty("auto knights")
            .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(6, 3)))
            .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 0)))
            .with_piece(PieceSetup::new(Team::Red, PieceKind::Major, Square::new(7, 5)))
            .with_piece(PieceSetup::new(Team::Red, PieceKind::Major, Square::new(7, 1)));
        let mut game = GameState::new(&setup, config).unwrap();

        let events = game.apply_move(0, Square::new(7, 3)).unwrap();
        assert_eq!(game.knight_selection(), KnightSelection::Idle);
        // (7,5) and (7,1) are both 2 away; (6,0) is farther
        assert!(events.contains(&GameEvent::KnightPromoted { piece: 2, team: Team::Red }));
        assert!(events.contains(&GameEvent::KnightPromoted { piece: 3, team: Team::Red }));
        assert!(!game.board().piece(1).unwrap().is_knight);
    }

    #[test]
    fn test_no_pickup_while_flag_captured() {
        let mut game = hot_seat(
            Setup::empty("no double pickup")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(5, 5)).flagbearer())
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 2)).at(Square::new(6, 3))),
        );
        let events = game.apply_move(1, Square::new(7, 3)).unwrap();
        assert_eq!(events.len(), 1);
        assert!(!game.board().piece(1).unwrap().is_flagbearer);
        assert_eq!(game.flags().get(Team::Red).carried_by, Some(0));
    }

    #[test]
    fn test_selection_blocks_defender_moves() {
        let mut game = hot_seat(
            Setup::empty("blocked")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(6, 3)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 0)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 6))),
        );
        game.apply_move(0, Square::new(7, 3)).unwrap();
        game.end_turn().unwrap();

        assert_eq!(
            game.apply_move(1, Square::new(5, 0)).unwrap_err(),
            RuleError::IllegalMove(IllegalMove::SelectionPending { team: Team::Red })
        );

        game.select_knight(1).unwrap();
        assert_eq!(
            game.select_knight(1).unwrap_err(),
            RuleError::InvalidSelection(InvalidSelection::AlreadyKnight(1))
        );
        assert_eq!(
            game.select_knight(0).unwrap_err(),
            RuleError::InvalidSelection(InvalidSelection::WrongTeam(0))
        );
        let events = game.select_knight(2).unwrap();
        assert!(events.contains(&GameEvent::KnightSelectionResolved { team: Team::Red }));
        assert_eq!(game.knight_selection(), KnightSelection::Idle);

        // Knights now step backward too
        game.apply_move(1, Square::new(7, 0)).unwrap();
        assert_eq!(
            game.select_knight(2).unwrap_err(),
            RuleError::InvalidSelection(InvalidSelection::NotOpen)
        );
    }

    #[test]
    fn test_selection_capped_by_eligible_pieces() {
        let mut game = hot_seat(
            Setup::empty("one defender")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(6, 3)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 0))),
        );
        game.apply_move(0, Square::new(7, 3)).unwrap();
        assert_eq!(
            game.knight_selection(),
            KnightSelection::Awaiting { team: Team::Red, remaining: 1 }
        );
    }

    #[test]
    fn test_win_on_reaching_own_side() {
        let mut game = hot_seat(
            Setup::empty("win")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(2, 4)).flagbearer())
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 2)).at(Square::new(4, 4))),
        );
        let events = game.apply_move(0, Square::new(1, 4)).unwrap();
        assert_eq!(events.last(), Some(&GameEvent::WinnerDecided { team: Team::Blue }));
        assert_eq!(game.winner(), Some(Team::Blue));

        assert_eq!(
            game.apply_move(1, Square::new(5, 4)).unwrap_err(),
            RuleError::IllegalMove(IllegalMove::GameOver)
        );
        assert_eq!(game.end_turn().unwrap_err(), RuleError::IllegalMove(IllegalMove::GameOver));
    }

    #[test]
    fn test_pass_flag() {
        let mut game = hot_seat(
            Setup::empty("pass")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(4, 4)).flagbearer())
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 2)).at(Square::new(3, 3)))
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 3)).at(Square::new(3, 5))),
        );

        assert_eq!(
            game.apply_pass(1, 0).unwrap_err(),
            RuleError::InvalidPass(InvalidPass::NotCarrying(1))
        );

        let events = game.apply_pass(0, 1).unwrap();
        assert_eq!(events, vec![GameEvent::FlagPassed { flag: Team::Red, from: 0, to: 1 }]);
        assert!(!game.board().piece(0).unwrap().is_flagbearer);
        assert!(game.board().piece(1).unwrap().is_flagbearer);
        assert_eq!(game.flags().get(Team::Red).carried_by, Some(1));
        assert!(game.has_acted(0));
        assert!(!game.has_acted(1));
        assert_consistent(&game);

        // One pass per turn, and the passer is frozen
        assert_eq!(
            game.apply_pass(1, 2).unwrap_err(),
            RuleError::InvalidPass(InvalidPass::AlreadyUsed)
        );
        assert!(game.legal_destinations(0).is_empty());

        // Receiver may still move, now in any direction
        game.apply_move(1, Square::new(2, 3)).unwrap();
        assert_consistent(&game);
    }

    #[test]
    fn test_pass_needs_adjacent_teammate() {
        let mut game = hot_seat(
            Setup::empty("far")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(4, 4)).flagbearer())
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 2)).at(Square::new(2, 2)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 2)).at(Square::new(5, 5))),
        );
        assert_eq!(
            game.apply_pass(0, 1).unwrap_err(),
            RuleError::InvalidPass(InvalidPass::NotAdjacent { from: 0, to: 1 })
        );
        assert_eq!(
            game.apply_pass(0, 2).unwrap_err(),
            RuleError::InvalidPass(InvalidPass::BadReceiver(2))
        );
        assert_eq!(
            game.apply_pass(0, 0).unwrap_err(),
            RuleError::InvalidPass(InvalidPass::BadReceiver(0))
        );
    }

    #[test]
    fn test_respawn_after_two_own_turns() {
        let mut game = hot_seat(
            Setup::empty("respawn")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(4, 4)))
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 1)).at(Square::new(5, 4))),
        );
        game.apply_move(0, Square::new(5, 4)).unwrap();

        game.end_turn().unwrap(); // Red turn 2
        let victim = game.board().piece(1).unwrap();
        assert_eq!(victim.pos, None);
        assert_eq!(victim.respawn_countdown, Some(1));

        game.end_turn().unwrap(); // Blue turn 3
        assert_eq!(game.board().piece(1).unwrap().respawn_countdown, Some(1));

        let events = game.end_turn().unwrap(); // Red turn 4
        assert!(events.contains(&GameEvent::Respawned { piece: 1, at: Square::new(6, 1) }));
        let back = game.board().piece(1).unwrap();
        assert_eq!(back.pos, Some(Square::new(6, 1)));
        assert_eq!(back.respawn_countdown, None);
        assert_consistent(&game);
    }

    #[test]
    fn test_blocked_respawn_retries_every_turn() {
        let mut game = hot_seat(
            Setup::empty("blocked respawn")
                .with_piece(PieceSetup::new(Team::Red, PieceKind::Pawn, Square::new(6, 1)).benched())
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(6, 1))),
        );

        game.end_turn().unwrap(); // Red: 2 -> 1
        game.end_turn().unwrap();
        let events = game.end_turn().unwrap(); // Red: blocked
        assert!(events.contains(&GameEvent::RespawnBlocked { piece: 0 }));
        assert_eq!(game.board().piece(0).unwrap().respawn_countdown, Some(RESPAWN_RETRY_TURNS));

        // Clear the origin on Blue's turn
        game.end_turn().unwrap();
        game.apply_move(1, Square::new(7, 1)).unwrap();
        let events = game.end_turn().unwrap();
        assert!(events.contains(&GameEvent::Respawned { piece: 0, at: Square::new(6, 1) }));
        assert_consistent(&game);
    }

    #[test]
    fn test_end_turn_resets_turn_state() {
        let mut game = hot_seat(
            Setup::empty("reset")
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 1)).at(Square::new(4, 4)).flagbearer())
                .with_piece(PieceSetup::new(Team::Blue, PieceKind::Pawn, Square::new(1, 2)).at(Square::new(4, 3))),
        );
        game.apply_pass(0, 1).unwrap();
        let events = game.end_turn().unwrap();
        assert_eq!(events[0], GameEvent::TurnEnded { team: Team::Blue, turn_number: 1 });
        assert_eq!(events[1], GameEvent::TurnStarted { team: Team::Red, turn_number: 2 });
        assert!(game.moved_this_turn().is_empty());
        assert!(!game.used_pass_this_turn());
        assert_eq!(game.current_team(), Team::Red);
    }

    #[test]
    fn test_invariant_check_detects_desync() {
        let mut game = GameState::standard(GameConfig::hot_seat());
        game.board_mut().piece_mut(0).unwrap().is_flagbearer = true;
        assert!(!game.invariant_violations().is_empty());
    }
}
