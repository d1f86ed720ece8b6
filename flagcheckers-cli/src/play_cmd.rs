//! Play command - one human against the scripted side in the terminal
//!
//! ## Architecture
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_game(), game_loop()
//! - Level 3: human_turn(), scripted_turn(), handle_command()
//! - Level 4: command parsing and printing
//!
//! Stdin lines and turn-timer expiries arrive on one channel and are
//! processed one at a time, so the game only ever sees serialized actions.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use flagcheckers_core::ai::{ScriptedDriver, Step, StopReason};
use flagcheckers_core::{
    Controller, Game, GameConfig, GameEvent, GameListener, PieceId, Setup, Square, Team,
};

use crate::render;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Side {
    Blue,
    Red,
}

impl From<Side> for Team {
    fn from(side: Side) -> Team {
        match side {
            Side::Blue => Team::Blue,
            Side::Red => Team::Red,
        }
    }
}

#[derive(Args)]
pub struct PlayArgs {
    /// Side the human plays
    #[arg(long, value_enum, default_value = "red")]
    pub side: Side,

    /// Setup JSON file (standard layout if omitted)
    #[arg(long, value_name = "FILE")]
    pub setup: Option<PathBuf>,

    /// Override the turn clock (seconds)
    #[arg(long)]
    pub turn_seconds: Option<u32>,
}

/// Everything the game loop can be woken by
#[derive(Debug)]
enum Input {
    Line(String),
    TurnExpired(u32),
    Eof,
}

/// Parsed player command
#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Move(Square, Square),
    Pass(Square, Square),
    Knight(Square),
    Hints(Square),
    End,
    Board,
    Help,
    Quit,
}

/// Prints every event as it is published
struct Narrator;

impl GameListener for Narrator {
    fn on_event(&mut self, event: &GameEvent) {
        println!("  {}", render::event(event));
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs, config: GameConfig) -> Result<()> {
    let human = Team::from(args.side);
    let mut game = build_game(&args, config, human)?;

    tracing::info!(
        "Starting game: human plays {}, {}s per turn",
        human,
        game.state().config().turn_seconds
    );

    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx.clone());

    game_loop(&mut game, human, &tx, &rx);

    println!("{}", render::board(&game.snapshot()));
    println!("{}", render::status(&game.snapshot()));
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_game(args: &PlayArgs, config: GameConfig, human: Team) -> Result<Game> {
    let mut config = config
        .with_controller(human, Controller::Human)
        .with_controller(human.opponent(), Controller::Scripted);
    if let Some(seconds) = args.turn_seconds {
        config = config.with_turn_seconds(seconds);
    }
    config.validate()?;

    let setup = match &args.setup {
        Some(path) => Setup::load(path)
            .with_context(|| format!("Failed to load setup: {}", path.display()))?,
        None => Setup::standard(),
    };

    let mut game = Game::new(&setup, config)?;
    game.subscribe(Box::new(Narrator));
    Ok(game)
}

/// Alternate turns until someone wins or the player quits
fn game_loop(game: &mut Game, human: Team, tx: &Sender<Input>, rx: &Receiver<Input>) {
    print_help();
    while !game.state().is_over() {
        if game.state().current_team() == human {
            println!("{}", render::board(&game.snapshot()));
            println!("{}", render::status(&game.snapshot()));
            if !human_turn(game, tx, rx) {
                tracing::info!("Player left the game");
                return;
            }
        } else {
            scripted_turn(game);
        }
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Process input until the human's turn ends; false when the player quits
fn human_turn(game: &mut Game, tx: &Sender<Input>, rx: &Receiver<Input>) -> bool {
    let turn_number = game.state().turn_number();
    spawn_turn_timer(tx.clone(), turn_number, game.state().config().turn_seconds);

    while !game.state().is_over() && game.state().turn_number() == turn_number {
        let Ok(input) = rx.recv() else {
            return false;
        };
        match input {
            Input::Line(line) => match parse_command(&line) {
                Ok(Command::Quit) => return false,
                Ok(command) => handle_command(game, command),
                Err(message) => println!("{}", message),
            },
            Input::TurnExpired(turn) => {
                if let Err(e) = game.expire_turn(turn) {
                    tracing::warn!("Timer could not end turn {}: {}", turn, e);
                }
            }
            Input::Eof => return false,
        }
    }
    true
}

/// Step the scripted side with a pause between actions
fn scripted_turn(game: &mut Game) {
    let delay = Duration::from_millis(game.state().config().ai_step_delay_ms);
    let driver = ScriptedDriver::from_config(game.state().config());
    let mut turn = driver.begin_turn(game);

    let stop = loop {
        match turn.step(game) {
            Step::Acted(_) => thread::sleep(delay),
            Step::Stopped(reason) => break reason,
        }
    };

    if matches!(stop, StopReason::Exhausted | StopReason::ActionCap) {
        if let Err(e) = game.end_turn_now() {
            tracing::warn!("Scripted {} could not end turn: {}", turn.team(), e);
        }
    }
}

fn handle_command(game: &mut Game, command: Command) {
    let result = match command {
        Command::Move(from, to) => match piece_id_at(game, from) {
            Some(id) => game.submit_move(id, to).map(|_| ()),
            None => return println!("No piece on {}", from),
        },
        Command::Pass(from, to) => match (piece_id_at(game, from), piece_id_at(game, to)) {
            (Some(a), Some(b)) => game.submit_pass(a, b).map(|_| ()),
            _ => return println!("Pass needs a piece on both squares"),
        },
        Command::Knight(square) => match piece_id_at(game, square) {
            Some(id) => game.submit_knight_selection(id).map(|_| ()),
            None => return println!("No piece on {}", square),
        },
        Command::Hints(square) => {
            match piece_id_at(game, square) {
                Some(id) => {
                    let hints: Vec<String> = game
                        .legal_destinations(id)
                        .iter()
                        .map(|sq| sq.to_string())
                        .collect();
                    println!("{}", if hints.is_empty() { "none".to_string() } else { hints.join(" ") });
                }
                None => println!("No piece on {}", square),
            }
            return;
        }
        Command::End => game.end_turn_now().map(|_| ()),
        Command::Board => {
            println!("{}", render::board(&game.snapshot()));
            println!("{}", render::status(&game.snapshot()));
            return;
        }
        Command::Help => return print_help(),
        Command::Quit => return,
    };

    if let Err(e) = result {
        println!("Rejected: {}", e);
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn spawn_stdin_reader(tx: Sender<Input>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Eof);
    });
}

/// Fire one expiry for `turn_number`; stale expiries are ignored by the game
fn spawn_turn_timer(tx: Sender<Input>, turn_number: u32, seconds: u32) {
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(u64::from(seconds)));
        let _ = tx.send(Input::TurnExpired(turn_number));
    });
}

fn piece_id_at(game: &Game, square: Square) -> Option<PieceId> {
    game.state().board().piece_at(square).map(|p| p.id)
}

fn parse_square(text: Option<&str>) -> Result<Square, String> {
    let text = text.ok_or("Missing square")?;
    Square::parse(text).ok_or_else(|| format!("Bad square '{}' (use r,c or d2)", text))
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("Type 'help' for commands".to_string());
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "move" | "m" => Command::Move(parse_square(words.next())?, parse_square(words.next())?),
        "pass" | "p" => Command::Pass(parse_square(words.next())?, parse_square(words.next())?),
        "knight" | "k" => Command::Knight(parse_square(words.next())?),
        "hints" | "h" => Command::Hints(parse_square(words.next())?),
        "end" | "e" => Command::End,
        "board" | "b" => Command::Board,
        "help" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{}'", other)),
    };
    Ok(command)
}

fn print_help() {
    println!("Commands:");
    println!("  move <from> <to>   move a piece (squares as r,c or d2)");
    println!("  pass <from> <to>   hand the flag to an adjacent teammate");
    println!("  knight <sq>        crown a knight while a selection is open");
    println!("  hints <sq>         list legal destinations");
    println!("  end                end your turn");
    println!("  board | help | quit");
}

// ============================================================================
// TESTS
// ============================================================================
