//! Match command - scripted AI against a random player
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_setup(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use flagcheckers_core::{
    Controller, Game, GameConfig, RandomPlayer, ScriptedDriver, Setup, Team,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Setup JSON file (standard layout if omitted)
    #[arg(long, value_name = "FILE")]
    pub setup: Option<PathBuf>,

    /// Number of games to play (scripted side alternates)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Maximum turns per game before calling it a draw
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    scripted: Team,
    winner: Option<Team>,
    turns: u32,
    actions: usize,
}

impl GameRecord {
    fn scripted_won(&self) -> bool {
        self.winner == Some(self.scripted)
    }

    fn random_won(&self) -> bool {
        self.winner == Some(self.scripted.opponent())
    }
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    scripted_wins: usize,
    random_wins: usize,
    draws: usize,
    avg_turns: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Load the setup
/// 2. Play the match (multiple games)
/// 3. Report results
pub fn run(args: MatchArgs, config: GameConfig, seed: Option<u64>) -> Result<()> {
    let setup = load_setup(&args)?;

    tracing::info!(
        "Starting match on '{}': {} games, max {} turns",
        setup.name,
        args.games,
        args.max_turns
    );

    let results = play_match(&setup, &config, &args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_setup(args: &MatchArgs) -> Result<Setup> {
    match &args.setup {
        Some(path) => Setup::load(path)
            .with_context(|| format!("Failed to load setup: {}", path.display())),
        None => Ok(Setup::standard()),
    }
}

/// Play all games in the match
fn play_match(
    setup: &Setup,
    config: &GameConfig,
    args: &MatchArgs,
    seed: Option<u64>,
) -> Result<MatchResults> {
    let mut rng = create_rng(seed);
    let mut games = Vec::with_capacity(args.games);

    for game_num in 0..args.games {
        // Alternate sides for fairness
        let scripted = if game_num % 2 == 0 { Team::Blue } else { Team::Red };

        let record = play_single_game(setup, config, scripted, game_num + 1, args, &mut rng)?;

        tracing::info!(
            "Game {}: {} ({} turns, scripted {})",
            record.game_number,
            describe_winner(&record),
            record.turns,
            record.scripted
        );

        games.push(record);
    }

    Ok(compute_match_statistics(games))
}

/// Report match results
fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game; the random side reseeds from the match rng
fn play_single_game(
    setup: &Setup,
    config: &GameConfig,
    scripted: Team,
    game_number: usize,
    args: &MatchArgs,
    rng: &mut ChaCha8Rng,
) -> Result<GameRecord> {
    // The random side picks its own knights, so it is driven as Human
    let config = config
        .clone()
        .with_controller(scripted, Controller::Scripted)
        .with_controller(scripted.opponent(), Controller::Human);
    let mut game = Game::new(setup, config)?;

    let driver = ScriptedDriver::from_config(game.state().config());
    let mut random = RandomPlayer::with_seed(driver.action_cap, rng.gen());
    let mut actions = 0;

    while !game.state().is_over() && game.state().turn_number() <= args.max_turns {
        let report = if game.state().current_team() == scripted {
            driver.play_turn(&mut game)
        } else {
            random.play_turn(&mut game)
        };
        actions += report.actions.len();

        let violations = game.state().invariant_violations();
        if !violations.is_empty() {
            anyhow::bail!("Game {} broke invariants: {}", game_number, violations.join("; "));
        }
    }

    Ok(GameRecord {
        game_number,
        scripted,
        winner: game.state().winner(),
        turns: game.state().turn_number(),
        actions,
    })
}

/// Compute aggregate statistics from game records
fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let scripted_wins = games.iter().filter(|g| g.scripted_won()).count();
    let random_wins = games.iter().filter(|g| g.random_won()).count();
    let draws = games.iter().filter(|g| g.winner.is_none()).count();

    let total_turns: u32 = games.iter().map(|g| g.turns).sum();
    let avg_turns = if games.is_empty() {
        0.0
    } else {
        total_turns as f32 / games.len() as f32
    };

    MatchResults {
        games,
        scripted_wins,
        random_wins,
        draws,
        avg_turns,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn describe_winner(record: &GameRecord) -> String {
    match record.winner {
        Some(team) if team == record.scripted => format!("{} (scripted) wins", team),
        Some(team) => format!("{} (random) wins", team),
        None => "draw".to_string(),
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        scripted: Team,
        winner: Option<Team>,
        turns: u32,
        actions: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        scripted_wins: usize,
        random_wins: usize,
        draws: usize,
        avg_turns: f32,
        scripted_win_rate: f32,
        games: Vec<JsonGame>,
    }

    let total = results.games.len();
    let output = JsonOutput {
        total_games: total,
        scripted_wins: results.scripted_wins,
        random_wins: results.random_wins,
        draws: results.draws,
        avg_turns: results.avg_turns,
        scripted_win_rate: percent(results.scripted_wins, total) / 100.0,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                scripted: g.scripted,
                winner: g.winner,
                turns: g.turns,
                actions: g.actions,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("Total games:   {}", total);
    println!(
        "Scripted wins: {} ({:.1}%)",
        results.scripted_wins,
        percent(results.scripted_wins, total)
    );
    println!(
        "Random wins:   {} ({:.1}%)",
        results.random_wins,
        percent(results.random_wins, total)
    );
    println!(
        "Draws:         {} ({:.1}%)",
        results.draws,
        percent(results.draws, total)
    );
    println!("Avg turns:     {:.1}", results.avg_turns);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {} in {} turns ({} actions)",
            game.game_number,
            describe_winner(game),
            game.turns,
            game.actions
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
