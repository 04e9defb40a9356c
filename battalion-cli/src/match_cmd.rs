//! Play command - one AI-vs-AI match on a level
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_level(), load_config(), build_players(), play_match(), report_results()
//! - Level 3: summarize()
//! - Level 4: formatting utilities

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use battalion_ai::{play_turn, AiConfig, Player, PlayerKind};
use battalion_core::{Game, Level, Team};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Level JSON file (built-in skirmish when omitted)
    #[arg(long, value_name = "FILE")]
    pub level: Option<PathBuf>,

    /// Red player: greedy, minimax or random
    #[arg(long, default_value = "minimax")]
    pub red: PlayerKind,

    /// Blue player: greedy, minimax or random
    #[arg(long, default_value = "greedy")]
    pub blue: PlayerKind,

    /// Minimax search depth, in actions
    #[arg(long)]
    pub depth: Option<u32>,

    /// Maximum turns before the match is called a draw (one side per turn)
    #[arg(long, default_value = "100")]
    pub max_turns: u32,

    /// AI config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of a match
#[derive(Clone, Debug, Serialize)]
struct MatchRecord {
    level: String,
    red: PlayerKind,
    blue: PlayerKind,
    /// `None` for a draw
    winner: Option<Team>,
    turns: u32,
    actions: [usize; 2],
    units_left: [usize; 2],
    money: [i32; 2],
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// 1. Load the level and the AI config
/// 2. Build both players
/// 3. Play until a winner or the turn limit
/// 4. Report results
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let level = load_level(args.level.as_deref())?;
    let config = load_config(args.config.as_deref(), args.depth, seed)?;
    let game = level
        .to_game()
        .with_context(|| format!("Failed to set up level {}", level.name))?;

    tracing::info!(
        "Starting match on {}: {} (red) vs {} (blue), max {} turns",
        level.name,
        args.red,
        args.blue,
        args.max_turns
    );

    let mut players = build_players(&config, [args.red, args.blue])?;
    let (game, actions) = play_match(game, &mut players, args.max_turns)?;
    let record = summarize(&level.name, [args.red, args.blue], &game, actions);

    report_results(&record, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Level from a file, or the built-in skirmish
pub fn load_level(path: Option<&Path>) -> Result<Level> {
    match path {
        Some(path) => Level::load(path),
        None => Ok(Level::skirmish()),
    }
}

/// AI config from a file or defaults, with command-line overrides
pub fn load_config(path: Option<&Path>, depth: Option<u32>, seed: Option<u64>) -> Result<AiConfig> {
    let mut config = match path {
        Some(path) => AiConfig::load(path)?,
        None => AiConfig::default(),
    };
    if let Some(depth) = depth {
        config.depth = depth;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config.validate().context("Invalid AI settings")?;
    Ok(config)
}

/// One player per team. Blue's seed is offset so both sides differ.
fn build_players(config: &AiConfig, kinds: [PlayerKind; 2]) -> Result<Vec<Box<dyn Player>>> {
    Team::ALL
        .iter()
        .map(|&team| {
            let config = AiConfig {
                player: kinds[team.index()],
                seed: config.seed.map(|s| s.wrapping_add(team.index() as u64)),
                ..config.clone()
            };
            config
                .build_player()
                .with_context(|| format!("Failed to build {} player", team))
        })
        .collect()
}

/// Alternate turns until the game is over or `max_turns` turns were played
fn play_match(mut game: Game, players: &mut [Box<dyn Player>], max_turns: u32) -> Result<(Game, [usize; 2])> {
    let mut actions = [0usize; 2];

    while !game.is_finished() && game.turns_played < max_turns {
        let team = game.turn();
        let count = play_turn(players[team.index()].as_mut(), &mut game, |action| {
            tracing::trace!(team = %team, action = %action, "action");
        })
        .with_context(|| format!("{} failed to play its turn", team))?;
        actions[team.index()] += count;
    }

    tracing::info!(
        "Match over after {} turns: {}",
        game.turns_played,
        winner_label(game.winner())
    );
    Ok((game, actions))
}

/// Report match results
fn report_results(record: &MatchRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print_text_results(record);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn summarize(level: &str, kinds: [PlayerKind; 2], game: &Game, actions: [usize; 2]) -> MatchRecord {
    MatchRecord {
        level: level.to_string(),
        red: kinds[0],
        blue: kinds[1],
        winner: game.winner(),
        turns: game.turns_played,
        actions,
        units_left: Team::ALL.map(|team| game.units_of(team).count()),
        money: Team::ALL.map(|team| game.money(team)),
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn winner_label(winner: Option<Team>) -> String {
    match winner {
        Some(team) => format!("{} wins", team),
        None => "draw".to_string(),
    }
}

fn print_text_results(record: &MatchRecord) {
    println!("\n=== Match Results ===");
    println!("Level:   {}", record.level);
    println!("Players: {} (red) vs {} (blue)", record.red, record.blue);
    println!("Result:  {}", winner_label(record.winner));
    println!("Turns:   {}", record.turns);
    for team in Team::ALL {
        let i = team.index();
        println!(
            "  {:<5} {} actions, {} units left, {} money",
            team.to_string(),
            record.actions[i],
            record.units_left[i],
            record.money[i]
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_overrides() {
        let config = load_config(None, Some(3), Some(42)).unwrap();
        assert_eq!(config.depth, 3);
        assert_eq!(config.seed, Some(42));
        assert!(load_config(None, Some(0), None).is_err());
    }

    #[test]
    fn test_default_level_is_skirmish() {
        let level = load_level(None).unwrap();
        assert_eq!(level.name, "skirmish");
        assert!(load_level(Some(Path::new("/nonexistent/level.json"))).is_err());
    }

    #[test]
    fn test_random_match_respects_turn_limit() {
        let config = load_config(None, None, Some(5)).unwrap();
        let mut players = build_players(&config, [PlayerKind::Random, PlayerKind::Random]).unwrap();
        let game = Level::skirmish().to_game().unwrap();
        let (game, actions) = play_match(game, &mut players, 6).unwrap();

        assert!(game.turns_played <= 6);
        assert!(game.is_finished() || game.turns_played == 6);
        assert!(actions[0] > 0);

        let record = summarize("skirmish", [PlayerKind::Random, PlayerKind::Random], &game, actions);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["red"], "random");
        assert_eq!(json["turns"], game.turns_played);
    }

    #[test]
    fn test_winner_label() {
        assert_eq!(winner_label(Some(Team::Blue)), "Blue wins");
        assert_eq!(winner_label(None), "draw");
    }
}
