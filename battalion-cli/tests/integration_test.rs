//! Integration tests for the Battalion computer players
//!
//! Tests the full stack: level loading, rules engine, evaluation, search and players

use battalion_ai::{available_actions, play_turn, AiConfig, Player, PlayerKind, RandomPlayer};
use battalion_core::{Action, Cell, Game, Level, Team, Terrain, TerrainMap, Unit, UnitType};
use std::path::PathBuf;
use std::time::Instant;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn c(x: i16, y: i16) -> Cell {
    Cell::new(x, y)
}

fn skirmish() -> Game {
    Level::skirmish().to_game().expect("built-in level is valid")
}

/// Play whole turns until the game ends or `max_turns` is reached
fn play_match(game: &mut Game, players: &mut [Box<dyn Player>; 2], max_turns: u32) {
    while !game.is_finished() && game.turns_played < max_turns {
        let player = &mut players[game.turn().index()];
        play_turn(player.as_mut(), game, |_| {}).expect("players only play legal actions");
    }
}

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("battalion-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// ENUMERATION
// ============================================================================

#[test]
fn test_every_enumerated_action_is_legal() {
    let mut game = skirmish();
    let mut random = RandomPlayer::new(Some(17));

    for _ in 0..6 {
        for action in available_actions(&game) {
            assert!(game.apply_action(&action).is_ok(), "illegal action {} offered", action);
        }
        play_turn(&mut random, &mut game, |_| {}).unwrap();
    }
}

#[test]
fn test_end_turn_is_never_enumerated() {
    let game = skirmish();
    let actions = available_actions(&game);
    assert!(!actions.is_empty());
    assert!(!actions.contains(&Action::EndTurn));
}

// ============================================================================
// PLAYERS
// ============================================================================

#[test]
fn test_greedy_finishes_off_weak_enemy() {
    let mut weak = Unit::new(UnitType::Tank, Team::Blue);
    weak.health = 1;
    let game = Game::new(TerrainMap::filled(8, 3, Terrain::FlatLand), [0, 0])
        .with_unit(c(0, 1), Unit::new(UnitType::Tank, Team::Red))
        .with_unit(c(5, 1), weak)
        .with_unit(c(7, 0), Unit::new(UnitType::Soldier, Team::Blue));

    let mut player = AiConfig::greedy().build_player().unwrap();
    let action = player.choose_action(&game).unwrap();
    assert!(
        matches!(action, Some(Action::MoveAndAttack { target, .. }) if target == c(5, 1)),
        "expected an attack on the weak tank, got {:?}",
        action
    );
}

#[test]
fn test_suggestion_on_skirmish_is_legal() {
    let game = skirmish();
    for config in [AiConfig::greedy(), AiConfig::minimax(2), AiConfig::random(1)] {
        let mut player = config.build_player().unwrap();
        if let Some(action) = player.choose_action(&game).unwrap() {
            assert!(game.apply_action(&action).is_ok());
        }
    }
}

#[test]
fn test_legacy_bounds_still_play_legal_actions() {
    let game = skirmish();
    let config = AiConfig {
        legacy_bounds: true,
        ..AiConfig::minimax(2)
    };
    let mut player = config.build_player().unwrap();
    if let Some(action) = player.choose_action(&game).unwrap() {
        assert!(game.apply_action(&action).is_ok());
    }
}

// ============================================================================
// FULL MATCHES
// ============================================================================

#[test]
fn test_greedy_vs_random_match() {
    let mut game = skirmish();
    let mut players: [Box<dyn Player>; 2] = [
        AiConfig::greedy().build_player().unwrap(),
        AiConfig::random(3).build_player().unwrap(),
    ];

    let start = Instant::now();
    play_match(&mut game, &mut players, 20);
    println!("20 turns in {:?}, winner {:?}", start.elapsed(), game.winner());

    assert!(game.is_finished() || game.turns_played == 20);
    assert!(game.is_team_alive(Team::Red) || game.is_team_alive(Team::Blue));
}

#[test]
fn test_minimax_vs_greedy_match() {
    let mut game = skirmish();
    let mut players: [Box<dyn Player>; 2] = [
        AiConfig::minimax(2).build_player().unwrap(),
        AiConfig::greedy().build_player().unwrap(),
    ];
    play_match(&mut game, &mut players, 6);

    assert!(game.is_finished() || game.turns_played == 6);
    if !game.is_finished() {
        assert_eq!(game.turn(), Team::Red);
    }
}

#[test]
fn test_random_matches_are_reproducible() {
    let run = || {
        let mut game = skirmish();
        let mut players: [Box<dyn Player>; 2] = [
            AiConfig::random(8).build_player().unwrap(),
            AiConfig::random(9).build_player().unwrap(),
        ];
        play_match(&mut game, &mut players, 10);
        game
    };
    assert_eq!(run(), run());
}

// ============================================================================
// FILES
// ============================================================================

#[test]
fn test_level_file_round_trip() {
    let level = Level::skirmish();
    let path = std::env::temp_dir().join(format!("battalion-{}-level.json", std::process::id()));
    level.save(&path).unwrap();

    let loaded = Level::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded.to_game().unwrap(), level.to_game().unwrap());
}

#[test]
fn test_bad_level_file_is_rejected() {
    let path = temp_file(
        "bad-level.json",
        r#"{"width": 2, "height": 1, "terrain": [".?"], "units": [], "buildings": [], "money": [0, 0]}"#,
    );
    let result = Level::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}

#[test]
fn test_config_file() {
    let path = temp_file("config.json", r#"{"player": "greedy", "aggression": 0.7, "seed": 5}"#);
    let config = AiConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.player, PlayerKind::Greedy);
    assert_eq!(config.aggression, 0.7);
    assert!(config.build_player().is_ok());

    let path = temp_file("bad-config.json", r#"{"aggression": 2.0}"#);
    let result = AiConfig::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}
