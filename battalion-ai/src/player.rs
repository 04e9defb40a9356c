//! Computer players
//!
//! Level 5 - Playing turns

use std::time::Instant;

use battalion_core::{Action, Cell, Game};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::actions::{BattalionTree, Node};
use crate::error::AiError;
use crate::eval::BattalionValue;
use crate::search::{Greedy, MiniMaxAlphaBeta};

/// Upper bound on actions one player may take in a single turn
pub const MAX_ACTIONS_PER_TURN: usize = 500;

/// A computer player picks one action at a time for the side to move
pub trait Player {
    fn name(&self) -> &str;

    /// Next action, `None` to end the turn
    fn choose_action(&mut self, game: &Game) -> Result<Option<Action>, AiError>;
}

// ============================================================================
// SEARCH PLAYERS
// ============================================================================

/// Plays the action with the best one-ply score
pub struct GreedyPlayer {
    search: Greedy<BattalionTree, BattalionValue>,
}

impl GreedyPlayer {
    pub fn new(value: BattalionValue) -> Self {
        Self {
            search: Greedy::new(BattalionTree, value),
        }
    }
}

impl Player for GreedyPlayer {
    fn name(&self) -> &str {
        "greedy"
    }

    fn choose_action(&mut self, game: &Game) -> Result<Option<Action>, AiError> {
        let start = Instant::now();
        let action = self.search.choose_action(&Node::new(game.clone()))?;
        tracing::debug!(
            player = self.name(),
            action = ?action,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "decision"
        );
        Ok(action)
    }
}

/// Plays the action with the best alpha-beta score
pub struct MiniMaxPlayer {
    search: MiniMaxAlphaBeta<BattalionTree, BattalionValue>,
}

impl MiniMaxPlayer {
    pub const DEFAULT_DEPTH: u32 = 2;

    pub fn new(value: BattalionValue, depth: u32) -> Result<Self, AiError> {
        Ok(Self {
            search: MiniMaxAlphaBeta::new(BattalionTree, value, depth)?,
        })
    }

    pub fn with_legacy_bounds(self) -> Self {
        Self {
            search: self.search.with_legacy_bounds(),
        }
    }

    pub fn depth(&self) -> u32 {
        self.search.max_depth()
    }
}

impl Player for MiniMaxPlayer {
    fn name(&self) -> &str {
        "minimax"
    }

    fn choose_action(&mut self, game: &Game) -> Result<Option<Action>, AiError> {
        let start = Instant::now();
        let action = self.search.choose_action(&Node::new(game.clone()))?;
        tracing::debug!(
            player = self.name(),
            depth = self.depth(),
            action = ?action,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "decision"
        );
        Ok(action)
    }
}

// ============================================================================
// RANDOM PLAYER
// ============================================================================

/// Moves a random active unit to a random reachable cell
pub struct RandomPlayer {
    rng: ChaCha8Rng,
}

impl RandomPlayer {
    /// Seeded for reproducible games, from entropy otherwise
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }
}

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&mut self, game: &Game) -> Result<Option<Action>, AiError> {
        if game.is_finished() {
            return Ok(None);
        }
        let movable: Vec<(Cell, Vec<Cell>)> = game
            .units_of(game.turn())
            .filter(|(_, u)| u.active)
            .map(|(cell, _)| {
                let destinations: Vec<Cell> = game.reachable_map(cell).cells().filter(|&d| d != cell).collect();
                (cell, destinations)
            })
            .filter(|(_, destinations)| !destinations.is_empty())
            .collect();

        let Some((unit, destinations)) = movable.choose(&mut self.rng) else {
            return Ok(None);
        };
        let Some(&destination) = destinations.choose(&mut self.rng) else {
            return Ok(None);
        };
        Ok(game
            .calc_path(*unit, destination)
            .map(|path| Action::Move { unit: *unit, path }))
    }
}

// ============================================================================
// TURN DRIVER
// ============================================================================

/// Let `player` act until it passes, then end the turn.
///
/// Every applied action, `EndTurn` included, is reported to `on_action`.
/// Returns the number of actions before `EndTurn`. No `EndTurn` is played once
/// the game is finished.
pub fn play_turn(
    player: &mut dyn Player,
    game: &mut Game,
    mut on_action: impl FnMut(&Action),
) -> Result<usize, AiError> {
    let team = game.turn();
    let start = Instant::now();
    let mut count = 0;

    while count < MAX_ACTIONS_PER_TURN && !game.is_finished() {
        let Some(action) = player.choose_action(game)? else {
            break;
        };
        game.perform_action(&action)?;
        on_action(&action);
        count += 1;
    }

    if !game.is_finished() {
        game.perform_action(&Action::EndTurn)?;
        on_action(&Action::EndTurn);
    }

    tracing::debug!(
        player = player.name(),
        team = %team,
        actions = count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "turn played"
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;
    use battalion_core::{Level, Team, Terrain, TerrainMap, Unit, UnitType};

    fn c(x: i16, y: i16) -> Cell {
        Cell::new(x, y)
    }

    /// Red soldier two cells away from a Blue soldier on its last health point
    fn weak_enemy() -> Game {
        let mut weak = Unit::new(UnitType::Soldier, Team::Blue);
        weak.health = 1;
        Game::new(TerrainMap::filled(5, 1, Terrain::FlatLand), [0, 0])
            .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
            .with_unit(c(2, 0), weak)
    }

    fn kill() -> Action {
        Action::MoveAndAttack { unit: c(0, 0), path: vec![c(1, 0)], target: c(2, 0) }
    }

    #[test]
    fn test_greedy_takes_the_kill() {
        let mut player = AiConfig::greedy().build_player().unwrap();
        assert_eq!(player.choose_action(&weak_enemy()).unwrap(), Some(kill()));
    }

    #[test]
    fn test_minimax_takes_the_kill() {
        let mut player = AiConfig::minimax(2).build_player().unwrap();
        assert_eq!(player.choose_action(&weak_enemy()).unwrap(), Some(kill()));
    }

    #[test]
    fn test_play_turn_stops_when_game_ends() {
        let mut player = AiConfig::greedy().build_player().unwrap();
        let mut game = weak_enemy();
        let mut seen = Vec::new();
        let count = play_turn(player.as_mut(), &mut game, |a| seen.push(a.clone())).unwrap();

        assert_eq!(count, 1);
        assert_eq!(seen, vec![kill()]);
        assert_eq!(game.winner(), Some(Team::Red));
    }

    #[test]
    fn test_play_turn_ends_with_end_turn() {
        let mut player = RandomPlayer::new(Some(3));
        let mut game = Level::skirmish().to_game().unwrap();
        let mut seen = Vec::new();
        let count = play_turn(&mut player, &mut game, |a| seen.push(a.clone())).unwrap();

        // Every Red unit moves once
        assert_eq!(count, 3);
        assert_eq!(seen.last(), Some(&Action::EndTurn));
        assert_eq!(game.turn(), Team::Blue);
        assert_eq!(game.turns_played, 1);
    }

    #[test]
    fn test_random_player_is_reproducible() {
        let game = Level::skirmish().to_game().unwrap();
        let a = RandomPlayer::new(Some(11)).choose_action(&game).unwrap();
        let b = RandomPlayer::new(Some(11)).choose_action(&game).unwrap();
        assert_eq!(a, b);
        let Some(Action::Move { unit, path }) = a else {
            panic!("expected a move, got {:?}", a);
        };
        assert_eq!(game.unit(unit).map(|u| u.team), Some(Team::Red));
        assert!(path.last().is_some_and(|&d| game.reachable_map(unit).contains(d)));
    }

    #[test]
    fn test_random_player_passes_without_movable_units() {
        let game = Game::new(TerrainMap::filled(3, 1, Terrain::FlatLand), [0, 0])
            .with_unit(c(0, 0), Unit::new(UnitType::Turret, Team::Red))
            .with_unit(c(2, 0), Unit::new(UnitType::Soldier, Team::Blue));
        assert_eq!(RandomPlayer::new(Some(1)).choose_action(&game).unwrap(), None);
    }
}
