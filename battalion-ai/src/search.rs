//! Search strategies over any game tree
//!
//! Level 4 - Decision making

use crate::error::AiError;
use crate::tree::{GameTree, TreePosition, ValueFunction};

// ============================================================================
// GREEDY
// ============================================================================

/// One-ply search: the action whose result scores best
pub struct Greedy<G, V> {
    game: G,
    value: V,
}

impl<G: GameTree, V: ValueFunction<G>> Greedy<G, V> {
    pub fn new(game: G, value: V) -> Self {
        Self { game, value }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Best action for the side to move, `None` when no action beats
    /// leaving the position as it is
    pub fn choose_action(&self, position: &G::Position) -> Result<Option<G::Action>, G::Error> {
        let us = position.turn();
        let mut best_eval = self.value.evaluate(position, us)?;
        let mut best_action = None;

        for action in position.available_actions() {
            let child = self.game.apply(position, &action)?;
            let eval = self.value.evaluate_action(position, &action, &child, us)?;
            if eval > best_eval {
                best_eval = eval;
                best_action = Some(action);
            }
        }
        Ok(best_action)
    }
}

// ============================================================================
// MINIMAX WITH ALPHA-BETA
// ============================================================================

/// Depth-limited minimax with alpha-beta pruning.
///
/// Depth counts actions, not turns: a side plays several actions per turn.
pub struct MiniMaxAlphaBeta<G, V> {
    game: G,
    value: V,
    max_depth: u32,
    legacy_bounds: bool,
}

impl<G: GameTree, V: ValueFunction<G>> MiniMaxAlphaBeta<G, V> {
    pub fn new(game: G, value: V, max_depth: u32) -> Result<Self, AiError> {
        if max_depth == 0 {
            return Err(AiError::InvalidDepth(max_depth));
        }
        Ok(Self {
            game,
            value,
            max_depth,
            legacy_bounds: false,
        })
    }

    /// Start the root with alpha and beta both at `f64::MAX`.
    ///
    /// Enemy replies are then cut after their first child, so the choice can
    /// differ from plain minimax.
    pub fn with_legacy_bounds(mut self) -> Self {
        self.legacy_bounds = true;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Best action for the side to move, `None` when nothing improves on the
    /// static evaluation
    pub fn choose_action(&self, position: &G::Position) -> Result<Option<G::Action>, G::Error> {
        let us = position.turn();
        let (mut alpha, beta) = if self.legacy_bounds {
            (f64::MAX, f64::MAX)
        } else {
            (-f64::MAX, f64::MAX)
        };

        let mut best_eval = self.value.evaluate(position, us)?;
        let mut best_action = None;

        for action in position.available_actions() {
            let child = self.game.apply(position, &action)?;
            let val = self.search(&child, 1, alpha, beta, us)?;
            if val > best_eval {
                best_eval = val;
                best_action = Some(action);
            }
            alpha = alpha.max(val);
        }
        Ok(best_action)
    }

    /// Minimax value of `position` for `us` within `(alpha, beta)`.
    ///
    /// A position where the side to move has no action is scored statically
    /// instead of folding an empty set of children to an extreme value.
    fn search(
        &self,
        position: &G::Position,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        us: usize,
    ) -> Result<f64, G::Error> {
        if depth >= self.max_depth || position.is_terminal() {
            return self.value.evaluate(position, us);
        }
        let actions = position.available_actions();
        if actions.is_empty() {
            return self.value.evaluate(position, us);
        }

        if position.turn() == us {
            let mut val = -f64::MAX;
            for action in actions {
                let child = self.game.apply(position, &action)?;
                val = val.max(self.search(&child, depth + 1, alpha, beta, us)?);
                if val > beta {
                    break;
                }
                alpha = alpha.max(val);
            }
            Ok(val)
        } else {
            let mut val = f64::MAX;
            for action in actions {
                let child = self.game.apply(position, &action)?;
                val = val.min(self.search(&child, depth + 1, alpha, beta, us)?);
                if val < alpha {
                    break;
                }
                beta = beta.min(val);
            }
            Ok(val)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
