//! Game-tree contracts shared by the search strategies
//!
//! Level 1 - Abstractions, no game knowledge

/// A position in the game tree
pub trait TreePosition {
    type Action;

    /// No further play is possible
    fn is_terminal(&self) -> bool;

    /// Index of the player to move, in `0..number_of_players`
    fn turn(&self) -> usize;

    /// Every legal action of the player to move, empty when terminal
    fn available_actions(&self) -> Vec<Self::Action>;
}

/// A game: how positions relate through actions
pub trait GameTree {
    type Action: Clone;
    type Position: TreePosition<Action = Self::Action>;
    type Error;

    fn number_of_players(&self) -> usize;

    /// The position reached by playing `action`. `position` is left untouched.
    fn apply(&self, position: &Self::Position, action: &Self::Action) -> Result<Self::Position, Self::Error>;
}

/// Scores positions and candidate actions for a given player
pub trait ValueFunction<G: GameTree> {
    /// Static score of `position` from `us`'s perspective, higher is better
    fn evaluate(&self, position: &G::Position, us: usize) -> Result<f64, G::Error>;

    /// Score of `position`, the result of playing `action` from `history`
    fn evaluate_action(
        &self,
        history: &G::Position,
        action: &G::Action,
        position: &G::Position,
        us: usize,
    ) -> Result<f64, G::Error>;
}
