//! Battalion AI - Computer players for Battalion
//!
//! This crate provides:
//! - Game-tree contracts and two strategies (Greedy, MiniMax with alpha-beta)
//! - Position evaluation folded by aggression
//! - Transport-aware attack plans over a three-layer graph, memoized per position
//! - Players and a turn driver

pub mod tree;
pub mod graph;
pub mod cache;
pub mod error;
pub mod plan;
pub mod actions;
pub mod eval;
pub mod search;
pub mod player;
pub mod config;

// Re-exports for convenient access
pub use actions::{available_actions, BattalionTree, Node};
pub use cache::FixedCache;
pub use config::{AiConfig, PlayerKind};
pub use error::AiError;
pub use eval::{ActionEvaluator, BattalionValue, EvalWeights, PositionEvaluator, DEFAULT_AGGRESSION};
pub use graph::Graph;
pub use plan::{AttackPlanKey, AttackPlanner, Layer, Plan, PlanWeights, PositionPlans};
pub use player::{play_turn, GreedyPlayer, MiniMaxPlayer, Player, RandomPlayer};
pub use search::{Greedy, MiniMaxAlphaBeta};
pub use tree::{GameTree, TreePosition, ValueFunction};
