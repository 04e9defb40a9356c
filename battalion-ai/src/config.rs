//! AI configuration
//!
//! Level 5 - Utilities and configuration

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::eval::{ActionEvaluator, BattalionValue, EvalWeights, PositionEvaluator, DEFAULT_AGGRESSION};
use crate::plan::{AttackPlanner, PlanWeights};
use crate::player::{GreedyPlayer, MiniMaxPlayer, Player, RandomPlayer};

/// Player kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// One-ply search
    Greedy,
    /// Depth-limited alpha-beta search
    #[default]
    MiniMax,
    /// Random moves, for baselines
    Random,
}

impl FromStr for PlayerKind {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(PlayerKind::Greedy),
            "minimax" => Ok(PlayerKind::MiniMax),
            "random" => Ok(PlayerKind::Random),
            _ => Err(AiError::UnknownPlayer(s.to_string())),
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerKind::Greedy => write!(f, "greedy"),
            PlayerKind::MiniMax => write!(f, "minimax"),
            PlayerKind::Random => write!(f, "random"),
        }
    }
}

/// AI configuration for game playing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub player: PlayerKind,
    /// Search depth for minimax, in actions
    pub depth: u32,
    /// Weight of the strongest enemy in the folded score
    pub aggression: f64,
    /// Root alpha-beta window of the legacy engine
    pub legacy_bounds: bool,
    pub eval_weights: EvalWeights,
    pub plan_weights: PlanWeights,
    /// Positions with cached attack plans
    pub position_cache_capacity: usize,
    /// Attack plans cached per position
    pub plan_cache_capacity: usize,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            player: PlayerKind::MiniMax,
            depth: 2,
            aggression: DEFAULT_AGGRESSION,
            legacy_bounds: false,
            eval_weights: EvalWeights::default(),
            plan_weights: PlanWeights::default(),
            position_cache_capacity: 64,
            plan_cache_capacity: 256,
            seed: None,
        }
    }
}

impl AiConfig {
    pub fn greedy() -> Self {
        Self {
            player: PlayerKind::Greedy,
            ..Default::default()
        }
    }

    pub fn minimax(depth: u32) -> Self {
        Self {
            player: PlayerKind::MiniMax,
            depth,
            ..Default::default()
        }
    }

    pub fn random(seed: u64) -> Self {
        Self {
            player: PlayerKind::Random,
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn with_aggression(mut self, aggression: f64) -> Self {
        self.aggression = aggression;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AiConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AiError> {
        if self.depth == 0 {
            return Err(AiError::InvalidDepth(self.depth));
        }
        if !(0.0..=1.0).contains(&self.aggression) {
            return Err(AiError::InvalidAggression(self.aggression));
        }
        if self.position_cache_capacity == 0 || self.plan_cache_capacity == 0 {
            return Err(AiError::ZeroCapacity);
        }
        self.eval_weights.validate()
    }

    /// Value function with this configuration's weights and caches
    pub fn value_function(&self) -> Result<BattalionValue, AiError> {
        let planner = AttackPlanner::new(
            self.plan_weights.clone(),
            self.position_cache_capacity,
            self.plan_cache_capacity,
        )?;
        Ok(BattalionValue::new(
            PositionEvaluator::new(self.eval_weights.clone(), self.aggression)?,
            ActionEvaluator::new(planner),
        ))
    }

    pub fn build_player(&self) -> Result<Box<dyn Player>, AiError> {
        self.validate()?;
        let player: Box<dyn Player> = match self.player {
            PlayerKind::Greedy => Box::new(GreedyPlayer::new(self.value_function()?)),
            PlayerKind::MiniMax => {
                let player = MiniMaxPlayer::new(self.value_function()?, self.depth)?;
                if self.legacy_bounds {
                    Box::new(player.with_legacy_bounds())
                } else {
                    Box::new(player)
                }
            }
            PlayerKind::Random => Box::new(RandomPlayer::new(self.seed)),
        };
        Ok(player)
    }
}
