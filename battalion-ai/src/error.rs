//! AI error type

use battalion_core::{GameError, UnitType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("aggression must be within [0, 1], got {0}")]
    InvalidAggression(f64),
    #[error("search depth must be at least 1, got {0}")]
    InvalidDepth(u32),
    #[error("cache capacity must be positive")]
    ZeroCapacity,
    #[error("invalid evaluation weights: {0}")]
    InvalidWeights(String),
    #[error("{0:?} is not a transporter")]
    NotATransporter(UnitType),
    #[error("no player with index {0}")]
    InvalidPlayer(usize),
    #[error("unknown player kind {0:?}")]
    UnknownPlayer(String),
    #[error(transparent)]
    Game(#[from] GameError),
}
