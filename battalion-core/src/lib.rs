//! Battalion Core - Rules engine
//!
//! This crate provides the game rules the AI plays against:
//! - Board geometry (square grid, orthogonal neighbours)
//! - Terrain, unit and building tables
//! - Game state, action validation and application
//! - Level loading

pub mod board;
pub mod terrain;
pub mod units;
pub mod buildings;
pub mod game;
pub mod level;

// Re-exports for convenient access
pub use board::{Bitmap, Cell, DIRECTIONS};
pub use terrain::{Terrain, TerrainMap, TerrainSet};
pub use units::{UnitCategory, UnitSpec, UnitType, Weapon, WeaponKind, UNIT_SPECS};
pub use buildings::{BuildingSpec, BuildingType, BUILDING_SPECS};
pub use game::{Action, Building, Game, GameError, Team, Unit};
pub use level::{Level, LevelError};
