//! Level - Board, army and economy definition

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Cell;
use crate::buildings::BuildingType;
use crate::game::{Building, Game, Team, Unit};
use crate::terrain::{Terrain, TerrainMap};
use crate::units::{UnitCategory, UnitType};

/// Unit placement
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDesc {
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub team: Team,
    pub x: i16,
    pub y: i16,
    /// Carried unit type, for transporters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger: Option<UnitType>,
}

/// Building placement, neutral when `team` is absent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDesc {
    #[serde(rename = "type")]
    pub building_type: BuildingType,
    #[serde(default)]
    pub team: Option<Team>,
    pub x: i16,
    pub y: i16,
}

/// A playable level
///
/// Terrain rows use one character per cell, see [`Terrain::symbol`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    #[serde(default = "default_name")]
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub terrain: Vec<String>,
    #[serde(default)]
    pub units: Vec<UnitDesc>,
    #[serde(default)]
    pub buildings: Vec<BuildingDesc>,
    /// Starting money, indexed by team
    #[serde(default)]
    pub money: [i32; 2],
}

fn default_name() -> String {
    "unnamed".to_string()
}

/// Level data that does not describe a playable game
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("malformed level: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("empty board")]
    EmptyBoard,
    #[error("expected {expected} terrain rows, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("terrain row {row} has {found} cells, expected {expected}")]
    RowWidth { row: usize, expected: usize, found: usize },
    #[error("unknown terrain symbol {symbol:?} at {cell}")]
    UnknownTerrain { symbol: char, cell: Cell },
    #[error("{0} is outside the board")]
    OutOfBounds(Cell),
    #[error("two entities of the same kind at {0}")]
    Occupied(Cell),
    #[error("{unit_type:?} cannot stand on {terrain:?} at {cell}")]
    CannotStand { unit_type: UnitType, terrain: Terrain, cell: Cell },
    #[error("{0:?} cannot carry passengers")]
    NotATransporter(UnitType),
    #[error("{0:?} cannot be carried")]
    NotAPassenger(UnitType),
    #[error("negative starting money")]
    NegativeMoney,
}

impl Level {
    /// Parse from a JSON string
    pub fn from_json(content: &str) -> Result<Self, LevelError> {
        let level: Level = serde_json::from_str(content)?;
        level.terrain_map()?;
        Ok(level)
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read level {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid level {}", path.display()))
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn terrain_map(&self) -> Result<TerrainMap, LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::EmptyBoard);
        }
        if self.terrain.len() != self.height {
            return Err(LevelError::RowCount { expected: self.height, found: self.terrain.len() });
        }
        let mut cells = Vec::with_capacity(self.width * self.height);
        for (y, row) in self.terrain.iter().enumerate() {
            let found = row.chars().count();
            if found != self.width {
                return Err(LevelError::RowWidth { row: y, expected: self.width, found });
            }
            for (x, symbol) in row.chars().enumerate() {
                let terrain = Terrain::from_symbol(symbol).ok_or(LevelError::UnknownTerrain {
                    symbol,
                    cell: Cell::new(x as i16, y as i16),
                })?;
                cells.push(terrain);
            }
        }
        Ok(TerrainMap::new(self.width, self.height, cells))
    }

    /// Build the starting position, Red to move
    pub fn to_game(&self) -> Result<Game, LevelError> {
        let terrain = self.terrain_map()?;
        if self.money.iter().any(|&m| m < 0) {
            return Err(LevelError::NegativeMoney);
        }
        let check_cell = |cell: Cell, taken: &mut BTreeSet<Cell>| {
            if !cell.in_bounds(self.width, self.height) {
                return Err(LevelError::OutOfBounds(cell));
            }
            if !taken.insert(cell) {
                return Err(LevelError::Occupied(cell));
            }
            Ok(())
        };

        let mut game = Game::new(terrain.clone(), self.money);

        let mut taken = BTreeSet::new();
        for desc in &self.buildings {
            let cell = Cell::new(desc.x, desc.y);
            check_cell(cell, &mut taken)?;
            game = game.with_building(cell, Building::new(desc.building_type, desc.team));
        }

        let mut taken = BTreeSet::new();
        for desc in &self.units {
            let cell = Cell::new(desc.x, desc.y);
            check_cell(cell, &mut taken)?;
            let terrain = terrain.at(cell);
            if !desc.unit_type.can_stand_on(terrain) {
                return Err(LevelError::CannotStand { unit_type: desc.unit_type, terrain, cell });
            }
            let unit = match desc.passenger {
                None => Unit::new(desc.unit_type, desc.team),
                Some(passenger) => {
                    if !desc.unit_type.spec().transports_units {
                        return Err(LevelError::NotATransporter(desc.unit_type));
                    }
                    if passenger.category() != UnitCategory::Land {
                        return Err(LevelError::NotAPassenger(passenger));
                    }
                    Unit::transporter(desc.unit_type, Unit::new(passenger, desc.team))
                }
            };
            game = game.with_unit(cell, unit);
        }

        Ok(game)
    }

    /// Built-in two-army skirmish across a river
    pub fn skirmish() -> Self {
        let unit = |unit_type, team, x, y| UnitDesc { unit_type, team, x, y, passenger: None };
        let building = |building_type, team, x, y| BuildingDesc { building_type, team, x, y };
        Level {
            name: "skirmish".to_string(),
            width: 10,
            height: 6,
            terrain: [
                "..f.s~s.h.",
                "....s~s...",
                "rrrrrbrrrr",
                "....s~s...",
                ".h..s~s.f.",
                "..m.s~s...",
            ]
            .iter()
            .map(|row| row.to_string())
            .collect(),
            units: vec![
                unit(UnitType::Soldier, Team::Red, 0, 1),
                unit(UnitType::Tank, Team::Red, 1, 2),
                unit(UnitType::Artillery, Team::Red, 0, 3),
                unit(UnitType::Soldier, Team::Blue, 9, 1),
                unit(UnitType::Tank, Team::Blue, 8, 2),
                unit(UnitType::Artillery, Team::Blue, 9, 3),
            ],
            buildings: vec![
                building(BuildingType::ControllerLand, Some(Team::Red), 0, 0),
                building(BuildingType::Factory, Some(Team::Red), 0, 5),
                building(BuildingType::OilRefinery, None, 3, 1),
                building(BuildingType::ControllerLand, Some(Team::Blue), 9, 0),
                building(BuildingType::Factory, Some(Team::Blue), 9, 5),
                building(BuildingType::OilRefinery, None, 7, 3),
            ],
            money: [300, 300],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skirmish_is_playable() {
        let level = Level::skirmish();
        let game = level.to_game().unwrap();
        assert_eq!((game.width(), game.height()), (10, 6));
        assert_eq!(game.units_of(Team::Red).count(), 3);
        assert_eq!(game.units_of(Team::Blue).count(), 3);
        assert_eq!(game.terrain(Cell::new(5, 2)), Terrain::BridgeLow);
        assert!(game.can_build_unit(Cell::new(0, 5), UnitType::Soldier));
        assert!(!game.is_finished());
    }

    #[test]
    fn test_json_roundtrip() {
        let level = Level::skirmish();
        let json = serde_json::to_string(&level).unwrap();
        assert_eq!(Level::from_json(&json).unwrap(), level);
    }

    #[test]
    fn test_parse_minimal() {
        let json = r#"{
            "width": 3,
            "height": 1,
            "terrain": ["s~~"],
            "units": [
                {"type": "ShipTransporter", "team": "Red", "x": 1, "y": 0, "passenger": "Soldier"},
                {"type": "Ship", "team": "Blue", "x": 2, "y": 0}
            ],
            "money": [100, 0]
        }"#;
        let level = Level::from_json(json).unwrap();
        assert_eq!(level.name, "unnamed");
        let game = level.to_game().unwrap();
        let carrier = game.unit(Cell::new(1, 0)).unwrap();
        assert_eq!(carrier.passenger.as_ref().map(|p| p.unit_type), Some(UnitType::Soldier));
    }

    #[test]
    fn test_unknown_names_rejected() {
        let json = r#"{"width": 1, "height": 1, "terrain": ["."],
            "units": [{"type": "Dragon", "team": "Red", "x": 0, "y": 0}]}"#;
        assert!(matches!(Level::from_json(json), Err(LevelError::Parse(_))));

        let json = r#"{"width": 1, "height": 1, "terrain": ["."],
            "units": [{"type": "Tank", "team": "Green", "x": 0, "y": 0}]}"#;
        assert!(matches!(Level::from_json(json), Err(LevelError::Parse(_))));

        let json = r#"{"width": 1, "height": 1, "terrain": ["?"]}"#;
        assert!(matches!(Level::from_json(json), Err(LevelError::UnknownTerrain { symbol: '?', .. })));
    }

    #[test]
    fn test_invalid_placements() {
        let mut level = Level::skirmish();
        level.units.push(UnitDesc { unit_type: UnitType::Tank, team: Team::Red, x: 5, y: 0, passenger: None });
        assert!(matches!(level.to_game(), Err(LevelError::CannotStand { .. })));

        let mut level = Level::skirmish();
        level.units.push(UnitDesc { unit_type: UnitType::Tank, team: Team::Red, x: 20, y: 0, passenger: None });
        assert!(matches!(level.to_game(), Err(LevelError::OutOfBounds(_))));

        let mut level = Level::skirmish();
        level.units.push(UnitDesc { unit_type: UnitType::Tank, team: Team::Red, x: 0, y: 1, passenger: None });
        assert!(matches!(level.to_game(), Err(LevelError::Occupied(_))));

        let mut level = Level::skirmish();
        level.units.push(UnitDesc {
            unit_type: UnitType::Tank,
            team: Team::Red,
            x: 2,
            y: 2,
            passenger: Some(UnitType::Soldier),
        });
        assert!(matches!(level.to_game(), Err(LevelError::NotATransporter(UnitType::Tank))));
    }
}
