//! Unit type definitions

use serde::{Deserialize, Serialize};

use crate::terrain::{
    Terrain, TerrainSet, LAND_EXTREME, LAND_FLAT, LAND_ROUGH, WATER, WATER_DEEP,
};

/// Movement domain of a unit, also what attackers can target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    Land,
    Water,
    DeepWater,
    Air,
}

/// Category bitmasks
pub const CAT_LAND: u8 = 1 << 0;
pub const CAT_WATER: u8 = 1 << 1;
pub const CAT_DEEP_WATER: u8 = 1 << 2;
pub const CAT_AIR: u8 = 1 << 3;
pub const CAT_ANY: u8 = CAT_LAND | CAT_WATER | CAT_DEEP_WATER | CAT_AIR;

impl UnitCategory {
    const fn mask(self) -> u8 {
        match self {
            UnitCategory::Land => CAT_LAND,
            UnitCategory::Water => CAT_WATER,
            UnitCategory::DeepWater => CAT_DEEP_WATER,
            UnitCategory::Air => CAT_AIR,
        }
    }
}

/// Weapon kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    CloseRange, // Attacks an orthogonal neighbour, may move first
    LongRange,  // Attacks within [min, max] range, never moves
    None,       // Cannot attack
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub min_range: i16,
    pub max_range: i16,
}

impl Weapon {
    const fn close_range() -> Self {
        Self { kind: WeaponKind::CloseRange, min_range: 1, max_range: 1 }
    }

    const fn long_range(min_range: i16, max_range: i16) -> Self {
        Self { kind: WeaponKind::LongRange, min_range, max_range }
    }

    const fn none() -> Self {
        Self { kind: WeaponKind::None, min_range: 0, max_range: 0 }
    }
}

/// Unit type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Soldier,
    Bazooka,
    Tank,
    TankBig,
    TankAntiAir,
    Artillery,
    Mortar,
    Turret,
    SpeedBoat,
    Ship,
    ShipAntiAir,
    ShipArtillery,
    Submarine,
    ShipTransporter,
    Airplane,
    Zeppelin,
    AirTransporter,
}

/// Unit type definition
#[derive(Clone, Debug)]
pub struct UnitSpec {
    pub name: &'static str,
    pub category: UnitCategory,
    pub weapon: Weapon,
    pub health: i32,
    pub damage: i32,
    pub move_limit: u8,
    pub can_stand: TerrainSet,
    pub can_attack: u8, // Bitmask of target categories
    pub can_conquer: bool,
    pub invisible: bool,
    pub transports_units: bool,
    pub price: i32,
}

impl UnitSpec {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        name: &'static str,
        category: UnitCategory,
        weapon: Weapon,
        health: i32,
        damage: i32,
        move_limit: u8,
        can_stand: TerrainSet,
        can_attack: u8,
        price: i32,
    ) -> Self {
        Self {
            name,
            category,
            weapon,
            health,
            damage,
            move_limit,
            can_stand,
            can_attack,
            can_conquer: false,
            invisible: false,
            transports_units: false,
            price,
        }
    }

    const fn conquerer(mut self) -> Self {
        self.can_conquer = true;
        self
    }

    const fn invisible(mut self) -> Self {
        self.invisible = true;
        self
    }

    const fn transporter(mut self) -> Self {
        self.transports_units = true;
        self
    }
}

/// All unit types, indexed by `UnitType as usize`
pub static UNIT_SPECS: [UnitSpec; 17] = [
    // Land
    UnitSpec::new("Soldier", UnitCategory::Land, Weapon::close_range(), 50, 22, 3, LAND_EXTREME, CAT_LAND | CAT_WATER, 75).conquerer(),
    UnitSpec::new("Bazooka", UnitCategory::Land, Weapon::close_range(), 50, 30, 3, LAND_EXTREME, CAT_LAND | CAT_WATER, 100).conquerer(),
    UnitSpec::new("Tank", UnitCategory::Land, Weapon::close_range(), 70, 35, 6, LAND_ROUGH, CAT_LAND | CAT_WATER, 270),
    UnitSpec::new("Big Tank", UnitCategory::Land, Weapon::close_range(), 140, 70, 4, LAND_ROUGH, CAT_LAND | CAT_WATER, 470),
    UnitSpec::new("Anti-Air Tank", UnitCategory::Land, Weapon::close_range(), 70, 17, 5, LAND_ROUGH, CAT_ANY, 230),
    UnitSpec::new("Artillery", UnitCategory::Land, Weapon::long_range(3, 5), 40, 40, 4, LAND_FLAT, CAT_ANY, 470),
    UnitSpec::new("Mortar", UnitCategory::Land, Weapon::long_range(2, 3), 50, 40, 5, LAND_FLAT, CAT_ANY, 300),
    UnitSpec::new("Turret", UnitCategory::Land, Weapon::long_range(2, 5), 100, 40, 0, LAND_FLAT, CAT_ANY, 0),
    // Water
    UnitSpec::new("Speed Boat", UnitCategory::Water, Weapon::close_range(), 50, 15, 5, WATER, CAT_LAND | CAT_WATER, 200).conquerer(),
    UnitSpec::new("Ship", UnitCategory::Water, Weapon::close_range(), 90, 45, 5, WATER, CAT_LAND | CAT_WATER, 500),
    UnitSpec::new("Anti-Air Ship", UnitCategory::Water, Weapon::close_range(), 90, 17, 5, WATER, CAT_ANY, 450),
    UnitSpec::new("Artillery Ship", UnitCategory::Water, Weapon::long_range(3, 6), 140, 50, 4, WATER, CAT_LAND | CAT_WATER, 800),
    UnitSpec::new("Submarine", UnitCategory::DeepWater, Weapon::close_range(), 25, 35, 4, WATER_DEEP, CAT_WATER | CAT_DEEP_WATER, 475).invisible(),
    UnitSpec::new("Landing Craft", UnitCategory::Water, Weapon::none(), 90, 0, 5, WATER, 0, 100).transporter(),
    // Air
    UnitSpec::new("Airplane", UnitCategory::Air, Weapon::close_range(), 50, 30, 7, TerrainSet::ALL, CAT_ANY, 340),
    UnitSpec::new("Zeppelin", UnitCategory::Air, Weapon::close_range(), 110, 80, 4, TerrainSet::ALL, CAT_ANY, 650),
    UnitSpec::new("Transport Plane", UnitCategory::Air, Weapon::none(), 50, 0, 6, TerrainSet::ALL, 0, 200).transporter(),
];

impl UnitType {
    pub const ALL: [UnitType; 17] = [
        UnitType::Soldier,
        UnitType::Bazooka,
        UnitType::Tank,
        UnitType::TankBig,
        UnitType::TankAntiAir,
        UnitType::Artillery,
        UnitType::Mortar,
        UnitType::Turret,
        UnitType::SpeedBoat,
        UnitType::Ship,
        UnitType::ShipAntiAir,
        UnitType::ShipArtillery,
        UnitType::Submarine,
        UnitType::ShipTransporter,
        UnitType::Airplane,
        UnitType::Zeppelin,
        UnitType::AirTransporter,
    ];

    /// Transporter types a land unit can board, water first
    pub const TRANSPORTERS: [UnitType; 2] = [UnitType::ShipTransporter, UnitType::AirTransporter];

    pub fn spec(self) -> &'static UnitSpec {
        &UNIT_SPECS[self as usize]
    }

    pub fn category(self) -> UnitCategory {
        self.spec().category
    }

    pub fn weapon(self) -> Weapon {
        self.spec().weapon
    }

    pub fn can_stand_on(self, terrain: Terrain) -> bool {
        self.spec().can_stand.contains(terrain)
    }

    pub fn can_attack(self, target: UnitType) -> bool {
        self.spec().can_attack & target.category().mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_enum() {
        assert_eq!(UnitType::ALL.len(), UNIT_SPECS.len());
        assert_eq!(UnitType::Submarine.spec().name, "Submarine");
        assert_eq!(UnitType::AirTransporter.spec().name, "Transport Plane");
    }

    #[test]
    fn test_capabilities() {
        assert!(UnitType::Tank.can_attack(UnitType::Soldier));
        assert!(!UnitType::Tank.can_attack(UnitType::Airplane));
        assert!(UnitType::TankAntiAir.can_attack(UnitType::Airplane));
        assert!(!UnitType::ShipTransporter.can_attack(UnitType::Soldier));
        assert!(UnitType::Soldier.can_stand_on(Terrain::Mountain));
        assert!(!UnitType::Tank.can_stand_on(Terrain::Mountain));
        assert!(UnitType::Airplane.can_stand_on(Terrain::Water));
    }

    #[test]
    fn test_transporters() {
        for t in UnitType::ALL {
            assert_eq!(t.spec().transports_units, UnitType::TRANSPORTERS.contains(&t), "{:?}", t);
            if t.spec().transports_units {
                assert_eq!(t.weapon().kind, WeaponKind::None);
            }
        }
    }
}
