//! Building type definitions

use serde::{Deserialize, Serialize};

/// Turns a conquerer must hold a neutral building
pub const CONQUER_DURATION_FROM_NONE: u8 = 2;
/// Turns a conquerer must hold a building owned by another team
pub const CONQUER_DURATION_FROM_OTHER: u8 = 3;

/// Building type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingType {
    OilRefinery,
    OilRefineryBig,
    OilRig,
    Factory,
    Capital,
    ControllerLand,
    ControllerWater,
    ControllerAir,
}

/// Building type definition
#[derive(Clone, Debug)]
pub struct BuildingSpec {
    pub name: &'static str,
    pub money_gain: i32,
    pub can_build_units: bool,
    pub allow_land: bool,
    pub allow_water: bool,
    pub allow_air: bool,
}

const fn building(name: &'static str, money_gain: i32) -> BuildingSpec {
    BuildingSpec {
        name,
        money_gain,
        can_build_units: false,
        allow_land: false,
        allow_water: false,
        allow_air: false,
    }
}

/// All building types, indexed by `BuildingType as usize`
pub static BUILDING_SPECS: [BuildingSpec; 8] = [
    building("Oil Refinery", 20),
    building("Big Oil Refinery", 35),
    building("Oil Rig", 50),
    BuildingSpec { can_build_units: true, ..building("Factory", 0) },
    building("Capital", 0),
    BuildingSpec { allow_land: true, ..building("Land Controller", 0) },
    BuildingSpec { allow_water: true, ..building("Water Controller", 0) },
    BuildingSpec { allow_air: true, ..building("Air Controller", 0) },
];

impl BuildingType {
    pub const ALL: [BuildingType; 8] = [
        BuildingType::OilRefinery,
        BuildingType::OilRefineryBig,
        BuildingType::OilRig,
        BuildingType::Factory,
        BuildingType::Capital,
        BuildingType::ControllerLand,
        BuildingType::ControllerWater,
        BuildingType::ControllerAir,
    ];

    pub fn spec(self) -> &'static BuildingSpec {
        &BUILDING_SPECS[self as usize]
    }

    pub fn money_gain(self) -> i32 {
        self.spec().money_gain
    }

    pub fn can_build_units(self) -> bool {
        self.spec().can_build_units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_table() {
        assert_eq!(BuildingType::ALL.len(), BUILDING_SPECS.len());
        assert_eq!(BuildingType::OilRig.money_gain(), 50);
        assert!(BuildingType::Factory.can_build_units());
        assert!(!BuildingType::Capital.can_build_units());
        assert!(BuildingType::ControllerWater.spec().allow_water);
        assert!(!BuildingType::ControllerWater.spec().allow_land);
    }
}
