//! Terrain categories and terrain sets

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::board::Cell;

/// Terrain category of a board cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    FlatLand = 0,
    Forest = 1,
    Hills = 2,
    Mountain = 3,
    Road = 4,
    BridgeLow = 5,
    BridgeHigh = 6,
    Shore = 7,
    Water = 8,
    WaterShallow = 9,
}

impl Terrain {
    pub const ALL: [Terrain; 10] = [
        Terrain::FlatLand,
        Terrain::Forest,
        Terrain::Hills,
        Terrain::Mountain,
        Terrain::Road,
        Terrain::BridgeLow,
        Terrain::BridgeHigh,
        Terrain::Shore,
        Terrain::Water,
        Terrain::WaterShallow,
    ];

    /// Level file character for this terrain
    pub fn symbol(self) -> char {
        match self {
            Terrain::FlatLand => '.',
            Terrain::Forest => 'f',
            Terrain::Hills => 'h',
            Terrain::Mountain => 'm',
            Terrain::Road => 'r',
            Terrain::BridgeLow => 'b',
            Terrain::BridgeHigh => 'B',
            Terrain::Shore => 's',
            Terrain::Water => '~',
            Terrain::WaterShallow => 'w',
        }
    }

    pub fn from_symbol(c: char) -> Option<Terrain> {
        Terrain::ALL.into_iter().find(|t| t.symbol() == c)
    }

    pub fn is_water(self) -> bool {
        matches!(self, Terrain::Water | Terrain::WaterShallow)
    }
}

// ============================================================================
// TERRAIN SET
// ============================================================================

/// Set of terrain categories as a bitmask
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TerrainSet(u16);

impl TerrainSet {
    pub const EMPTY: TerrainSet = TerrainSet(0);
    pub const ALL: TerrainSet = TerrainSet((1 << 10) - 1);

    pub const fn of(terrains: &[Terrain]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < terrains.len() {
            bits |= 1 << terrains[i] as u16;
            i += 1;
        }
        TerrainSet(bits)
    }

    pub const fn contains(self, terrain: Terrain) -> bool {
        self.0 & (1 << terrain as u16) != 0
    }

    pub const fn union(self, other: TerrainSet) -> TerrainSet {
        TerrainSet(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Terrain> {
        Terrain::ALL.into_iter().filter(move |&t| self.contains(t))
    }
}

/// Flat, passable land
pub const LAND_FLAT: TerrainSet = TerrainSet::of(&[
    Terrain::FlatLand,
    Terrain::Road,
    Terrain::BridgeLow,
    Terrain::BridgeHigh,
]);
/// Flat and rough land, shores included
pub const LAND_ROUGH: TerrainSet = LAND_FLAT.union(TerrainSet::of(&[
    Terrain::Forest,
    Terrain::Hills,
    Terrain::Shore,
]));
/// Any land, mountains included
pub const LAND_EXTREME: TerrainSet = LAND_ROUGH.union(TerrainSet::of(&[Terrain::Mountain]));
/// Surface water reachable by boats
pub const WATER: TerrainSet = TerrainSet::of(&[
    Terrain::Water,
    Terrain::WaterShallow,
    Terrain::BridgeHigh,
    Terrain::Shore,
]);
/// Deep water only
pub const WATER_DEEP: TerrainSet = TerrainSet::of(&[Terrain::Water, Terrain::BridgeHigh]);

// ============================================================================
// TERRAIN MAP
// ============================================================================

/// Immutable terrain grid shared between game clones
///
/// Equality compares content (with a pointer fast path); the hash only covers
/// the dimensions so hashing a position does not walk the whole board.
#[derive(Clone, Debug)]
pub struct TerrainMap {
    width: usize,
    height: usize,
    cells: Arc<[Terrain]>,
}

impl TerrainMap {
    pub fn new(width: usize, height: usize, cells: Vec<Terrain>) -> Self {
        assert_eq!(cells.len(), width * height, "terrain size mismatch");
        Self {
            width,
            height,
            cells: cells.into(),
        }
    }

    pub fn filled(width: usize, height: usize, terrain: Terrain) -> Self {
        Self::new(width, height, vec![terrain; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn at(&self, cell: Cell) -> Terrain {
        self.cells[cell.index(self.width)]
    }
}

impl PartialEq for TerrainMap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (Arc::ptr_eq(&self.cells, &other.cells) || self.cells == other.cells)
    }
}

impl Eq for TerrainMap {}

impl std::hash::Hash for TerrainMap {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_sets() {
        assert!(LAND_FLAT.contains(Terrain::Road));
        assert!(!LAND_FLAT.contains(Terrain::Forest));
        assert!(LAND_ROUGH.contains(Terrain::Shore));
        assert!(LAND_EXTREME.contains(Terrain::Mountain));
        assert!(!LAND_EXTREME.contains(Terrain::Water));
        assert!(WATER.contains(Terrain::Shore));
        assert!(!WATER_DEEP.contains(Terrain::Shore));
        assert_eq!(TerrainSet::ALL.iter().count(), Terrain::ALL.len());
    }

    #[test]
    fn test_symbols() {
        for t in Terrain::ALL {
            assert_eq!(Terrain::from_symbol(t.symbol()), Some(t));
        }
        assert_eq!(Terrain::from_symbol('?'), None);
    }

    #[test]
    fn test_terrain_map_equality() {
        let a = TerrainMap::filled(2, 2, Terrain::FlatLand);
        let b = TerrainMap::filled(2, 2, Terrain::FlatLand);
        let c = TerrainMap::new(2, 2, vec![Terrain::Water; 4]);
        assert_eq!(a, a.clone());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
