//! Game state, rules and action application

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{iter_cells, Bitmap, Cell};
use crate::buildings::{BuildingSpec, BuildingType, CONQUER_DURATION_FROM_NONE, CONQUER_DURATION_FROM_OTHER};
use crate::terrain::{Terrain, TerrainMap};
use crate::units::{UnitCategory, UnitType, WeaponKind};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Team color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    Red = 0,
    Blue = 1,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Team> {
        Team::ALL.get(index).copied()
    }

    pub fn opponent(self) -> Self {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Red => write!(f, "Red"),
            Team::Blue => write!(f, "Blue"),
        }
    }
}

/// A unit on the board. Its cell is the key it is stored under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub unit_type: UnitType,
    pub team: Team,
    pub health: i32,
    pub active: bool,
    pub repairing: bool,
    /// Carried unit, only for transporter types
    pub passenger: Option<Box<Unit>>,
}

impl Unit {
    /// Full health, inactive
    pub fn new(unit_type: UnitType, team: Team) -> Self {
        Self {
            unit_type,
            team,
            health: unit_type.spec().health,
            active: false,
            repairing: false,
            passenger: None,
        }
    }

    /// Transporter of `transport` type carrying `passenger`
    pub fn transporter(transport: UnitType, mut passenger: Unit) -> Self {
        passenger.active = false;
        let mut unit = Unit::new(transport, passenger.team);
        unit.passenger = Some(Box::new(passenger));
        unit
    }

    pub fn max_health(&self) -> i32 {
        self.unit_type.spec().health
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn is_transporter(&self) -> bool {
        self.unit_type.spec().transports_units
    }

    /// Health restored by a repair started now
    pub fn repair_amount(&self) -> i32 {
        let max = self.max_health();
        (max - self.health).min(max / 2).max(0)
    }

    /// Repairs cost half the unit price, pro rata to the restored health
    pub fn repair_cost(&self) -> i32 {
        self.unit_type.spec().price * self.repair_amount() / (2 * self.max_health())
    }
}

/// A building on the board
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    pub building_type: BuildingType,
    pub owner: Option<Team>,
    pub conquer_team: Option<Team>,
    pub conquer_progress: u8,
    pub active: bool,
}

impl Building {
    pub fn new(building_type: BuildingType, owner: Option<Team>) -> Self {
        Self {
            building_type,
            owner,
            conquer_team: None,
            conquer_progress: 0,
            active: false,
        }
    }

    pub fn spec(&self) -> &'static BuildingSpec {
        self.building_type.spec()
    }

    fn conquer_duration(&self) -> u8 {
        if self.owner.is_none() {
            CONQUER_DURATION_FROM_NONE
        } else {
            CONQUER_DURATION_FROM_OTHER
        }
    }

    /// Conquer progress in [0, 1]
    pub fn conquer_fraction(&self) -> f64 {
        self.conquer_progress as f64 / self.conquer_duration() as f64
    }

    /// Advance conquest by `conquerer`, or reset it when `None` or a different team
    fn try_conquer(&mut self, conquerer: Option<Team>) {
        if conquerer != self.conquer_team {
            self.conquer_team = None;
            self.conquer_progress = 0;
        }
        let Some(team) = conquerer else { return };
        if Some(team) == self.owner {
            return;
        }
        self.conquer_team = Some(team);
        self.conquer_progress += 1;
        if self.conquer_progress >= self.conquer_duration() {
            self.owner = Some(team);
            self.conquer_team = None;
            self.conquer_progress = 0;
        }
    }
}

/// A player action. Units and factories are addressed by their cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move along `path` (start cell excluded)
    Move { unit: Cell, path: Vec<Cell> },
    /// Move along `path` (possibly empty) then strike an adjacent target
    MoveAndAttack { unit: Cell, path: Vec<Cell>, target: Cell },
    AttackAtRange { unit: Cell, target: Cell },
    Build { factory: Cell, unit_type: UnitType },
    Repair { unit: Cell },
    TransportLoad { unit: Cell, transport: UnitType },
    TransportUnload { unit: Cell },
    EndTurn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { unit, path } => match path.last() {
                Some(dest) => write!(f, "move {} -> {}", unit, dest),
                None => write!(f, "move {} (stay)", unit),
            },
            Action::MoveAndAttack { unit, path, target } => match path.last() {
                Some(dest) => write!(f, "move {} -> {} and attack {}", unit, dest, target),
                None => write!(f, "attack {} from {}", target, unit),
            },
            Action::AttackAtRange { unit, target } => write!(f, "fire {} at {}", unit, target),
            Action::Build { factory, unit_type } => write!(f, "build {:?} at {}", unit_type, factory),
            Action::Repair { unit } => write!(f, "repair {}", unit),
            Action::TransportLoad { unit, transport } => write!(f, "load {} into {:?}", unit, transport),
            Action::TransportUnload { unit } => write!(f, "unload {}", unit),
            Action::EndTurn => write!(f, "end turn"),
        }
    }
}

/// Rejected action
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game is already finished")]
    Finished,
    #[error("no unit at {0}")]
    NoUnit(Cell),
    #[error("no building at {0}")]
    NoBuilding(Cell),
    #[error("unit at {0} cannot act this turn")]
    UnitNotReady(Cell),
    #[error("invalid path for unit at {0}")]
    InvalidPath(Cell),
    #[error("unit at {attacker} cannot attack {target}")]
    InvalidAttack { attacker: Cell, target: Cell },
    #[error("factory at {factory} cannot build {unit_type:?}")]
    CannotBuild { factory: Cell, unit_type: UnitType },
    #[error("unit at {0} cannot be repaired")]
    CannotRepair(Cell),
    #[error("unit at {unit} cannot board {transport:?}")]
    CannotTransport { unit: Cell, transport: UnitType },
    #[error("unit at {0} cannot unload")]
    CannotUnload(Cell),
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state (clone to mutate)
///
/// Equality and hash cover the full position so a game value can key caches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Game {
    terrain: TerrainMap,
    units: BTreeMap<Cell, Unit>,
    buildings: BTreeMap<Cell, Building>,
    money: [i32; 2],
    turn: Team,
    /// Number of completed turns
    pub turns_played: u32,
}

impl Game {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board, Red to move
    pub fn new(terrain: TerrainMap, money: [i32; 2]) -> Self {
        Self {
            terrain,
            units: BTreeMap::new(),
            buildings: BTreeMap::new(),
            money,
            turn: Team::Red,
            turns_played: 0,
        }
    }

    /// Place a unit, active if its team is to move
    pub fn with_unit(mut self, cell: Cell, mut unit: Unit) -> Self {
        unit.active = unit.team == self.turn;
        self.units.insert(cell, unit);
        self
    }

    /// Place a building, active if it is a factory of the side to move
    pub fn with_building(mut self, cell: Cell, mut building: Building) -> Self {
        building.active = building.building_type.can_build_units() && building.owner == Some(self.turn);
        self.buildings.insert(cell, building);
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn width(&self) -> usize {
        self.terrain.width()
    }

    pub fn height(&self) -> usize {
        self.terrain.height()
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        iter_cells(self.width(), self.height())
    }

    pub fn is_valid_cell(&self, cell: Cell) -> bool {
        cell.in_bounds(self.width(), self.height())
    }

    pub fn terrain(&self, cell: Cell) -> Terrain {
        self.terrain.at(cell)
    }

    pub fn unit(&self, cell: Cell) -> Option<&Unit> {
        self.units.get(&cell)
    }

    /// Units in board iteration order
    pub fn units(&self) -> impl Iterator<Item = (Cell, &Unit)> + '_ {
        self.units.iter().map(|(&cell, unit)| (cell, unit))
    }

    pub fn units_of(&self, team: Team) -> impl Iterator<Item = (Cell, &Unit)> + '_ {
        self.units().filter(move |(_, u)| u.team == team)
    }

    pub fn building(&self, cell: Cell) -> Option<&Building> {
        self.buildings.get(&cell)
    }

    /// Buildings in board iteration order
    pub fn buildings(&self) -> impl Iterator<Item = (Cell, &Building)> + '_ {
        self.buildings.iter().map(|(&cell, b)| (cell, b))
    }

    /// Side to move
    pub fn turn(&self) -> Team {
        self.turn
    }

    pub fn money(&self, team: Team) -> i32 {
        self.money[team.index()]
    }

    pub fn is_team_alive(&self, team: Team) -> bool {
        self.units.values().any(|u| u.team == team)
    }

    /// At most one team has units left
    pub fn is_finished(&self) -> bool {
        Team::ALL.iter().filter(|&&t| self.is_team_alive(t)).count() <= 1
    }

    /// The last team standing, once the game is finished
    pub fn winner(&self) -> Option<Team> {
        if !self.is_finished() {
            return None;
        }
        Team::ALL.into_iter().find(|&t| self.is_team_alive(t))
    }

    // ========================================================================
    // VISIBILITY
    // ========================================================================

    /// Invisible units are seen by their own team and by adjacent enemies
    pub fn is_unit_visible(&self, cell: Cell, viewer: Team) -> bool {
        let Some(unit) = self.units.get(&cell) else {
            return false;
        };
        if !unit.unit_type.spec().invisible || unit.team == viewer {
            return true;
        }
        cell.neighbors()
            .iter()
            .any(|n| self.units.get(n).is_some_and(|u| u.team == viewer))
    }

    /// Foreign units `viewer` can see
    pub fn enemies_seen_by(&self, viewer: Team) -> impl Iterator<Item = (Cell, &Unit)> + '_ {
        self.units()
            .filter(move |&(cell, u)| u.team != viewer && self.is_unit_visible(cell, viewer))
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Is `cell` blocked for a unit of `team`. Hidden enemies only block with full knowledge.
    fn blocks(&self, cell: Cell, team: Team, full_knowledge: bool) -> bool {
        match self.units.get(&cell) {
            Some(other) if other.team != team => full_knowledge || self.is_unit_visible(cell, team),
            _ => false,
        }
    }

    /// BFS step counts from `from`, bounded by the move limit
    fn distance_map(&self, from: Cell, unit: &Unit, full_knowledge: bool) -> Vec<Option<u8>> {
        let (width, height) = (self.width(), self.height());
        let limit = unit.unit_type.spec().move_limit;
        let mut dist = vec![None; width * height];
        dist[from.index(width)] = Some(0u8);
        let mut queue = VecDeque::from([from]);

        while let Some(cell) = queue.pop_front() {
            let Some(d) = dist[cell.index(width)] else { continue };
            if d >= limit {
                continue;
            }
            for next in cell.neighbors() {
                if !next.in_bounds(width, height) || dist[next.index(width)].is_some() {
                    continue;
                }
                if !unit.unit_type.can_stand_on(self.terrain.at(next))
                    || self.blocks(next, unit.team, full_knowledge)
                {
                    continue;
                }
                dist[next.index(width)] = Some(d + 1);
                queue.push_back(next);
            }
        }
        dist
    }

    /// Cells the unit at `cell` can end a move on, its own cell included
    pub fn reachable_map(&self, cell: Cell) -> Bitmap {
        let (width, height) = (self.width(), self.height());
        let Some(unit) = self.units.get(&cell) else {
            return Bitmap::empty(width, height);
        };
        let dist = self.distance_map(cell, unit, false);
        Bitmap::from_predicate(width, height, |c| {
            dist[c.index(width)].is_some()
                && (c == cell
                    || match self.units.get(&c) {
                        None => true,
                        Some(other) => other.team != unit.team && !self.is_unit_visible(c, unit.team),
                    })
        })
    }

    /// Shortest path from `from` to `destination`, start excluded
    pub fn calc_path(&self, from: Cell, destination: Cell) -> Option<Vec<Cell>> {
        let unit = self.units.get(&from)?;
        if !self.is_valid_cell(destination) {
            return None;
        }
        let width = self.width();
        let dist = self.distance_map(from, unit, false);
        let mut d = dist[destination.index(width)]?;
        let mut path = Vec::with_capacity(d as usize);
        let mut p = destination;
        while p != from {
            path.push(p);
            d -= 1;
            p = p
                .neighbors()
                .into_iter()
                .find(|n| self.is_valid_cell(*n) && dist[n.index(width)] == Some(d))?;
        }
        path.reverse();
        Some(path)
    }

    /// Check a path against what the mover knows
    fn is_path_valid(&self, from: Cell, unit: &Unit, path: &[Cell]) -> bool {
        if path.is_empty() || path.len() > unit.unit_type.spec().move_limit as usize {
            return false;
        }
        let width = self.width();
        let dist = self.distance_map(from, unit, false);
        let mut prev = from;
        for &p in path {
            if !prev.is_neighbor(p) || !self.is_valid_cell(p) || dist[p.index(width)].is_none() {
                return false;
            }
            prev = p;
        }
        path.last().is_some_and(|&last| self.reachable_map(from).contains(last))
    }

    /// Truncate a path at the first hidden blocker, then back off occupied cells
    fn real_path(&self, team: Team, path: &[Cell]) -> Vec<Cell> {
        let mut real: Vec<Cell> = path
            .iter()
            .copied()
            .take_while(|&p| !self.blocks(p, team, true))
            .collect();
        while real.last().is_some_and(|p| self.units.contains_key(p)) {
            real.pop();
        }
        real
    }

    // ========================================================================
    // COMBAT
    // ========================================================================

    fn is_target(&self, attacker: &Unit, cell: Cell) -> bool {
        self.units.get(&cell).is_some_and(|target| {
            target.team != attacker.team
                && attacker.unit_type.can_attack(target.unit_type)
                && self.is_unit_visible(cell, attacker.team)
        })
    }

    /// Cells with enemies the unit at `cell` can strike this turn
    pub fn attackable_map(&self, cell: Cell) -> Bitmap {
        let (width, height) = (self.width(), self.height());
        let Some(unit) = self.units.get(&cell) else {
            return Bitmap::empty(width, height);
        };
        let weapon = unit.unit_type.weapon();
        match weapon.kind {
            WeaponKind::CloseRange => {
                let mut map = Bitmap::empty(width, height);
                for from in self.reachable_map(cell).cells() {
                    for n in from.neighbors() {
                        if self.is_target(unit, n) {
                            map.insert(n);
                        }
                    }
                }
                map
            }
            WeaponKind::LongRange => Bitmap::from_predicate(width, height, |c| {
                let d = cell.distance_to(c);
                weapon.min_range <= d && d <= weapon.max_range && self.is_target(unit, c)
            }),
            WeaponKind::None => Bitmap::empty(width, height),
        }
    }

    /// Damage dealt by one strike
    pub fn damage(&self, attacker: &Unit, _target: &Unit) -> i32 {
        attacker.unit_type.spec().damage
    }

    fn is_attack_valid(&self, attacker_cell: Cell, target_cell: Cell) -> bool {
        self.units.get(&attacker_cell).is_some_and(|attacker| {
            attacker.team == self.turn
                && attacker.active
                && self.attackable_map(attacker_cell).contains(target_cell)
        })
    }

    // ========================================================================
    // PRODUCTION, REPAIR, TRANSPORT
    // ========================================================================

    fn controls(&self, team: Team, allows: impl Fn(&BuildingSpec) -> bool) -> bool {
        self.buildings
            .values()
            .any(|b| b.owner == Some(team) && allows(b.spec()))
    }

    pub fn can_build_land_units(&self, team: Team) -> bool {
        self.controls(team, |s| s.allow_land)
    }

    pub fn can_build_water_units(&self, team: Team) -> bool {
        self.controls(team, |s| s.allow_water)
    }

    pub fn can_build_air_units(&self, team: Team) -> bool {
        self.controls(team, |s| s.allow_air)
    }

    /// Unit types on sale at a factory, whatever the owner's money
    pub fn available_units(&self, factory: Cell) -> Vec<UnitType> {
        let Some(building) = self.buildings.get(&factory) else {
            return Vec::new();
        };
        let Some(team) = building.owner else {
            return Vec::new();
        };
        if !building.building_type.can_build_units() {
            return Vec::new();
        }
        let terrain = self.terrain.at(factory);
        let land = self.can_build_land_units(team);
        let water = self.can_build_water_units(team) && (terrain.is_water() || terrain == Terrain::Shore);
        let air = self.can_build_air_units(team);

        UnitType::ALL
            .into_iter()
            .filter(|t| {
                let spec = t.spec();
                let domain = match spec.category {
                    UnitCategory::Land => land,
                    UnitCategory::Water | UnitCategory::DeepWater => water,
                    UnitCategory::Air => air,
                };
                domain && spec.price > 0 && !spec.transports_units && t.can_stand_on(terrain)
            })
            .collect()
    }

    pub fn can_build_unit(&self, factory: Cell, unit_type: UnitType) -> bool {
        let Some(building) = self.buildings.get(&factory) else {
            return false;
        };
        building.active
            && building.owner == Some(self.turn)
            && !self.units.contains_key(&factory)
            && self.money(self.turn) >= unit_type.spec().price
            && self.available_units(factory).contains(&unit_type)
    }

    pub fn can_repair(&self, cell: Cell) -> bool {
        self.units.get(&cell).is_some_and(|u| {
            u.team == self.turn
                && u.active
                && !u.repairing
                && u.health < u.max_health()
                && self.money(u.team) >= u.repair_cost()
        })
    }

    /// Can the unit at `cell` board a new transporter of type `transport`
    pub fn can_transport(&self, cell: Cell, transport: UnitType) -> bool {
        let Some(unit) = self.units.get(&cell) else {
            return false;
        };
        let domain = match transport.category() {
            UnitCategory::Water => self.can_build_water_units(unit.team),
            UnitCategory::Air => self.can_build_air_units(unit.team),
            UnitCategory::Land | UnitCategory::DeepWater => false,
        };
        unit.team == self.turn
            && unit.active
            && unit.unit_type.category() == UnitCategory::Land
            && transport.spec().transports_units
            && domain
            && transport.can_stand_on(self.terrain.at(cell))
            && self.money(unit.team) >= transport.spec().price
    }

    /// Can the transporter at `cell` let its passenger off here
    pub fn can_finish_transport(&self, cell: Cell) -> bool {
        self.units.get(&cell).is_some_and(|u| {
            u.team == self.turn
                && u.active
                && u.passenger
                    .as_ref()
                    .is_some_and(|p| p.unit_type.can_stand_on(self.terrain.at(cell)))
        })
    }

    // ========================================================================
    // APPLY ACTION
    // ========================================================================

    /// Apply action to a copy, return the copy
    pub fn apply_action(&self, action: &Action) -> Result<Self, GameError> {
        let mut next = self.clone();
        next.perform_action(action)?;
        Ok(next)
    }

    /// Apply action in place. A rejected action leaves the game untouched.
    pub fn perform_action(&mut self, action: &Action) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }
        match action {
            Action::Move { unit, path } => self.do_move(*unit, path),
            Action::MoveAndAttack { unit, path, target } => self.do_move_and_attack(*unit, path, *target),
            Action::AttackAtRange { unit, target } => self.do_attack_range(*unit, *target),
            Action::Build { factory, unit_type } => self.do_build(*factory, *unit_type),
            Action::Repair { unit } => self.do_repair(*unit),
            Action::TransportLoad { unit, transport } => self.do_transport(*unit, *transport),
            Action::TransportUnload { unit } => self.do_unload(*unit),
            Action::EndTurn => {
                self.end_turn();
                Ok(())
            }
        }
    }

    fn ready_unit(&self, cell: Cell) -> Result<&Unit, GameError> {
        let unit = self.units.get(&cell).ok_or(GameError::NoUnit(cell))?;
        if unit.team != self.turn || !unit.active {
            return Err(GameError::UnitNotReady(cell));
        }
        Ok(unit)
    }

    fn do_move(&mut self, from: Cell, path: &[Cell]) -> Result<(), GameError> {
        let unit = self.ready_unit(from)?;
        if !self.is_path_valid(from, unit, path) {
            return Err(GameError::InvalidPath(from));
        }
        let real = self.real_path(unit.team, path);
        let at = match real.last() {
            Some(&dest) => self.relocate(from, dest),
            None => from,
        };
        self.deactivate(at);
        Ok(())
    }

    fn do_move_and_attack(&mut self, from: Cell, path: &[Cell], target: Cell) -> Result<(), GameError> {
        let unit = self.ready_unit(from)?;
        let invalid = GameError::InvalidAttack { attacker: from, target };
        if unit.unit_type.weapon().kind != WeaponKind::CloseRange {
            return Err(invalid);
        }
        let last = path.last().copied().unwrap_or(from);
        if !last.is_neighbor(target) {
            return Err(invalid);
        }
        if !path.is_empty() && !self.is_path_valid(from, unit, path) {
            return Err(GameError::InvalidPath(from));
        }
        if !self.is_attack_valid(from, target) {
            return Err(invalid);
        }

        let real = self.real_path(unit.team, path);
        let at = match real.last() {
            Some(&dest) => self.relocate(from, dest),
            None => from,
        };
        self.deactivate(at);
        if real.len() == path.len() {
            self.attack(at, target);
        }
        Ok(())
    }

    fn do_attack_range(&mut self, from: Cell, target: Cell) -> Result<(), GameError> {
        let unit = self.ready_unit(from)?;
        if unit.unit_type.weapon().kind != WeaponKind::LongRange || !self.is_attack_valid(from, target) {
            return Err(GameError::InvalidAttack { attacker: from, target });
        }
        self.deactivate(from);
        self.attack(from, target);
        Ok(())
    }

    fn do_build(&mut self, factory: Cell, unit_type: UnitType) -> Result<(), GameError> {
        if !self.buildings.contains_key(&factory) {
            return Err(GameError::NoBuilding(factory));
        }
        if !self.can_build_unit(factory, unit_type) {
            return Err(GameError::CannotBuild { factory, unit_type });
        }
        let team = self.turn;
        self.money[team.index()] -= unit_type.spec().price;
        self.units.insert(factory, Unit::new(unit_type, team));
        Ok(())
    }

    fn do_repair(&mut self, cell: Cell) -> Result<(), GameError> {
        if !self.can_repair(cell) {
            return Err(GameError::CannotRepair(cell));
        }
        if let Some(unit) = self.units.get_mut(&cell) {
            self.money[unit.team.index()] -= unit.repair_cost();
            unit.repairing = true;
            unit.active = false;
        }
        Ok(())
    }

    fn do_transport(&mut self, cell: Cell, transport: UnitType) -> Result<(), GameError> {
        if !self.can_transport(cell, transport) {
            return Err(GameError::CannotTransport { unit: cell, transport });
        }
        let unit = self.units.remove(&cell).ok_or(GameError::NoUnit(cell))?;
        self.money[unit.team.index()] -= transport.spec().price;
        self.units.insert(cell, Unit::transporter(transport, unit));
        Ok(())
    }

    fn do_unload(&mut self, cell: Cell) -> Result<(), GameError> {
        if !self.can_finish_transport(cell) {
            return Err(GameError::CannotUnload(cell));
        }
        let transporter = self.units.remove(&cell).ok_or(GameError::NoUnit(cell))?;
        if let Some(passenger) = transporter.passenger {
            let mut passenger = *passenger;
            passenger.active = true;
            self.units.insert(cell, passenger);
        }
        Ok(())
    }

    fn deactivate(&mut self, cell: Cell) {
        if let Some(unit) = self.units.get_mut(&cell) {
            unit.active = false;
        }
    }

    /// Move a unit, updating conquest on the cells it leaves and enters
    fn relocate(&mut self, from: Cell, to: Cell) -> Cell {
        let Some(unit) = self.units.remove(&from) else {
            return from;
        };
        let conquerer = unit.unit_type.spec().can_conquer.then_some(unit.team);
        self.units.insert(to, unit);

        if let Some(building) = self.buildings.get_mut(&from) {
            building.try_conquer(None);
        }
        if let (Some(building), Some(team)) = (self.buildings.get_mut(&to), conquerer) {
            building.try_conquer(Some(team));
        }
        to
    }

    /// Strike, then let the target strike back if it can
    fn attack(&mut self, attacker_cell: Cell, target_cell: Cell) {
        let (Some(attacker), Some(target)) = (self.units.get(&attacker_cell), self.units.get(&target_cell))
        else {
            return;
        };
        let strike_back = !target.repairing
            && target.unit_type.can_attack(attacker.unit_type)
            && match target.unit_type.weapon().kind {
                WeaponKind::CloseRange => target_cell.is_neighbor(attacker_cell),
                WeaponKind::LongRange => {
                    let weapon = target.unit_type.weapon();
                    let d = target_cell.distance_to(attacker_cell);
                    weapon.min_range <= d && d <= weapon.max_range && self.is_unit_visible(attacker_cell, target.team)
                }
                WeaponKind::None => false,
            };

        self.do_damage(attacker_cell, target_cell);
        if strike_back && self.units.contains_key(&target_cell) {
            self.do_damage(target_cell, attacker_cell);
        }
    }

    fn do_damage(&mut self, attacker_cell: Cell, target_cell: Cell) {
        let Some(attacker) = self.units.get(&attacker_cell) else { return };
        let Some(target) = self.units.get(&target_cell) else { return };
        let damage = self.damage(attacker, target);

        let Some(target) = self.units.get_mut(&target_cell) else { return };
        target.health = (target.health - damage).max(0);
        target.repairing = false;
        if !target.is_dead() {
            return;
        }

        let team = target.team;
        self.units.remove(&target_cell);
        if let Some(building) = self.buildings.get_mut(&target_cell) {
            building.try_conquer(None);
        }
        if !self.is_team_alive(team) {
            self.eliminate(team);
        }
    }

    fn eliminate(&mut self, team: Team) {
        for building in self.buildings.values_mut() {
            if building.owner == Some(team) {
                building.owner = None;
                building.active = false;
            }
            if building.conquer_team == Some(team) {
                building.try_conquer(None);
            }
        }
    }

    // ========================================================================
    // TURNS
    // ========================================================================

    fn end_turn(&mut self) {
        for building in self.buildings.values() {
            if let Some(owner) = building.owner {
                self.money[owner.index()] += building.building_type.money_gain();
            }
        }

        let next = self.turn.opponent();

        for (cell, building) in self.buildings.iter_mut() {
            match self.units.get(cell) {
                Some(unit) if unit.unit_type.spec().can_conquer => {
                    if unit.team == next {
                        building.try_conquer(Some(next));
                    }
                }
                _ => building.try_conquer(None),
            }
        }

        for unit in self.units.values_mut() {
            if unit.team == next && unit.repairing {
                unit.health = (unit.health + unit.repair_amount()).min(unit.max_health());
                unit.repairing = false;
            }
        }

        self.begin_turn(next);
        self.turns_played += 1;
    }

    fn begin_turn(&mut self, team: Team) {
        self.turn = team;
        for building in self.buildings.values_mut() {
            building.active = building.building_type.can_build_units() && building.owner == Some(team);
        }
        for unit in self.units.values_mut() {
            unit.active = unit.team == team;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
