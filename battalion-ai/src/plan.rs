//! Attack plans: transport-aware shortest paths towards a target
//!
//! Level 2 - Planning
//!
//! A plan is a distance table over three layers of board cells. The Regular
//! layer is the attacker on foot, the Water and Air layers are the attacker
//! embarked on a transporter of that domain. One Dijkstra run over the
//! reversed movement graph, started at the target, answers every
//! (cell, layer) query for one attacker mobility profile.

use std::cell::{RefCell, RefMut};

use battalion_core::{Cell, Game, Team, TerrainSet, Unit, UnitType};
use serde::{Deserialize, Serialize};

use crate::cache::FixedCache;
use crate::error::AiError;
use crate::graph::Graph;

// ============================================================================
// LAYERS AND WEIGHTS
// ============================================================================

/// Movement layer of an attacker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Regular = 0,
    Water = 1,
    Air = 2,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Regular, Layer::Water, Layer::Air];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Transporter type carrying units in this layer
    pub fn transporter(self) -> Option<UnitType> {
        match self {
            Layer::Regular => None,
            Layer::Water => Some(UnitType::ShipTransporter),
            Layer::Air => Some(UnitType::AirTransporter),
        }
    }
}

impl TryFrom<UnitType> for Layer {
    type Error = AiError;

    fn try_from(transport: UnitType) -> Result<Self, Self::Error> {
        match transport {
            UnitType::ShipTransporter => Ok(Layer::Water),
            UnitType::AirTransporter => Ok(Layer::Air),
            other => Err(AiError::NotATransporter(other)),
        }
    }
}

/// Edge weights of the movement graph
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanWeights {
    /// One step between orthogonal neighbours
    pub move_weight: u32,
    /// Boarding a transporter
    pub transport_weight: u32,
    /// Leaving a transporter
    pub transport_finish_weight: u32,
}

impl Default for PlanWeights {
    fn default() -> Self {
        Self {
            move_weight: 3,
            transport_weight: 10,
            transport_finish_weight: 1,
        }
    }
}

// ============================================================================
// PLAN
// ============================================================================

/// Everything a plan depends on besides the position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttackPlanKey {
    /// Terrain the attacker can stand on when not embarked
    pub stand: TerrainSet,
    pub team: Team,
    pub target: Cell,
    /// Water transport available
    pub water: bool,
    /// Air transport available
    pub air: bool,
}

impl AttackPlanKey {
    /// Key for `attacker` striking `target`. A transporter plans for its passenger.
    pub fn for_unit(game: &Game, attacker: &Unit, target: Cell) -> Self {
        let fighter = attacker.passenger.as_deref().unwrap_or(attacker);
        Self {
            stand: fighter.unit_type.spec().can_stand,
            team: attacker.team,
            target,
            water: game.can_build_water_units(attacker.team),
            air: game.can_build_air_units(attacker.team),
        }
    }
}

/// Weighted distance to strike a target, per cell and layer
#[derive(Clone, Debug)]
pub struct Plan {
    width: usize,
    height: usize,
    dist: Vec<Option<u32>>,
}

impl Plan {
    pub fn build(game: &Game, key: &AttackPlanKey, weights: &PlanWeights) -> Self {
        let (width, height) = (game.width(), game.height());
        let cells = width * height;
        let vertex = |layer: Layer, cell: Cell| layer.index() * cells + cell.index(width);

        let layers: Vec<Layer> = Layer::ALL
            .into_iter()
            .filter(|layer| match layer {
                Layer::Regular => true,
                Layer::Water => key.water,
                Layer::Air => key.air,
            })
            .collect();

        let standable = |layer: Layer, cell: Cell| {
            if !game.is_valid_cell(cell) {
                return false;
            }
            if game.unit(cell).is_some_and(|u| u.team != key.team) {
                return false;
            }
            let terrain = game.terrain(cell);
            match layer.transporter() {
                None => key.stand.contains(terrain),
                Some(transport) => transport.can_stand_on(terrain),
            }
        };

        // Every edge u -> v of the movement graph is inserted as v -> u
        let mut graph = Graph::new(Layer::ALL.len() * cells);
        for cell in game.cells() {
            for &layer in &layers {
                if !standable(layer, cell) {
                    continue;
                }
                for next in cell.neighbors() {
                    if standable(layer, next) {
                        graph.add_edge(vertex(layer, next), vertex(layer, cell), weights.move_weight);
                    }
                }
                if layer != Layer::Regular && standable(Layer::Regular, cell) {
                    graph.add_edge(vertex(layer, cell), vertex(Layer::Regular, cell), weights.transport_weight);
                    graph.add_edge(vertex(Layer::Regular, cell), vertex(layer, cell), weights.transport_finish_weight);
                }
            }
        }

        let target = vertex(Layer::Regular, key.target);
        for next in key.target.neighbors() {
            if standable(Layer::Regular, next) {
                graph.add_edge(target, vertex(Layer::Regular, next), weights.move_weight);
            }
        }

        let dist = graph.sssp(target);
        tracing::trace!(
            cell = %key.target,
            team = %key.team,
            layers = layers.len(),
            edges = graph.edge_count(),
            "built attack plan"
        );
        Self { width, height, dist }
    }

    /// Weighted cost from `cell` in `layer` to striking the target, `None` when impossible
    pub fn distance(&self, cell: Cell, layer: Layer) -> Option<u32> {
        if !cell.in_bounds(self.width, self.height) {
            return None;
        }
        self.dist[layer.index() * self.width * self.height + cell.index(self.width)]
    }
}

// ============================================================================
// PLANNER
// ============================================================================

/// Plans for one position, by key
pub type AttackPlans = FixedCache<AttackPlanKey, Plan>;

/// Memoized attack planner
///
/// Plans are cached per position value, then per key, so a plan is never
/// served for a position it was not built from.
pub struct AttackPlanner {
    weights: PlanWeights,
    empty_plans: AttackPlans,
    cache: RefCell<FixedCache<Game, AttackPlans>>,
}

impl AttackPlanner {
    pub fn new(weights: PlanWeights, position_capacity: usize, plan_capacity: usize) -> Result<Self, AiError> {
        Ok(Self {
            weights,
            empty_plans: FixedCache::new(plan_capacity)?,
            cache: RefCell::new(FixedCache::new(position_capacity)?),
        })
    }

    pub fn weights(&self) -> &PlanWeights {
        &self.weights
    }

    /// The plans of `game`, looked up once for any number of queries.
    /// The planner is borrowed until the returned value is dropped.
    pub fn plans_for<'a>(&'a self, game: &'a Game) -> PositionPlans<'a> {
        let plans = RefMut::map(self.cache.borrow_mut(), |cache| {
            cache.get_or_compute(game, |_| self.empty_plans.clone())
        });
        PositionPlans {
            game,
            weights: &self.weights,
            plans,
        }
    }

    /// Distance for `key`'s attacker standing on `cell` in `layer`, planned on `game`
    pub fn distance(&self, game: &Game, key: &AttackPlanKey, cell: Cell, layer: Layer) -> Option<u32> {
        self.plans_for(game).distance(key, cell, layer)
    }

    /// Weighted distance for `attacker`, standing on `from`, to strike `target`.
    /// Plans are built on `game`, which need not be the position `attacker` comes from.
    pub fn attack_distance(
        &self,
        game: &Game,
        attacker: &Unit,
        from: Cell,
        target: Cell,
    ) -> Result<Option<u32>, AiError> {
        self.plans_for(game).attack_distance(attacker, from, target)
    }

    /// Number of positions with cached plans
    pub fn cached_positions(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// Cached plans of a single position
pub struct PositionPlans<'a> {
    game: &'a Game,
    weights: &'a PlanWeights,
    plans: RefMut<'a, AttackPlans>,
}

impl PositionPlans<'_> {
    pub fn distance(&mut self, key: &AttackPlanKey, cell: Cell, layer: Layer) -> Option<u32> {
        let (game, weights) = (self.game, self.weights);
        self.plans
            .get_or_compute(key, |k| Plan::build(game, k, weights))
            .distance(cell, layer)
    }

    /// See [`AttackPlanner::attack_distance`]
    pub fn attack_distance(&mut self, attacker: &Unit, from: Cell, target: Cell) -> Result<Option<u32>, AiError> {
        let layer = match attacker.passenger {
            Some(_) => Layer::try_from(attacker.unit_type)?,
            None => Layer::Regular,
        };
        let key = AttackPlanKey::for_unit(self.game, attacker, target);
        Ok(self.distance(&key, from, layer))
    }

    /// Number of keys planned so far
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
