//! Position and action evaluation
//!
//! Level 3 - Evaluation
//!
//! Every team gets a non-negative utility, the utilities are then folded into
//! one score for the side we play. Candidate actions also earn an attack term
//! from the attack planner.

use battalion_core::{Action, Bitmap, Building, Cell, Game, Team, Unit};
use serde::{Deserialize, Serialize};

use crate::actions::{BattalionTree, Node};
use crate::error::AiError;
use crate::plan::{AttackPlanner, PlanWeights};
use crate::tree::ValueFunction;

/// Default weight of the enemy in the folded score
pub const DEFAULT_AGGRESSION: f64 = 0.95;

// ============================================================================
// WEIGHTS
// ============================================================================

/// Heuristic weights for position evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    /// Flat bonus for every unit on the board
    pub unit_alive: f64,
    /// Weight of a unit's health
    pub unit_health: f64,
    /// Penalty for a unit standing where an enemy can strike
    pub vulnerable_penalty: f64,
    /// Extra penalty for repairing in the open
    pub repair_vulnerable_penalty: f64,
    /// Bonus for a building that produces units
    pub factory: f64,
    /// Taken off the factory bonus while a unit stands on it
    pub factory_blocked_penalty: f64,
    /// Bonus per production domain a building enables
    pub domain: f64,
    pub money_weight: f64,
    pub money_exponent: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            unit_alive: 30.0,
            unit_health: 1.0,
            vulnerable_penalty: 10.0,
            repair_vulnerable_penalty: 10.0,
            factory: 50.0,
            factory_blocked_penalty: 25.0,
            domain: 20.0,
            money_weight: 0.2,
            money_exponent: 0.8,
        }
    }
}

impl EvalWeights {
    /// Reject weights that could drive a team's utility below zero
    pub fn validate(&self) -> Result<(), AiError> {
        let all = [
            ("unit_alive", self.unit_alive),
            ("unit_health", self.unit_health),
            ("vulnerable_penalty", self.vulnerable_penalty),
            ("repair_vulnerable_penalty", self.repair_vulnerable_penalty),
            ("factory", self.factory),
            ("factory_blocked_penalty", self.factory_blocked_penalty),
            ("domain", self.domain),
            ("money_weight", self.money_weight),
            ("money_exponent", self.money_exponent),
        ];
        for (name, value) in all {
            if !value.is_finite() || value < 0.0 {
                return Err(AiError::InvalidWeights(format!("{} must be finite and non-negative, got {}", name, value)));
            }
        }
        if self.vulnerable_penalty + self.repair_vulnerable_penalty > self.unit_alive {
            return Err(AiError::InvalidWeights(
                "unit penalties exceed the alive bonus".to_string(),
            ));
        }
        if self.factory_blocked_penalty > self.factory {
            return Err(AiError::InvalidWeights(
                "blocked penalty exceeds the factory bonus".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// POSITION EVALUATOR
// ============================================================================

/// Static evaluation of a position
#[derive(Clone, Debug)]
pub struct PositionEvaluator {
    weights: EvalWeights,
    aggression: f64,
}

impl PositionEvaluator {
    pub fn new(weights: EvalWeights, aggression: f64) -> Result<Self, AiError> {
        if !(0.0..=1.0).contains(&aggression) {
            return Err(AiError::InvalidAggression(aggression));
        }
        weights.validate()?;
        Ok(Self { weights, aggression })
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    pub fn aggression(&self) -> f64 {
        self.aggression
    }

    /// Utility of every team, indexed by `Team::index`
    pub fn evaluate(&self, game: &Game) -> Vec<f64> {
        let mut evals = vec![0.0; Team::ALL.len()];
        let threats: Vec<Bitmap> = Team::ALL.iter().map(|&team| threatened_cells(game, team)).collect();

        for (cell, unit) in game.units() {
            let vulnerable = threats[unit.team.index()].contains(cell);
            evals[unit.team.index()] += self.eval_unit(unit, vulnerable);
        }

        // Neutral buildings are worth nothing, even to a team conquering them
        for (cell, building) in game.buildings() {
            let Some(owner) = building.owner else { continue };
            let value = self.eval_building(game, cell, building);
            evals[owner.index()] += value;
            if let Some(team) = building.conquer_team {
                evals[team.index()] += value * building.conquer_fraction();
            }
        }

        for team in Team::ALL {
            let money = game.money(team).max(0) as f64;
            evals[team.index()] += self.weights.money_weight * money.powf(self.weights.money_exponent);
        }
        evals
    }

    /// Fold team utilities into one score for `us`
    pub fn fold(&self, evals: &[f64], us: Team) -> f64 {
        let max_enemy = evals
            .iter()
            .enumerate()
            .filter(|&(team, _)| team != us.index())
            .fold(0.0f64, |acc, (_, &v)| acc.max(v));
        (1.0 - self.aggression) * evals[us.index()] - self.aggression * max_enemy
    }

    /// Score of `game` for `us`. A finished game is worth the extremes.
    pub fn evaluate_for(&self, game: &Game, us: Team) -> f64 {
        if game.is_finished() {
            return terminal_value(game, us);
        }
        self.fold(&self.evaluate(game), us)
    }

    fn eval_unit(&self, unit: &Unit, vulnerable: bool) -> f64 {
        let w = &self.weights;
        let mut health = unit.health as f64;
        if unit.repairing {
            health += unit.repair_amount() as f64 / 2.0;
        }
        let mut eval = w.unit_alive + w.unit_health * health;
        if vulnerable {
            eval -= w.vulnerable_penalty;
            if unit.repairing {
                eval -= w.repair_vulnerable_penalty;
            }
        }
        eval
    }

    fn eval_building(&self, game: &Game, cell: Cell, building: &Building) -> f64 {
        let w = &self.weights;
        let spec = building.spec();
        let mut eval = spec.money_gain as f64;
        if spec.can_build_units {
            eval += w.factory;
            if game.unit(cell).is_some() {
                eval -= w.factory_blocked_penalty;
            }
        }
        let domains = [spec.allow_land, spec.allow_water, spec.allow_air];
        eval += w.domain * domains.iter().filter(|&&d| d).count() as f64;
        eval
    }
}

/// Cells where a unit of `team` could be struck by some opposing unit
fn threatened_cells(game: &Game, team: Team) -> Bitmap {
    let mut threats = Bitmap::empty(game.width(), game.height());
    for (cell, _) in game.units().filter(|(_, u)| u.team != team) {
        threats.union_with(&game.attackable_map(cell));
    }
    threats
}

fn terminal_value(game: &Game, us: Team) -> f64 {
    if game.winner() == Some(us) {
        f64::MAX
    } else {
        -f64::MAX
    }
}

// ============================================================================
// ACTION EVALUATOR
// ============================================================================

/// Rewards positions that bring our units closer to enemies they can hurt
pub struct ActionEvaluator {
    planner: AttackPlanner,
}

impl ActionEvaluator {
    pub fn new(planner: AttackPlanner) -> Self {
        Self { planner }
    }

    pub fn planner(&self) -> &AttackPlanner {
        &self.planner
    }

    /// Sum over our units of the best `damage / (distance + 1)` against a
    /// visible enemy. Distances are planned on `history`, the position the
    /// action was played from.
    pub fn attack_term(&self, history: &Game, position: &Game, us: Team) -> Result<f64, AiError> {
        let mut plans = self.planner.plans_for(history);
        let mut total = 0.0;
        for (cell, unit) in position.units_of(us) {
            let attacker = unit.passenger.as_deref().unwrap_or(unit);
            let mut best: Option<f64> = None;

            for (target_cell, enemy) in position.enemies_seen_by(us) {
                if !attacker.unit_type.can_attack(enemy.unit_type) {
                    continue;
                }
                let Some(distance) = plans.attack_distance(unit, cell, target_cell)? else {
                    continue;
                };
                let score = position.damage(attacker, enemy) as f64 / (distance + 1) as f64;
                best = Some(best.map_or(score, |b: f64| b.max(score)));
            }
            total += best.unwrap_or(0.0);
        }
        Ok(total)
    }
}

// ============================================================================
// VALUE FUNCTION
// ============================================================================

/// The value function the search strategies play Battalion with
pub struct BattalionValue {
    position: PositionEvaluator,
    actions: ActionEvaluator,
}

impl BattalionValue {
    pub fn new(position: PositionEvaluator, actions: ActionEvaluator) -> Self {
        Self { position, actions }
    }

    /// Default weights with the given aggression and cache sizes
    pub fn with_aggression(
        aggression: f64,
        position_capacity: usize,
        plan_capacity: usize,
    ) -> Result<Self, AiError> {
        Ok(Self::new(
            PositionEvaluator::new(EvalWeights::default(), aggression)?,
            ActionEvaluator::new(AttackPlanner::new(PlanWeights::default(), position_capacity, plan_capacity)?),
        ))
    }

    pub fn position_evaluator(&self) -> &PositionEvaluator {
        &self.position
    }

    pub fn action_evaluator(&self) -> &ActionEvaluator {
        &self.actions
    }
}

fn team_of(us: usize) -> Result<Team, AiError> {
    Team::from_index(us).ok_or(AiError::InvalidPlayer(us))
}

impl ValueFunction<BattalionTree> for BattalionValue {
    fn evaluate(&self, position: &Node, us: usize) -> Result<f64, AiError> {
        Ok(self.position.evaluate_for(&position.game, team_of(us)?))
    }

    fn evaluate_action(
        &self,
        history: &Node,
        _action: &Action,
        position: &Node,
        us: usize,
    ) -> Result<f64, AiError> {
        let us = team_of(us)?;
        if position.game.is_finished() {
            return Ok(terminal_value(&position.game, us));
        }
        let eval = self.position.evaluate_for(&position.game, us);
        Ok(eval + self.actions.attack_term(&history.game, &position.game, us)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battalion_core::{BuildingType, Terrain, TerrainMap, UnitType};

    fn c(x: i16, y: i16) -> Cell {
        Cell::new(x, y)
    }

    fn open_board(width: usize, height: usize) -> Game {
        Game::new(TerrainMap::filled(width, height, Terrain::FlatLand), [0, 0])
    }

    fn evaluator() -> PositionEvaluator {
        PositionEvaluator::new(EvalWeights::default(), DEFAULT_AGGRESSION).unwrap()
    }

    #[test]
    fn test_aggression_out_of_range_rejected() {
        for aggression in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                PositionEvaluator::new(EvalWeights::default(), aggression),
                Err(AiError::InvalidAggression(_))
            ));
        }
        assert!(PositionEvaluator::new(EvalWeights::default(), 0.0).is_ok());
        assert!(PositionEvaluator::new(EvalWeights::default(), 1.0).is_ok());
    }

    #[test]
    fn test_inconsistent_weights_rejected() {
        let weights = EvalWeights {
            vulnerable_penalty: 40.0,
            ..EvalWeights::default()
        };
        assert!(matches!(weights.validate(), Err(AiError::InvalidWeights(_))));

        let weights = EvalWeights {
            factory_blocked_penalty: 60.0,
            ..EvalWeights::default()
        };
        assert!(weights.validate().is_err());

        let weights = EvalWeights {
            domain: -1.0,
            ..EvalWeights::default()
        };
        assert!(weights.validate().is_err());
        assert!(EvalWeights::default().validate().is_ok());
    }

    #[test]
    fn test_unit_terms() {
        // Far apart, nobody is threatened
        let game = open_board(12, 1)
            .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
            .with_unit(c(11, 0), Unit::new(UnitType::Soldier, Team::Blue));
        let evals = evaluator().evaluate(&game);
        assert_eq!(evals, vec![80.0, 80.0]);

        // Blue can walk up and strike
        let game = open_board(5, 1)
            .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
            .with_unit(c(4, 0), Unit::new(UnitType::Soldier, Team::Blue));
        let evals = evaluator().evaluate(&game);
        assert_eq!(evals, vec![70.0, 70.0]);
    }

    #[test]
    fn test_repairing_unit_counts_half_the_repair() {
        let mut unit = Unit::new(UnitType::Tank, Team::Red);
        unit.health = 30;
        unit.repairing = true;
        let game = open_board(20, 1)
            .with_unit(c(0, 0), unit)
            .with_unit(c(19, 0), Unit::new(UnitType::Soldier, Team::Blue));
        // 30 alive + 30 health + 35 / 2 in repair
        assert_eq!(evaluator().evaluate(&game)[0], 30.0 + 30.0 + 17.5);
    }

    #[test]
    fn test_repairing_in_reach_of_enemy() {
        let mut unit = Unit::new(UnitType::Tank, Team::Red);
        unit.health = 30;
        unit.repairing = true;
        let game = open_board(5, 1)
            .with_unit(c(0, 0), unit)
            .with_unit(c(4, 0), Unit::new(UnitType::Soldier, Team::Blue));
        let eval = evaluator().evaluate(&game)[0];
        // 30 alive + 30 health + 35 / 2 in repair, less both penalties
        assert_eq!(eval, 30.0 + 30.0 + 17.5 - 10.0 - 10.0);
        assert!(eval >= 0.0);

        // Penalties never outweigh the alive bonus, even at one health
        let mut unit = Unit::new(UnitType::Soldier, Team::Red);
        unit.health = 1;
        unit.repairing = true;
        let game = open_board(5, 1)
            .with_unit(c(0, 0), unit)
            .with_unit(c(4, 0), Unit::new(UnitType::Soldier, Team::Blue));
        assert!(evaluator().evaluate(&game)[0] >= 0.0);
    }

    #[test]
    fn test_building_terms() {
        let mut refinery = Building::new(BuildingType::OilRefinery, None);
        refinery.conquer_team = Some(Team::Blue);
        refinery.conquer_progress = 1;
        let game = open_board(20, 1)
            .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
            .with_unit(c(19, 0), Unit::new(UnitType::Soldier, Team::Blue))
            .with_building(c(0, 0), Building::new(BuildingType::Factory, Some(Team::Red)))
            .with_building(c(1, 0), Building::new(BuildingType::ControllerLand, Some(Team::Red)))
            .with_building(c(10, 0), refinery);
        let evals = evaluator().evaluate(&game);
        // Unit 80, blocked factory 50 - 25, land controller 20
        assert_eq!(evals[0], 80.0 + 25.0 + 20.0);
        // Unit 80, a neutral refinery counts for nobody
        assert_eq!(evals[1], 80.0);
    }

    #[test]
    fn test_conquest_of_owned_building() {
        let mut refinery = Building::new(BuildingType::OilRefinery, Some(Team::Red));
        refinery.conquer_team = Some(Team::Blue);
        refinery.conquer_progress = 1;
        let fraction = refinery.conquer_fraction();
        let game = open_board(20, 1)
            .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
            .with_unit(c(19, 0), Unit::new(UnitType::Soldier, Team::Blue))
            .with_building(c(10, 0), refinery);
        let evals = evaluator().evaluate(&game);
        assert_eq!(evals[0], 80.0 + 20.0);
        assert!((evals[1] - (80.0 + 20.0 * fraction)).abs() < 1e-9);
        assert!(fraction > 0.0 && fraction < 1.0);
    }

    #[test]
    fn test_money_term() {
        let game = Game::new(TerrainMap::filled(10, 1, Terrain::FlatLand), [1024, 0])
            .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
            .with_unit(c(9, 0), Unit::new(UnitType::Turret, Team::Blue));
        let evals = evaluator().evaluate(&game);
        let expected = 0.2 * 1024f64.powf(0.8);
        assert!((evals[0] - 80.0 - expected).abs() < 1e-9);
        assert!(evals.iter().all(|&e| e >= 0.0));
    }

    #[test]
    fn test_fold_and_terminal() {
        let eval = evaluator();
        let folded = eval.fold(&[100.0, 40.0], Team::Red);
        assert!((folded - (0.05 * 100.0 - 0.95 * 40.0)).abs() < 1e-9);

        let won = open_board(3, 1).with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red));
        assert_eq!(eval.evaluate_for(&won, Team::Red), f64::MAX);
        assert_eq!(eval.evaluate_for(&won, Team::Blue), -f64::MAX);
    }

    #[test]
    fn test_attack_term_prefers_closer_attackers() {
        let value = BattalionValue::with_aggression(DEFAULT_AGGRESSION, 8, 8).unwrap();
        let far = open_board(8, 1)
            .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
            .with_unit(c(7, 0), Unit::new(UnitType::Tank, Team::Blue));
        let near = far.apply_action(&Action::Move { unit: c(0, 0), path: vec![c(1, 0), c(2, 0), c(3, 0)] }).unwrap();

        let evaluator = value.action_evaluator();
        // Seven steps of 3 from (0, 0), four from (3, 0)
        let before = evaluator.attack_term(&far, &far, Team::Red).unwrap();
        let after = evaluator.attack_term(&far, &near, Team::Red).unwrap();
        assert!((before - 22.0 / 22.0).abs() < 1e-9);
        assert!((after - 22.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_function_on_finished_game() {
        let value = BattalionValue::with_aggression(DEFAULT_AGGRESSION, 8, 8).unwrap();
        let mut weak = Unit::new(UnitType::Soldier, Team::Blue);
        weak.health = 1;
        let history = Node::new(
            open_board(3, 1)
                .with_unit(c(0, 0), Unit::new(UnitType::Soldier, Team::Red))
                .with_unit(c(1, 0), weak),
        );
        let action = Action::MoveAndAttack { unit: c(0, 0), path: vec![], target: c(1, 0) };
        let child = Node::new(history.game.apply_action(&action).unwrap());

        assert_eq!(value.evaluate_action(&history, &action, &child, 0).unwrap(), f64::MAX);
        assert_eq!(value.evaluate_action(&history, &action, &child, 1).unwrap(), -f64::MAX);
        assert!(matches!(value.evaluate(&child, 7), Err(AiError::InvalidPlayer(7))));
    }

}
