//! Action enumeration and the Battalion game tree
//!
//! Level 2 - Rules binding

use battalion_core::{Action, Cell, Game, UnitType, WeaponKind};

use crate::error::AiError;
use crate::tree::{GameTree, TreePosition};

/// A search node: one owned game position
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Node {
    pub game: Game,
}

impl Node {
    pub fn new(game: Game) -> Self {
        Self { game }
    }
}

impl TreePosition for Node {
    type Action = Action;

    fn is_terminal(&self) -> bool {
        self.game.is_finished()
    }

    fn turn(&self) -> usize {
        self.game.turn().index()
    }

    fn available_actions(&self) -> Vec<Action> {
        available_actions(&self.game)
    }
}

/// Battalion as a two player game tree. Children are cloned positions.
#[derive(Clone, Copy, Debug, Default)]
pub struct BattalionTree;

impl GameTree for BattalionTree {
    type Action = Action;
    type Position = Node;
    type Error = AiError;

    fn number_of_players(&self) -> usize {
        2
    }

    fn apply(&self, position: &Node, action: &Action) -> Result<Node, AiError> {
        Ok(Node::new(position.game.apply_action(action)?))
    }
}

// ============================================================================
// ENUMERATION
// ============================================================================

/// Every legal action of the side to move, `EndTurn` excluded.
///
/// Units come first in board order (attacks, moves, transport, repair),
/// then factories.
pub fn available_actions(game: &Game) -> Vec<Action> {
    if game.is_finished() {
        return Vec::new();
    }
    let us = game.turn();
    let mut actions = Vec::new();

    for (cell, _) in game.units_of(us).filter(|(_, u)| u.active) {
        unit_actions(game, cell, &mut actions);
    }

    for (cell, building) in game.buildings() {
        if building.owner != Some(us) || !building.active || !building.building_type.can_build_units() {
            continue;
        }
        for unit_type in UnitType::ALL {
            if game.can_build_unit(cell, unit_type) {
                actions.push(Action::Build { factory: cell, unit_type });
            }
        }
    }
    actions
}

fn unit_actions(game: &Game, cell: Cell, actions: &mut Vec<Action>) {
    let Some(unit) = game.unit(cell) else { return };
    let reachable = game.reachable_map(cell);

    match unit.unit_type.weapon().kind {
        WeaponKind::CloseRange => {
            for target in game.attackable_map(cell).cells() {
                for stand in target.neighbors() {
                    if !game.is_valid_cell(stand) || !reachable.contains(stand) {
                        continue;
                    }
                    if let Some(path) = game.calc_path(cell, stand) {
                        actions.push(Action::MoveAndAttack { unit: cell, path, target });
                    }
                }
            }
        }
        WeaponKind::LongRange => {
            for target in game.attackable_map(cell).cells() {
                actions.push(Action::AttackAtRange { unit: cell, target });
            }
        }
        WeaponKind::None => {}
    }

    for destination in reachable.cells().filter(|&d| d != cell) {
        if let Some(path) = game.calc_path(cell, destination) {
            actions.push(Action::Move { unit: cell, path });
        }
    }

    for transport in UnitType::TRANSPORTERS {
        if game.can_transport(cell, transport) {
            actions.push(Action::TransportLoad { unit: cell, transport });
        }
    }
    if game.can_finish_transport(cell) {
        actions.push(Action::TransportUnload { unit: cell });
    }

    if game.can_repair(cell) {
        actions.push(Action::Repair { unit: cell });
    }
}
