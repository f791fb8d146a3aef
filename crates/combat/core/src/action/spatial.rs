//! Position-aware budget extension for tactical (grid) matches.
//!
//! Movement resolves before anything else in a turn, so reach is measured
//! from the destination when the selection includes a move. Reach comes
//! from the priced attack, after the inner calculator has looked it up in
//! the loadout.

use crate::state::{GridPosition, Participant, ParticipantStore};

use super::budget::{ActionBudget, BudgetCalculator, BudgetVerdict};
use super::error::ValidationError;
use super::types::{ActionSelection, CombatAction};

#[derive(Clone, Copy, Debug)]
pub struct GridBudgetCalculator<'a> {
    inner: BudgetCalculator<'a>,
}

impl<'a> GridBudgetCalculator<'a> {
    pub fn new(inner: BudgetCalculator<'a>) -> Self {
        Self { inner }
    }

    fn in_bounds(&self, cell: GridPosition) -> bool {
        let grid = &self.inner.config().grid;
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < grid.width && (cell.y as u32) < grid.height
    }
}

impl ActionBudget for GridBudgetCalculator<'_> {
    fn evaluate(
        &self,
        selection: &ActionSelection,
        actor: &Participant,
        store: &ParticipantStore,
    ) -> Result<BudgetVerdict, ValidationError> {
        let moves: Vec<GridPosition> = selection
            .actions
            .iter()
            .filter_map(|action| match action {
                CombatAction::Move(movement) => Some(movement.to),
                _ => None,
            })
            .collect();
        if moves.len() > 1 {
            return Err(ValidationError::MultipleMoves);
        }

        let origin = actor
            .position
            .ok_or(ValidationError::NoPosition { participant: actor.id })?;

        let mut move_cost = 0;
        let standing = match moves.first().copied() {
            Some(to) if to != origin => {
                if !self.in_bounds(to) {
                    return Err(ValidationError::OutOfBounds { to });
                }
                if store.occupant(to).is_some() {
                    return Err(ValidationError::CellOccupied { to });
                }
                let distance = origin.distance(to);
                if distance > actor.move_range {
                    return Err(ValidationError::MoveTooFar {
                        distance,
                        range: actor.move_range,
                    });
                }
                move_cost = distance.saturating_mul(self.inner.config().grid.move_cost_per_tile);
                to
            }
            _ => origin,
        };

        let without_move = ActionSelection::new(
            selection
                .actions
                .iter()
                .filter(|action| !matches!(action, CombatAction::Move(_)))
                .cloned()
                .collect(),
        );
        let mut verdict = self
            .inner
            .compute_cost(&without_move, actor, store, move_cost)?;

        for attack in verdict.selection.attacks() {
            let Some(target) = store.get(attack.target) else {
                return Err(ValidationError::UnknownTarget { target: attack.target });
            };
            let Some(target_cell) = target.position else {
                return Err(ValidationError::NoPosition { participant: target.id });
            };
            let distance = standing.distance(target_cell);
            if distance > attack.reach {
                return Err(ValidationError::OutOfReach {
                    target: attack.target,
                    distance,
                    reach: attack.reach,
                });
            }
        }

        if move_cost > 0 && !verdict.selection.wants_to_flee() {
            verdict
                .selection
                .actions
                .insert(0, CombatAction::Move(super::MoveAction { to: standing }));
        }
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{AttackAction, BodyRegion};
    use crate::config::CombatConfig;
    use crate::state::{ParticipantId, ParticipantSpec};

    fn board() -> ParticipantStore {
        ParticipantStore::from_roster([
            ParticipantSpec::new(1, "Aria", "alpha", 50).with_position(GridPosition::new(0, 0)),
            ParticipantSpec::new(2, "Bram", "beta", 50).with_position(GridPosition::new(4, 0)),
        ])
    }

    #[test]
    fn attack_reach_is_measured_from_the_destination() {
        let config = CombatConfig::default();
        let store = board();
        let actor = store.get(ParticipantId(1)).unwrap();
        let grid = GridBudgetCalculator::new(BudgetCalculator::new(&config));

        let strike = AttackAction::new("strike", ParticipantId(2), BodyRegion::Torso);
        let from_here = ActionSelection::pass().attack(strike.clone());
        assert!(matches!(
            grid.evaluate(&from_here, actor, &store),
            Err(ValidationError::OutOfReach { distance: 4, .. })
        ));

        let after_move = ActionSelection::pass()
            .move_to(GridPosition::new(3, 0))
            .attack(strike);
        let verdict = grid.evaluate(&after_move, actor, &store).unwrap();
        assert_eq!(verdict.cost.movement, 15);
        assert_eq!(verdict.cost.total, 35);
        assert!(verdict.selection.movement().is_some());
    }

    #[test]
    fn submitted_reach_is_ignored() {
        let config = CombatConfig::default();
        let store = board();
        let actor = store.get(ParticipantId(1)).unwrap();
        let grid = GridBudgetCalculator::new(BudgetCalculator::new(&config));

        let mut long_arm = AttackAction::new("strike", ParticipantId(2), BodyRegion::Torso);
        long_arm.reach = 10;
        let selection = ActionSelection::pass().attack(long_arm);
        assert_eq!(
            grid.evaluate(&selection, actor, &store),
            Err(ValidationError::OutOfReach {
                target: ParticipantId(2),
                distance: 4,
                reach: 1,
            })
        );
    }

    #[test]
    fn movement_limits() {
        let config = CombatConfig::default();
        let store = board();
        let actor = store.get(ParticipantId(1)).unwrap();
        let grid = GridBudgetCalculator::new(BudgetCalculator::new(&config));

        let occupied = ActionSelection::pass().move_to(GridPosition::new(4, 0));
        assert!(matches!(
            grid.evaluate(&occupied, actor, &store),
            Err(ValidationError::CellOccupied { .. })
        ));

        let far = ActionSelection::pass().move_to(GridPosition::new(0, 5));
        assert!(matches!(
            grid.evaluate(&far, actor, &store),
            Err(ValidationError::MoveTooFar { distance: 5, range: 3 })
        ));

        let outside = ActionSelection::pass().move_to(GridPosition::new(-1, 0));
        assert!(matches!(
            grid.evaluate(&outside, actor, &store),
            Err(ValidationError::OutOfBounds { .. })
        ));

        let twice = ActionSelection::pass()
            .move_to(GridPosition::new(1, 0))
            .move_to(GridPosition::new(2, 0));
        assert_eq!(grid.evaluate(&twice, actor, &store), Err(ValidationError::MultipleMoves));
    }

    #[test]
    fn base_calculator_rejects_movement() {
        let config = CombatConfig::default();
        let store = board();
        let actor = store.get(ParticipantId(1)).unwrap();
        let selection = ActionSelection::pass().move_to(GridPosition::new(1, 0));
        assert_eq!(
            BudgetCalculator::new(&config).evaluate(&selection, actor, &store),
            Err(ValidationError::MovementNotAllowed)
        );
    }
}
