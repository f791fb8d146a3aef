//! Outcome Detector.

use crate::state::{BattleResult, ParticipantId, ParticipantStore, Team, Withdrawal};

pub struct OutcomeDetector;

impl OutcomeDetector {
    /// Decides whether the battle ends after a resolution step.
    ///
    /// `withdrawn` lists participants who fled or forfeited during the step;
    /// when the last opposing team emptied through withdrawal rather than
    /// death the result is [`BattleResult::Fled`].
    pub fn evaluate(
        store: &ParticipantStore,
        withdrawn: &[ParticipantId],
        round: u32,
        max_rounds: Option<u32>,
    ) -> Option<BattleResult> {
        let standing: Vec<Team> = store
            .active_per_team()
            .into_iter()
            .filter(|(_, active)| *active > 0)
            .map(|(team, _)| team)
            .collect();

        match standing.as_slice() {
            [] => Some(BattleResult::Draw),
            [winner] => {
                let quitter = withdrawn.iter().rev().copied().find(|id| {
                    store.get(*id).is_some_and(|p| {
                        &p.team != winner
                            && matches!(p.withdrawal(), Some(Withdrawal::Fled | Withdrawal::Forfeited))
                    })
                });
                Some(match quitter {
                    Some(by) => BattleResult::Fled {
                        by,
                        winner: winner.clone(),
                    },
                    None => BattleResult::Victory {
                        team: winner.clone(),
                    },
                })
            }
            _ => match max_rounds {
                Some(cap) if round >= cap => Some(BattleResult::Draw),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{BodyRegion, Element};
    use crate::state::ParticipantSpec;

    fn store() -> ParticipantStore {
        ParticipantStore::from_roster([
            ParticipantSpec::new(1, "Aria", "alpha", 10),
            ParticipantSpec::new(2, "Bram", "beta", 10),
            ParticipantSpec::new(3, "Cato", "beta", 10),
        ])
    }

    fn kill(store: &mut ParticipantStore, id: u32) {
        store
            .get_mut(ParticipantId(id))
            .unwrap()
            .apply_damage(10, Element::Normal, BodyRegion::Torso, 1)
            .unwrap();
    }

    #[test]
    fn battle_continues_while_two_teams_stand() {
        let mut store = store();
        kill(&mut store, 2);
        assert_eq!(OutcomeDetector::evaluate(&store, &[], 1, None), None);
    }

    #[test]
    fn last_team_standing_wins() {
        let mut store = store();
        kill(&mut store, 1);
        assert_eq!(
            OutcomeDetector::evaluate(&store, &[], 1, None),
            Some(BattleResult::Victory { team: Team::new("beta") })
        );
    }

    #[test]
    fn mutual_kill_is_a_draw() {
        let mut store = store();
        kill(&mut store, 1);
        kill(&mut store, 2);
        kill(&mut store, 3);
        assert_eq!(OutcomeDetector::evaluate(&store, &[], 1, None), Some(BattleResult::Draw));
    }

    #[test]
    fn withdrawal_that_empties_a_team_is_a_flee_result() {
        let mut store = store();
        store.get_mut(ParticipantId(1)).unwrap().withdraw(Withdrawal::Fled);
        assert_eq!(
            OutcomeDetector::evaluate(&store, &[ParticipantId(1)], 1, None),
            Some(BattleResult::Fled { by: ParticipantId(1), winner: Team::new("beta") })
        );
    }

    #[test]
    fn round_cap_draws() {
        let store = store();
        assert_eq!(OutcomeDetector::evaluate(&store, &[], 4, Some(5)), None);
        assert_eq!(OutcomeDetector::evaluate(&store, &[], 5, Some(5)), Some(BattleResult::Draw));
    }
}
