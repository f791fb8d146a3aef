//! Participant Store: owns every combatant of one battle.

use std::collections::BTreeMap;

use crate::engine::InvariantViolation;

use super::ids::{GridPosition, ParticipantId, Team};
use super::participant::{Participant, ParticipantSpec};

/// Every combatant of one battle, keyed by id.
///
/// Participants are never removed; dead or withdrawn ones stay for logging
/// and spectating and are filtered out of the derived views.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantStore {
    participants: BTreeMap<ParticipantId, Participant>,
}

impl ParticipantStore {
    pub fn from_roster(roster: impl IntoIterator<Item = ParticipantSpec>) -> Self {
        let participants = roster
            .into_iter()
            .map(|spec| (spec.id, Participant::from_spec(spec)))
            .collect();
        Self { participants }
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.values_mut()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    /// Active participants in execution order: descending initiative, ties
    /// broken by ascending id so replays are deterministic.
    ///
    /// Derived on every call, so deaths and withdrawals never need pruning.
    pub fn initiative_order(&self) -> Vec<ParticipantId> {
        let mut order: Vec<(i32, ParticipantId)> = self
            .participants
            .values()
            .filter(|p| p.is_active())
            .map(|p| (p.initiative, p.id))
            .collect();
        order.sort_by(|(ia, a), (ib, b)| ib.cmp(ia).then(a.cmp(b)));
        order.into_iter().map(|(_, id)| id).collect()
    }

    /// Active participant count per team; every roster team is present.
    pub fn active_per_team(&self) -> BTreeMap<Team, usize> {
        let mut counts: BTreeMap<Team, usize> = BTreeMap::new();
        for participant in self.participants.values() {
            let entry = counts.entry(participant.team.clone()).or_default();
            if participant.is_active() {
                *entry += 1;
            }
        }
        counts
    }

    pub fn teams(&self) -> Vec<Team> {
        self.active_per_team().into_keys().collect()
    }

    /// Active participants that have not queued a selection for the open round.
    pub fn awaiting_submission(&self) -> Vec<ParticipantId> {
        self.participants
            .values()
            .filter(|p| p.is_active() && !p.has_submitted)
            .map(|p| p.id)
            .collect()
    }

    /// Living participant standing on `cell`, if any.
    pub fn occupant(&self, cell: GridPosition) -> Option<ParticipantId> {
        self.participants
            .values()
            .find(|p| p.is_alive() && p.position == Some(cell))
            .map(|p| p.id)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.participants
            .values()
            .try_for_each(Participant::check_invariants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{BodyRegion, Element};
    use crate::state::Withdrawal;

    fn store() -> ParticipantStore {
        ParticipantStore::from_roster([
            ParticipantSpec::new(3, "Cato", "beta", 30).with_initiative(10),
            ParticipantSpec::new(1, "Aria", "alpha", 30).with_initiative(10),
            ParticipantSpec::new(2, "Bram", "alpha", 30).with_initiative(15),
            ParticipantSpec::new(4, "Dusk", "beta", 30).with_initiative(1),
        ])
    }

    #[test]
    fn initiative_descends_with_id_tiebreak() {
        let ids: Vec<u32> = store().initiative_order().iter().map(|id| id.0).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn dead_and_withdrawn_drop_out_of_derived_views() {
        let mut store = store();
        store
            .get_mut(ParticipantId(2))
            .unwrap()
            .apply_damage(30, Element::Normal, BodyRegion::Torso, 1)
            .unwrap();
        store.get_mut(ParticipantId(4)).unwrap().withdraw(Withdrawal::Fled);

        let ids: Vec<u32> = store.initiative_order().iter().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 3]);

        let counts = store.active_per_team();
        assert_eq!(counts[&Team::new("alpha")], 1);
        assert_eq!(counts[&Team::new("beta")], 1);
        assert_eq!(store.len(), 4);
    }
}
