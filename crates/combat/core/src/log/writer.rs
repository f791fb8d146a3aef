//! Combat Log Writer.
//!
//! Append-only. Sequences start at 1 and increase by exactly one per entry;
//! round numbers never go backwards. The log is owned by the battle's single
//! coordinator, so `&mut self` is the exclusive section that assigns
//! sequences.

use crate::engine::InvariantViolation;
use crate::state::BattleId;

use super::entry::{CombatLogEntry, LogDraft};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLog {
    battle_id: BattleId,
    entries: Vec<CombatLogEntry>,
}

impl CombatLog {
    pub const FIRST_SEQUENCE: u64 = 1;

    pub fn new(battle_id: BattleId) -> Self {
        Self {
            battle_id,
            entries: Vec::new(),
        }
    }

    /// Rebuilds a log from persisted entries, verifying their ordering.
    pub fn from_entries(
        battle_id: BattleId,
        entries: Vec<CombatLogEntry>,
    ) -> Result<Self, InvariantViolation> {
        let log = Self { battle_id, entries };
        log.verify()?;
        Ok(log)
    }

    pub fn battle_id(&self) -> BattleId {
        self.battle_id
    }

    pub fn entries(&self) -> &[CombatLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.entries.last().map(|entry| entry.sequence)
    }

    pub fn next_sequence(&self) -> u64 {
        self.last_sequence().map_or(Self::FIRST_SEQUENCE, |seq| seq + 1)
    }

    /// Entries with a sequence strictly greater than `sequence`.
    pub fn since(&self, sequence: u64) -> &[CombatLogEntry] {
        let start = self.entries.partition_point(|entry| entry.sequence <= sequence);
        &self.entries[start..]
    }

    pub fn append(&mut self, draft: LogDraft) -> Result<u64, InvariantViolation> {
        if let Some(last) = self.entries.last()
            && draft.round_number < last.round_number
        {
            return Err(InvariantViolation::RoundRegressed {
                current: last.round_number,
                found: draft.round_number,
            });
        }

        let sequence = self.next_sequence();
        self.entries.push(CombatLogEntry {
            battle_id: self.battle_id,
            round_number: draft.round_number,
            sequence,
            log_type: draft.payload.log_type(),
            actor: draft.actor,
            target: draft.target,
            damage_amount: draft.payload.damage_amount(),
            healing_amount: draft.payload.healing_amount(),
            message: draft.message,
            tags: draft.tags,
            payload: draft.payload,
        });
        Ok(sequence)
    }

    /// Checks the sequence and round ordering of every entry.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let mut expected = Self::FIRST_SEQUENCE;
        let mut round = 0;
        for entry in &self.entries {
            if entry.sequence != expected {
                return Err(InvariantViolation::SequenceGap {
                    expected,
                    found: entry.sequence,
                });
            }
            if entry.round_number < round {
                return Err(InvariantViolation::RoundRegressed {
                    current: round,
                    found: entry.round_number,
                });
            }
            expected += 1;
            round = entry.round_number;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogPayload, LogType, SystemEvent};
    use crate::state::ParticipantId;

    fn passed(round: u32) -> LogDraft {
        LogDraft::new(round, SystemEvent::TurnPassed { participant: ParticipantId(1) })
    }

    #[test]
    fn sequences_are_gapless_from_one() {
        let mut log = CombatLog::new(BattleId::new());
        assert_eq!(log.append(passed(1)).unwrap(), 1);
        assert_eq!(log.append(passed(1)).unwrap(), 2);
        assert_eq!(log.append(passed(2)).unwrap(), 3);
        assert_eq!(log.since(1).len(), 2);
        assert_eq!(log.entries()[0].log_type, LogType::System);
        log.verify().unwrap();
    }

    #[test]
    fn round_cannot_go_backwards() {
        let mut log = CombatLog::new(BattleId::new());
        log.append(passed(3)).unwrap();
        assert_eq!(
            log.append(passed(2)),
            Err(InvariantViolation::RoundRegressed { current: 3, found: 2 })
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn amounts_come_from_the_payload() {
        let mut log = CombatLog::new(BattleId::new());
        log.append(
            LogDraft::new(
                1,
                LogPayload::Attack {
                    element: crate::action::Element::Fire,
                    region: crate::action::BodyRegion::Head,
                    amount: 12,
                    overkill: 0,
                    critical: false,
                },
            )
            .actor(ParticipantId(1))
            .target(ParticipantId(2)),
        )
        .unwrap();
        let entry = &log.entries()[0];
        assert_eq!(entry.damage_amount, 12);
        assert_eq!(entry.healing_amount, 0);
        assert!(entry.tags.contains("element:fire"));
    }

    #[test]
    fn tampered_entries_fail_verification() {
        let mut log = CombatLog::new(BattleId::new());
        log.append(passed(1)).unwrap();
        log.append(passed(1)).unwrap();
        let mut entries = log.entries().to_vec();
        entries.remove(0);
        assert!(matches!(
            CombatLog::from_entries(log.battle_id(), entries),
            Err(InvariantViolation::SequenceGap { expected: 1, found: 2 })
        ));
    }
}
