//! Derived combat analytics. Never authoritative; rebuildable from the log.

use std::collections::BTreeMap;

use crate::action::Element;
use crate::state::{BattleId, ParticipantId};

use super::entry::{CombatLogEntry, LogPayload};

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantBreakdown {
    pub damage_dealt: BTreeMap<Element, u64>,
    pub damage_received: BTreeMap<Element, u64>,
    pub healing_done: u64,
    pub healing_received: u64,
    pub hits_landed: u32,
    pub hits_blocked: u32,
    pub misses: u32,
    pub criticals: u32,
    pub kills: u32,
    pub dps: Option<f64>,
    pub hps: Option<f64>,
}

impl ParticipantBreakdown {
    pub fn total_damage_dealt(&self) -> u64 {
        self.damage_dealt.values().sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatAnalyticsReport {
    pub battle_id: Option<BattleId>,
    pub rounds: u32,
    pub entries: usize,
    pub total_damage: u64,
    pub total_healing: u64,
    pub damage_by_round: BTreeMap<u32, u64>,
    pub healing_by_round: BTreeMap<u32, u64>,
    pub participants: BTreeMap<ParticipantId, ParticipantBreakdown>,
    pub duration_secs: Option<f64>,
    pub dps: Option<f64>,
    pub hps: Option<f64>,
}

impl CombatAnalyticsReport {
    /// Aggregates `entries`; rates are filled in when the wall-clock
    /// duration of the battle is known and non-zero.
    pub fn from_entries(entries: &[CombatLogEntry], duration: Option<chrono::Duration>) -> Self {
        let mut report = Self {
            battle_id: entries.first().map(|entry| entry.battle_id),
            rounds: entries.iter().map(|entry| entry.round_number).max().unwrap_or(0),
            entries: entries.len(),
            total_damage: 0,
            total_healing: 0,
            damage_by_round: BTreeMap::new(),
            healing_by_round: BTreeMap::new(),
            participants: BTreeMap::new(),
            duration_secs: None,
            dps: None,
            hps: None,
        };

        for entry in entries {
            report.record(entry);
        }

        let seconds = duration
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
            .filter(|secs| *secs > 0.0);
        if let Some(secs) = seconds {
            report.duration_secs = Some(secs);
            report.dps = Some(report.total_damage as f64 / secs);
            report.hps = Some(report.total_healing as f64 / secs);
            for breakdown in report.participants.values_mut() {
                breakdown.dps = Some(breakdown.total_damage_dealt() as f64 / secs);
                breakdown.hps = Some(breakdown.healing_done as f64 / secs);
            }
        }
        report
    }

    fn breakdown(&mut self, id: ParticipantId) -> &mut ParticipantBreakdown {
        self.participants.entry(id).or_default()
    }

    fn record(&mut self, entry: &CombatLogEntry) {
        match &entry.payload {
            LogPayload::Attack {
                element,
                amount,
                critical,
                ..
            }
            | LogPayload::Skill {
                element,
                amount,
                critical,
                ..
            } => {
                let amount = u64::from(*amount);
                self.total_damage += amount;
                *self.damage_by_round.entry(entry.round_number).or_default() += amount;
                if let Some(actor) = entry.actor {
                    let stats = self.breakdown(actor);
                    *stats.damage_dealt.entry(*element).or_default() += amount;
                    stats.hits_landed += 1;
                    if *critical {
                        stats.criticals += 1;
                    }
                }
                if let Some(target) = entry.target {
                    *self
                        .breakdown(target)
                        .damage_received
                        .entry(*element)
                        .or_default() += amount;
                }
            }
            LogPayload::Restoration { .. } => {
                let amount = u64::from(entry.healing_amount);
                if amount == 0 {
                    return;
                }
                self.total_healing += amount;
                *self.healing_by_round.entry(entry.round_number).or_default() += amount;
                if let Some(actor) = entry.actor {
                    self.breakdown(actor).healing_done += amount;
                }
                if let Some(target) = entry.target {
                    self.breakdown(target).healing_received += amount;
                }
            }
            LogPayload::Miss { blocked, .. } => {
                if let Some(actor) = entry.actor {
                    self.breakdown(actor).misses += 1;
                }
                if *blocked && let Some(target) = entry.target {
                    self.breakdown(target).hits_blocked += 1;
                }
            }
            LogPayload::Death { killer, .. } => {
                if let Some(killer) = killer {
                    self.breakdown(*killer).kills += 1;
                }
            }
            LogPayload::System(_) => {}
        }
    }

    pub fn top_damage_dealer(&self) -> Option<ParticipantId> {
        self.participants
            .iter()
            .max_by_key(|(id, stats)| (stats.total_damage_dealt(), std::cmp::Reverse(**id)))
            .filter(|(_, stats)| stats.total_damage_dealt() > 0)
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{BodyRegion, SkillEffect};
    use crate::log::{CombatLog, LogDraft};

    #[test]
    fn aggregates_damage_healing_and_rates() {
        let mut log = CombatLog::new(BattleId::new());
        let hit = |amount| LogPayload::Attack {
            element: Element::Fire,
            region: BodyRegion::Head,
            amount,
            overkill: 0,
            critical: amount > 10,
        };
        log.append(LogDraft::new(1, hit(8)).actor(ParticipantId(1)).target(ParticipantId(2)))
            .unwrap();
        log.append(LogDraft::new(2, hit(12)).actor(ParticipantId(1)).target(ParticipantId(2)))
            .unwrap();
        log.append(
            LogDraft::new(
                2,
                LogPayload::Restoration {
                    skill: "mend".into(),
                    effect: SkillEffect::Heal,
                    amount: 5,
                    resource_cost: 3,
                },
            )
            .actor(ParticipantId(2))
            .target(ParticipantId(2)),
        )
        .unwrap();
        log.append(
            LogDraft::new(
                2,
                LogPayload::Death {
                    participant: ParticipantId(2),
                    killer: Some(ParticipantId(1)),
                },
            )
            .target(ParticipantId(2)),
        )
        .unwrap();

        let report =
            CombatAnalyticsReport::from_entries(log.entries(), Some(chrono::Duration::seconds(10)));
        assert_eq!(report.rounds, 2);
        assert_eq!(report.total_damage, 20);
        assert_eq!(report.total_healing, 5);
        assert_eq!(report.damage_by_round[&2], 12);
        assert_eq!(report.dps, Some(2.0));

        let aria = &report.participants[&ParticipantId(1)];
        assert_eq!(aria.damage_dealt[&Element::Fire], 20);
        assert_eq!(aria.hits_landed, 2);
        assert_eq!(aria.criticals, 1);
        assert_eq!(aria.kills, 1);
        assert_eq!(report.participants[&ParticipantId(2)].healing_received, 5);
        assert_eq!(report.top_damage_dealer(), Some(ParticipantId(1)));
    }

    #[test]
    fn empty_log_has_no_rates() {
        let report = CombatAnalyticsReport::from_entries(&[], None);
        assert_eq!(report.rounds, 0);
        assert!(report.dps.is_none());
        assert!(report.top_damage_dealer().is_none());
    }
}
