//! Deterministic replay from recorded inputs.

use chrono::Utc;

use crate::combat::DamageResolver;
use crate::config::CombatConfig;
use crate::state::{BattleState, RoundRecord};

use super::BattleEngine;
use super::errors::EngineError;

/// Re-applies `records` to `initial` (the battle as created, still pending).
///
/// Recorded selections were validated when they were first accepted and are
/// queued again as-is: a forfeit recorded before a round may postdate the
/// submissions of that round.
///
/// With the same config and resolver the result carries the same log and
/// the same vitals as the battle that produced the records. Timestamps are
/// not part of that guarantee.
pub fn replay(
    initial: BattleState,
    records: &[RoundRecord],
    config: &CombatConfig,
    resolver: &dyn DamageResolver,
) -> Result<BattleState, EngineError> {
    let mut state = initial;
    let now = Utc::now();
    let mut engine = BattleEngine::new(&mut state, config, resolver);

    for record in records {
        match record {
            RoundRecord::Start { ready } => {
                for id in ready {
                    engine.mark_ready(*id)?;
                }
                engine.start(now)?;
            }
            RoundRecord::Round { selections, .. } => {
                for (id, selection) in selections {
                    engine.requeue(*id, selection)?;
                }
                engine.resolve_round(now)?;
            }
            RoundRecord::Turn {
                actor,
                selection,
                timed_out,
                ..
            } => {
                if let Some(selection) = selection {
                    engine.requeue(*actor, selection)?;
                }
                engine.advance_turn(*actor, *timed_out, now)?;
            }
            RoundRecord::Forfeit { participant } => {
                engine.forfeit(*participant, now)?;
            }
            RoundRecord::Cancel { reason } => {
                engine.cancel(reason.clone(), now)?;
            }
        }
    }

    Ok(state)
}
