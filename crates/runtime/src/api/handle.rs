//! Cloneable façade for issuing commands to a battle worker.
//!
//! [`BattleHandle`] hides channel plumbing and offers async helpers for
//! submitting selections or streaming events from specific topics.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};

use combat_core::{
    ActionSelection, BattleId, BattleState, CombatError, CostBreakdown, ParticipantId,
    RoundReport, ShareToken, SubmitReceipt,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to one battle.
#[derive(Clone)]
pub struct BattleHandle {
    battle_id: BattleId,
    share_token: ShareToken,
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl BattleHandle {
    pub(crate) fn new(
        battle_id: BattleId,
        share_token: ShareToken,
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            battle_id,
            share_token,
            command_tx,
            event_bus,
        }
    }

    pub fn battle_id(&self) -> BattleId {
        self.battle_id
    }

    pub fn share_token(&self) -> ShareToken {
        self.share_token
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Marks a participant ready. Returns true once the battle has started.
    pub async fn ready(&self, participant: ParticipantId) -> Result<bool> {
        self.request(|reply| Command::Ready { participant, reply })
            .await?
    }

    /// Validates and queues a selection.
    ///
    /// Returns as soon as the worker accepted or rejected it; the round may
    /// resolve right after when this was the last submission.
    pub async fn submit_action(
        &self,
        participant: ParticipantId,
        selection: ActionSelection,
    ) -> Result<SubmitReceipt> {
        self.request(|reply| Command::Submit {
            participant,
            selection,
            reply,
        })
        .await?
    }

    /// Ends the current actor's turn (alternating mode).
    pub async fn advance_turn(&self, participant: ParticipantId) -> Result<RoundReport> {
        self.request(|reply| Command::AdvanceTurn { participant, reply })
            .await?
    }

    pub async fn forfeit(&self, participant: ParticipantId) -> Result<RoundReport> {
        self.request(|reply| Command::Forfeit { participant, reply })
            .await?
    }

    /// Moderator override; ends a pending or active battle.
    pub async fn cancel(&self, reason: impl Into<String>) -> Result<RoundReport> {
        let reason = reason.into();
        self.request(|reply| Command::Cancel { reason, reply }).await?
    }

    /// Query the current battle state (read-only snapshot)
    pub async fn query_state(&self) -> Result<BattleState> {
        self.request(|reply| Command::QueryState { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Round` - Resolved rounds and turns
    /// - `Topic::Vitals` - Damage, healing and resource changes
    /// - `Topic::Battle` - Start and end of the battle
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Read-only view for spectators.
    pub fn spectator(&self) -> Spectator {
        Spectator {
            handle: self.clone(),
        }
    }
}

/// Read-only subscription handed out against a share token.
#[derive(Clone)]
pub struct Spectator {
    handle: BattleHandle,
}

impl Spectator {
    pub fn battle_id(&self) -> BattleId {
        self.handle.battle_id
    }

    pub async fn snapshot(&self) -> Result<BattleState> {
        self.handle.query_state().await
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }
}

/// Flat submission acknowledgement for transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub accepted: bool,
    pub reason: Option<String>,
    pub code: Option<String>,
    pub cost_used: Option<CostBreakdown>,
}

impl SubmissionAck {
    pub fn from_result(result: &Result<SubmitReceipt>) -> Self {
        match result {
            Ok(receipt) => Self {
                accepted: true,
                reason: None,
                code: None,
                cost_used: Some(receipt.cost),
            },
            Err(error) => Self {
                accepted: false,
                reason: Some(error.to_string()),
                code: Some(error.error_code().to_string()),
                cost_used: None,
            },
        }
    }
}
