//! Battle worker that owns the authoritative [`BattleState`].
//!
//! Receives commands from [`crate::BattleHandle`], drives
//! [`combat_core::BattleEngine`], arms the round/turn deadline and publishes
//! results through the gateway. The command inbox is the battle's exclusive
//! section: submissions are validated and the "round ready" decision is made
//! one command at a time.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use combat_core::{
    ActionSelection, BattleEngine, BattleMode, BattleState, BattleStatus, CombatConfig, CombatError,
    Controller, DamageResolver, EngineError, LogPayload, ParticipantId, RoundReport,
    SubmitReceipt, SystemEvent,
};

use crate::api::{ActionProvider, Result};
use crate::events::{BattleEnded, BattleStarted, EventBus, RoundResolved, SyncGateway, VitalsChanged};
use crate::repository::{BattleRepository, LogRepository};

/// Commands that can be sent to the battle worker
pub enum Command {
    Ready {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<bool>>,
    },
    Submit {
        participant: ParticipantId,
        selection: ActionSelection,
        reply: oneshot::Sender<Result<SubmitReceipt>>,
    },
    AdvanceTurn {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<RoundReport>>,
    },
    Forfeit {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<RoundReport>>,
    },
    Cancel {
        reason: String,
        reply: oneshot::Sender<Result<RoundReport>>,
    },
    /// Query the current battle state (read-only).
    QueryState { reply: oneshot::Sender<BattleState> },
}

/// Collaborators shared by every worker an arena spawns.
#[derive(Clone)]
pub struct WorkerServices {
    pub config: Arc<CombatConfig>,
    pub resolver: Arc<dyn DamageResolver>,
    pub provider: Option<Arc<dyn ActionProvider>>,
    pub gateway: Option<Arc<dyn SyncGateway>>,
    pub logs: Option<Arc<dyn LogRepository>>,
    pub battles: Option<Arc<dyn BattleRepository>>,
}

/// Background task that runs one battle.
pub struct BattleWorker {
    state: BattleState,
    services: WorkerServices,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    /// Round (simultaneous) or turn (alternating) deadline.
    deadline: Option<Instant>,
    /// Round number and actor the armed deadline belongs to.
    armed_for: Option<(u32, Option<ParticipantId>)>,
    /// Last log sequence handed to the log repository.
    persisted: u64,
}

impl BattleWorker {
    pub fn new(
        state: BattleState,
        services: WorkerServices,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            target: "runtime::coordinator",
            battle = %state.battle.id,
            mode = %state.battle.mode,
            participants = state.participants.len(),
            "battle worker initialized"
        );
        let persisted = state.log.last_sequence().unwrap_or(0);
        Self {
            state,
            services,
            command_rx,
            event_bus,
            deadline: None,
            armed_for: None,
            persisted,
        }
    }

    /// Main worker loop. Exits once every handle is dropped.
    pub async fn run(mut self) {
        self.ready_ai().await;

        loop {
            let deadline = self.deadline;
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline().await;
                }
            }
        }

        debug!(target: "runtime::coordinator", battle = %self.state.battle.id, "battle worker stopped");
    }

    fn engine(&mut self) -> BattleEngine<'_> {
        BattleEngine::new(
            &mut self.state,
            &self.services.config,
            self.services.resolver.as_ref(),
        )
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Ready { participant, reply } => {
                let result = self.handle_ready(participant).await;
                if reply.send(result).is_err() {
                    debug!("Ready reply channel closed (caller dropped)");
                }
            }
            Command::Submit {
                participant,
                selection,
                reply,
            } => {
                let result = self.engine().submit(participant, &selection);
                let round_ready = match &result {
                    Ok(receipt) => {
                        debug!(
                            target: "runtime::coordinator",
                            battle = %self.state.battle.id,
                            participant = %participant,
                            cost = receipt.cost.total,
                            "selection queued"
                        );
                        receipt.round_ready
                    }
                    Err(rejection) => {
                        debug!(
                            target: "runtime::coordinator",
                            battle = %self.state.battle.id,
                            participant = %participant,
                            code = rejection.error_code(),
                            "selection rejected: {rejection}"
                        );
                        false
                    }
                };
                // Acknowledge before resolving so the caller never waits on the round.
                if reply.send(result.map_err(Into::into)).is_err() {
                    debug!("Submit reply channel closed (caller dropped)");
                }
                if round_ready {
                    let outcome = self.engine().resolve_round(Utc::now());
                    self.after_step(outcome).await;
                }
            }
            Command::AdvanceTurn { participant, reply } => {
                let outcome = self.engine().advance_turn(participant, false, Utc::now());
                let reply_value = outcome.clone().map_err(Into::into);
                self.after_step(outcome).await;
                if reply.send(reply_value).is_err() {
                    debug!("AdvanceTurn reply channel closed (caller dropped)");
                }
            }
            Command::Forfeit { participant, reply } => {
                let outcome = self.engine().forfeit(participant, Utc::now());
                if outcome.is_ok() {
                    info!(target: "runtime::coordinator", battle = %self.state.battle.id, participant = %participant, "participant forfeited");
                }
                let reply_value = outcome.clone().map_err(Into::into);
                self.after_step(outcome).await;
                if reply.send(reply_value).is_err() {
                    debug!("Forfeit reply channel closed (caller dropped)");
                }
            }
            Command::Cancel { reason, reply } => {
                let outcome = self.engine().cancel(reason, Utc::now());
                let reply_value = outcome.clone().map_err(Into::into);
                self.after_step(outcome).await;
                if reply.send(reply_value).is_err() {
                    debug!("Cancel reply channel closed (caller dropped)");
                }
            }
            Command::QueryState { reply } => {
                if reply.send(self.state.clone()).is_err() {
                    debug!("QueryState reply channel closed (caller dropped)");
                }
            }
        }
    }

    async fn handle_ready(&mut self, participant: ParticipantId) -> Result<bool> {
        self.engine().mark_ready(participant)?;
        Ok(self.try_start().await)
    }

    /// Starts once the whole roster is ready. A startable but incomplete
    /// roster opens the lobby window instead; stragglers are withdrawn when
    /// it closes.
    async fn try_start(&mut self) -> bool {
        if !self.engine().can_start() {
            return false;
        }
        if !self.state.participants.iter().all(|p| p.ready) {
            if self.deadline.is_none() {
                debug!(target: "runtime::coordinator", battle = %self.state.battle.id, "lobby window opened");
                self.deadline = Some(Instant::now() + self.services.config.round_deadline());
            }
            return false;
        }
        let outcome = self.engine().start(Utc::now());
        let started = outcome.is_ok();
        self.after_step(outcome).await;
        started
    }

    /// AI stand-ins are ready from the moment the battle is registered.
    async fn ready_ai(&mut self) {
        match self.state.battle.status() {
            BattleStatus::Active => self.open_round().await,
            BattleStatus::Completed => {}
            BattleStatus::Pending => {
                let ai: Vec<ParticipantId> = self
                    .state
                    .participants
                    .iter()
                    .filter(|p| p.controller == Controller::Ai)
                    .map(|p| p.id)
                    .collect();
                for participant in ai {
                    if let Err(error) = self.engine().mark_ready(participant) {
                        warn!(target: "runtime::coordinator", participant = %participant, "could not ready AI participant: {error}");
                    }
                }
                self.try_start().await;
            }
        }
    }

    async fn on_deadline(&mut self) {
        self.deadline = None;
        let battle = self.state.battle.id;
        let outcome = match (self.state.battle.status(), self.state.battle.mode) {
            (BattleStatus::Completed, _) => return,
            (BattleStatus::Pending, _) => {
                info!(
                    target: "runtime::coordinator",
                    battle = %battle,
                    "lobby window closed, starting with the ready roster"
                );
                self.engine().start(Utc::now())
            }
            (BattleStatus::Active, BattleMode::SimultaneousRound) => {
                warn!(
                    target: "runtime::coordinator",
                    battle = %battle,
                    round = self.state.battle.round_number,
                    missing = ?self.state.participants.awaiting_submission(),
                    "round deadline passed, auto-resolving"
                );
                self.engine().resolve_round(Utc::now())
            }
            (BattleStatus::Active, BattleMode::AlternatingTurn) => {
                let Some(actor) = self.state.battle.current_actor else {
                    return;
                };
                warn!(target: "runtime::coordinator", battle = %battle, participant = %actor, "turn timed out");
                self.engine().advance_turn(actor, true, Utc::now())
            }
        };
        self.after_step(outcome).await;
    }

    /// Publishes and persists a step, then opens whatever comes next.
    async fn after_step(&mut self, outcome: std::result::Result<RoundReport, EngineError>) {
        match outcome {
            Ok(report) => {
                self.publish(&report);
                self.persist();
                self.open_round().await;
            }
            Err(error) if error.severity().is_internal() => {
                error!(
                    target: "runtime::coordinator",
                    battle = %self.state.battle.id,
                    round = self.state.battle.round_number,
                    code = error.error_code(),
                    "round aborted: {error}"
                );
                // Nothing was committed; give the round another full window.
                self.deadline = None;
                self.arm_deadline();
            }
            Err(error) => {
                debug!(target: "runtime::coordinator", battle = %self.state.battle.id, "step rejected: {error}");
            }
        }
    }

    fn gateways(&self) -> Vec<&dyn SyncGateway> {
        let mut gateways: Vec<&dyn SyncGateway> = vec![&self.event_bus];
        if let Some(gateway) = &self.services.gateway {
            gateways.push(gateway.as_ref());
        }
        gateways
    }

    fn publish(&self, report: &RoundReport) {
        let battle_id = self.state.battle.id;
        let started = report.entries.iter().any(|entry| {
            matches!(
                entry.payload,
                LogPayload::System(SystemEvent::BattleStarted { .. })
            )
        });

        if started {
            info!(target: "runtime::coordinator", battle = %battle_id, order = ?self.state.battle.initiative_order, "battle started");
            for gateway in self.gateways() {
                gateway.on_battle_started(BattleStarted {
                    battle_id,
                    initiative_order: self.state.battle.initiative_order.clone(),
                    entries: report.entries.clone(),
                });
            }
        } else if !report.entries.is_empty() {
            info!(
                target: "runtime::coordinator",
                battle = %battle_id,
                round = report.round,
                entries = report.entries.len(),
                "round resolved"
            );
            for gateway in self.gateways() {
                gateway.on_round_resolved(RoundResolved {
                    battle_id,
                    round_number: report.round,
                    entries: report.entries.clone(),
                    vitals: report.vitals.clone(),
                    next_actor: report.next_actor,
                });
            }
        }

        for change in &report.vitals {
            for gateway in self.gateways() {
                gateway.on_vitals_changed(VitalsChanged {
                    battle_id,
                    change: change.clone(),
                });
            }
        }

        if let Some(result) = &report.outcome {
            info!(target: "runtime::coordinator", battle = %battle_id, %result, rounds = self.state.battle.round_number, "battle ended");
            for gateway in self.gateways() {
                gateway.on_battle_ended(BattleEnded {
                    battle_id,
                    result: result.clone(),
                    rounds: self.state.battle.round_number,
                    entries: report.entries.clone(),
                });
            }
        }
    }

    /// Best effort: failures are logged and retried with the next step.
    fn persist(&mut self) {
        let battle_id = self.state.battle.id;
        if let Some(logs) = &self.services.logs {
            let fresh = self.state.log.since(self.persisted);
            match logs.append(battle_id, fresh) {
                Ok(()) => self.persisted = self.state.log.last_sequence().unwrap_or(self.persisted),
                Err(error) => warn!(target: "runtime::coordinator", battle = %battle_id, "log persistence failed: {error}"),
            }
        }
        if self.state.battle.is_completed()
            && let Some(battles) = &self.services.battles
            && let Err(error) = battles.save(&self.state)
        {
            warn!(target: "runtime::coordinator", battle = %battle_id, "snapshot persistence failed: {error}");
        }
    }

    /// Starts a fresh window when a new round or turn has opened. A step
    /// that leaves the round and actor unchanged (a forfeit, say) keeps the
    /// running deadline.
    fn arm_deadline(&mut self) {
        let battle = &self.state.battle;
        if !battle.is_active() {
            self.deadline = None;
            self.armed_for = None;
            return;
        }
        let phase = (battle.round_number, battle.current_actor);
        if self.deadline.is_some() && self.armed_for == Some(phase) {
            return;
        }
        let window = match battle.mode {
            BattleMode::SimultaneousRound => self.services.config.round_deadline(),
            BattleMode::AlternatingTurn => self.services.config.turn_time_limit(),
        };
        self.deadline = Some(Instant::now() + window);
        self.armed_for = Some(phase);
    }

    /// Arms the deadline, lets AI stand-ins act for the round or turn that
    /// just opened and resolves a simultaneous round as soon as nobody is
    /// left to wait for.
    async fn open_round(&mut self) {
        loop {
            self.arm_deadline();
            if !self.state.battle.is_active() {
                return;
            }
            let provider = self.services.provider.clone();

            let step = match self.state.battle.mode {
                BattleMode::SimultaneousRound => {
                    if let Some(provider) = &provider {
                        let waiting: Vec<ParticipantId> = self
                            .state
                            .participants
                            .awaiting_submission()
                            .into_iter()
                            .filter(|id| self.is_ai(*id))
                            .collect();
                        for participant in waiting {
                            self.ask(provider.as_ref(), participant).await;
                        }
                    }
                    if !self.engine().is_round_ready() {
                        return;
                    }
                    self.engine().resolve_round(Utc::now())
                }
                BattleMode::AlternatingTurn => {
                    let Some(provider) = provider else {
                        return;
                    };
                    let Some(actor) = self.state.battle.current_actor else {
                        return;
                    };
                    if !self.is_ai(actor) {
                        return;
                    }
                    // A failed provider still ends the turn, as a pass.
                    self.ask(provider.as_ref(), actor).await;
                    self.engine().advance_turn(actor, false, Utc::now())
                }
            };

            match step {
                Ok(report) => {
                    self.publish(&report);
                    self.persist();
                }
                Err(error) => {
                    error!(target: "runtime::coordinator", battle = %self.state.battle.id, "AI step aborted: {error}");
                    self.deadline = None;
                    self.arm_deadline();
                    return;
                }
            }
        }
    }

    fn is_ai(&self, participant: ParticipantId) -> bool {
        self.state
            .participants
            .get(participant)
            .is_some_and(|p| p.controller == Controller::Ai)
    }

    /// Queues the provider's selection; failures fall back to the timeout default.
    async fn ask(&mut self, provider: &dyn ActionProvider, participant: ParticipantId) {
        let selection = match provider
            .provide_selection(participant, &self.state, &self.services.config)
            .await
        {
            Ok(selection) => selection,
            Err(error) => {
                warn!(target: "runtime::coordinator", participant = %participant, "action provider failed: {error}");
                return;
            }
        };
        if let Err(error) = self.engine().submit(participant, &selection) {
            warn!(target: "runtime::coordinator", participant = %participant, "AI selection rejected: {error}");
        }
    }
}
