//! Battle registry and builder.
//!
//! The arena spawns one [`BattleWorker`] per battle and keeps a handle to
//! each so clients and spectators can find it again. Battles never share
//! mutable state; the arena only routes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

use combat_core::{
    BattleId, BattleState, CombatConfig, DamageResolver, ShareToken, StandardResolver,
};

use crate::api::{ActionProvider, BattleHandle, Result, RuntimeError, Spectator};
use crate::events::{EventBus, SyncGateway};
use crate::repository::{BattleRepository, LogRepository};
use crate::workers::{BattleWorker, WorkerServices};

/// Runtime configuration shared across the arena and its workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

struct Entry {
    handle: BattleHandle,
    task: JoinHandle<()>,
}

/// Registry of running battles.
///
/// Design: the arena owns workers; [`BattleHandle`] is the cloneable façade
/// clients keep.
pub struct Arena {
    config: RuntimeConfig,
    services: WorkerServices,
    battles: Arc<RwLock<HashMap<BattleId, Entry>>>,
}

impl Arena {
    /// Create a new arena builder
    pub fn builder() -> ArenaBuilder {
        ArenaBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Registers a pending battle and spawns its worker.
    ///
    /// AI-controlled participants are marked ready right away.
    pub async fn create_battle(&self, state: BattleState) -> Result<BattleHandle> {
        let battle_id = state.battle.id;
        let share_token = state.battle.share_token;

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let handle = BattleHandle::new(battle_id, share_token, command_tx, event_bus.clone());

        let worker = BattleWorker::new(state, self.services.clone(), command_rx, event_bus);
        let task = tokio::spawn(worker.run());

        self.battles.write().await.insert(
            battle_id,
            Entry {
                handle: handle.clone(),
                task,
            },
        );
        tracing::info!(target: "runtime::arena", battle = %battle_id, "battle registered");
        Ok(handle)
    }

    pub async fn handle(&self, battle: BattleId) -> Result<BattleHandle> {
        self.battles
            .read()
            .await
            .get(&battle)
            .map(|entry| entry.handle.clone())
            .ok_or(RuntimeError::UnknownBattle(battle))
    }

    /// Read-only access for whoever holds the share token.
    pub async fn spectate(&self, token: ShareToken) -> Result<Spectator> {
        self.battles
            .read()
            .await
            .values()
            .find(|entry| entry.handle.share_token() == token)
            .map(|entry| entry.handle.spectator())
            .ok_or(RuntimeError::UnknownShareToken(token))
    }

    pub async fn battle_ids(&self) -> Vec<BattleId> {
        let mut ids: Vec<BattleId> = self.battles.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Drops the arena's handle to `battle` and waits for its worker.
    ///
    /// The worker exits once every other handle is gone too.
    pub async fn remove(&self, battle: BattleId) -> Result<()> {
        let entry = self
            .battles
            .write()
            .await
            .remove(&battle)
            .ok_or(RuntimeError::UnknownBattle(battle))?;
        drop(entry.handle);
        entry.task.await.map_err(RuntimeError::WorkerJoin)
    }

    /// Shutdown every worker gracefully
    pub async fn shutdown(self) -> Result<()> {
        let entries: Vec<Entry> = self.battles.write().await.drain().map(|(_, e)| e).collect();
        for entry in entries {
            drop(entry.handle);
            entry.task.await.map_err(RuntimeError::WorkerJoin)?;
        }
        Ok(())
    }
}

/// Builder for [`Arena`] with flexible configuration.
pub struct ArenaBuilder {
    config: RuntimeConfig,
    resolver: Option<Arc<dyn DamageResolver>>,
    provider: Option<Arc<dyn ActionProvider>>,
    gateway: Option<Arc<dyn SyncGateway>>,
    logs: Option<Arc<dyn LogRepository>>,
    battles: Option<Arc<dyn BattleRepository>>,
}

impl ArenaBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            resolver: None,
            provider: None,
            gateway: None,
            logs: None,
            battles: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override only the combat rules
    pub fn combat_config(mut self, combat: CombatConfig) -> Self {
        self.config.combat = combat;
        self
    }

    /// Damage/healing resolver (default: [`StandardResolver`] over the
    /// configured balance table)
    pub fn resolver(mut self, resolver: impl DamageResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Provider for AI-controlled participants (optional)
    pub fn provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Extra outbound gateway, called next to the per-battle event bus
    pub fn gateway(mut self, gateway: Arc<dyn SyncGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn log_repository(mut self, logs: Arc<dyn LogRepository>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn battle_repository(mut self, battles: Arc<dyn BattleRepository>) -> Self {
        self.battles = Some(battles);
        self
    }

    pub fn build(self) -> Arena {
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(StandardResolver::new(self.config.combat.balance.clone())));
        let services = WorkerServices {
            config: Arc::new(self.config.combat.clone()),
            resolver,
            provider: self.provider,
            gateway: self.gateway,
            logs: self.logs,
            battles: self.battles,
        };
        Arena {
            config: self.config,
            services,
            battles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
