//! Unified error types surfaced by the runtime API.
//!
//! Wraps engine rejections, worker coordination failures, repositories and
//! action providers so clients can bubble them up with consistent context.
use combat_core::{BattleId, CombatError, EngineError, ErrorSeverity, ParticipantId, ShareToken};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("battle {0} is not registered")]
    UnknownBattle(BattleId),

    #[error("no battle is shared under token {0}")]
    UnknownShareToken(ShareToken),

    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("battle worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("action provider failed for {participant}: {reason}")]
    Provider {
        participant: ParticipantId,
        reason: String,
    },
}

impl RuntimeError {
    /// Engine rejection the submitting participant can act on.
    pub fn as_engine(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(error) => Some(error),
            _ => None,
        }
    }
}

impl CombatError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Engine(error) => error.severity(),
            Self::UnknownBattle(_) | Self::UnknownShareToken(_) => ErrorSeverity::Validation,
            Self::Provider { .. } => ErrorSeverity::Recoverable,
            Self::CommandChannelClosed
            | Self::ReplyChannelClosed(_)
            | Self::WorkerJoin(_)
            | Self::Repository(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Engine(error) => error.error_code(),
            Self::UnknownBattle(_) => "UNKNOWN_BATTLE",
            Self::UnknownShareToken(_) => "UNKNOWN_SHARE_TOKEN",
            Self::CommandChannelClosed => "COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "WORKER_JOIN",
            Self::Repository(_) => "REPOSITORY",
            Self::Provider { .. } => "PROVIDER_FAILED",
        }
    }
}
