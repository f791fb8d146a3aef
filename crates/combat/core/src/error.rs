//! Common error infrastructure for combat-core.
//!
//! Domain-specific errors live next to the code that raises them
//! ([`crate::action::ValidationError`], [`crate::engine::StateError`],
//! [`crate::engine::InvariantViolation`]). This module holds the shared
//! classification used by the runtime to decide what to surface, what to log
//! and what aborts a round.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller may resubmit a corrected request
/// - **Validation**: the request is invalid in the current state
/// - **Internal**: a resolver or state inconsistency that needs investigation
/// - **Fatal**: battle data is corrupted and the round cannot be committed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Resubmitting with different input may succeed (budget exceeded, bad target).
    Recoverable,

    /// The request does not fit the battle's current state (not active, out of turn).
    Validation,

    /// Unexpected inconsistency produced by a collaborator (e.g. a resolver outcome).
    Internal,

    /// Core invariant broken; the round is aborted without partial application.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_covers_fatal() {
        assert!(ErrorSeverity::Fatal.is_internal());
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert!(ErrorSeverity::Recoverable.is_recoverable());
    }
}
