//! Error types for `accord`.
//!
//! The core raises only phase-transition errors itself (from the transition
//! validator); content and flag writes report rejections as values so every
//! mutation stays a total function over its inputs. The top-level
//! [`AccordError`] aggregates all of them and maps each onto the error
//! taxonomy used by the surrounding application.

use thiserror::Error;

use crate::ids::{ContentionId, FlagId, SessionId};
use crate::phase::Phase;
use crate::session::UserSlot;

/// Error taxonomy of the surrounding application.
///
/// The core only ever produces `Session`, `PhaseTransition`, and `Data`
/// errors; the remaining categories exist so callers can classify errors
/// from external collaborators (auth provider, persistence, detectors)
/// alongside ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Authentication failure.
    Auth,
    /// External API failure.
    Api,
    /// Network failure.
    Network,
    /// Data integrity failure.
    Data,
    /// Input validation failure.
    Validation,
    /// Session lookup or lifecycle failure.
    Session,
    /// Illegal or blocked phase transition.
    PhaseTransition,
    /// UI-layer failure.
    Ui,
    /// Anything unclassified.
    Unknown,
}

impl ErrorCategory {
    /// Returns the store-facing category code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth_error",
            Self::Api => "api_error",
            Self::Network => "network_error",
            Self::Data => "data_error",
            Self::Validation => "validation_error",
            Self::Session => "session_error",
            Self::PhaseTransition => "phase_transition_error",
            Self::Ui => "ui_error",
            Self::Unknown => "unknown_error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a failed phase-transition pre-flight check.
///
/// The only error kind the core raises on its own. The engine's event
/// dispatch never returns these; unmet guards there degrade to an ignored
/// event instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The state graph has no edge between the two phases.
    #[error("invalid phase transition from {from} to {to}")]
    UnknownTransition {
        /// Phase the session is in.
        from: Phase,
        /// Requested target phase.
        to: Phase,
    },

    /// The edge exists but its guard does not hold for the given context.
    #[error("conditions not met for transition from {from} to {to}: requires {requirement}")]
    GuardUnmet {
        /// Phase the session is in.
        from: Phase,
        /// Requested target phase.
        to: Phase,
        /// Human-readable description of the unmet guard.
        requirement: &'static str,
    },
}

/// Session lookup and lifecycle errors raised by the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session with the given id.
    #[error("session not found: {id}")]
    NotFound {
        /// The unknown session id.
        id: SessionId,
    },

    /// The user id does not belong to either participant slot.
    #[error("user {user_id} is not a participant in session {id}")]
    NotAParticipant {
        /// The offending session.
        id: SessionId,
        /// The external user id.
        user_id: String,
    },

    /// The session has been deactivated or completed.
    #[error("session {id} is no longer active")]
    Inactive {
        /// The inactive session id.
        id: SessionId,
    },
}

/// A content write rejected by the phase-gated store.
///
/// Rejections are reported values, not faults: the store is left untouched
/// and the caller decides whether to surface the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteRejected {
    /// The field is owned by a different phase.
    #[error("cannot write {field} during {actual} (requires {expected})")]
    WrongPhase {
        /// Name of the field being written.
        field: &'static str,
        /// Phase that owns the field.
        expected: Phase,
        /// Phase the session is actually in.
        actual: Phase,
    },

    /// The user already has the maximum number of contentions.
    #[error("{user} already has the maximum number of contentions")]
    ContentionQuota {
        /// The slot that hit the quota.
        user: UserSlot,
    },

    /// A rebuttal referenced a contention that does not exist.
    #[error("no contention with id {id}")]
    MissingContention {
        /// The unknown parent id.
        id: ContentionId,
    },
}

/// A flag mutation rejected by the flag store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagRejected {
    /// No flag with the given id.
    #[error("flag not found: {id}")]
    NotFound {
        /// The unknown flag id.
        id: FlagId,
    },

    /// The flag has reached a terminal status and cannot change again.
    #[error("flag {id} has terminal status {status}")]
    Terminal {
        /// The flag id.
        id: FlagId,
        /// The terminal status it holds.
        status: &'static str,
    },
}

/// Top-level error type aggregating everything the crate can report.
#[derive(Debug, Error)]
pub enum AccordError {
    /// Phase-transition pre-flight failure.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Session lookup or lifecycle failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Rejected content write.
    #[error(transparent)]
    Content(#[from] WriteRejected),

    /// Rejected flag mutation.
    #[error(transparent)]
    Flag(#[from] FlagRejected),

    /// JSON serialization failure (snapshots).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccordError {
    /// Maps the error onto the application-wide taxonomy.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Transition(_) => ErrorCategory::PhaseTransition,
            Self::Session(_) => ErrorCategory::Session,
            Self::Content(_) | Self::Flag(_) => ErrorCategory::Validation,
            Self::Json(_) => ErrorCategory::Data,
        }
    }
}

/// Result type alias for `accord` operations.
pub type Result<T> = std::result::Result<T, AccordError>;
