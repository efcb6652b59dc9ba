//! The closed event set accepted by the phase engine, and dispatch outcomes.

use serde::{Deserialize, Serialize};

use super::context::Phase;
use crate::session::UserSlot;

/// An event submitted to the phase engine.
///
/// Serialized with a `type` tag and field names matching the external
/// store's event schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum PhaseEvent {
    /// Propose (or re-propose) the issue under discussion.
    ProposeIssue {
        /// The proposing user.
        user_id: UserSlot,
        /// The issue text.
        issue_statement: String,
    },
    /// Agree with the current issue statement.
    AgreeIssue {
        /// The agreeing user.
        user_id: UserSlot,
    },
    /// Withdraw agreement with the current issue statement.
    RejectIssue {
        /// The rejecting user.
        user_id: UserSlot,
    },
    /// Submit a restatement of the *target* user's perspective.
    SubmitSteelManning {
        /// The author of the summary.
        user_id: UserSlot,
        /// The user whose perspective is being summarized.
        target_user_id: UserSlot,
        /// The summary text.
        content: String,
    },
    /// Agree that the summary of one's own perspective is fair.
    AgreeSteelManning {
        /// The agreeing user.
        user_id: UserSlot,
    },
    /// Reject the summary of one's own perspective.
    RejectSteelManning {
        /// The rejecting user.
        user_id: UserSlot,
    },
    /// Lock one's own position statement.
    LockStatement {
        /// The locking user.
        user_id: UserSlot,
        /// The statement being locked.
        statement: String,
    },
    /// Propose (or re-propose) a resolution.
    ProposeResolution {
        /// The proposing user.
        user_id: UserSlot,
        /// The resolution text.
        resolution: String,
    },
    /// Agree with the current resolution.
    AgreeResolution {
        /// The agreeing user.
        user_id: UserSlot,
    },
    /// Withdraw agreement with the current resolution.
    RejectResolution {
        /// The rejecting user.
        user_id: UserSlot,
    },
    /// Record how one's perspective changed.
    SubmitPerspectiveUpdate {
        /// The submitting user.
        user_id: UserSlot,
        /// The update text.
        update: String,
    },
    /// Submit post-session feedback.
    SubmitFeedback {
        /// The submitting user.
        user_id: UserSlot,
    },
    /// Complete the closure phase, resetting for a new cycle.
    CompleteSession,
    /// Reset the machine from any phase.
    Reset,
}

impl PhaseEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProposeIssue { .. } => "PROPOSE_ISSUE",
            Self::AgreeIssue { .. } => "AGREE_ISSUE",
            Self::RejectIssue { .. } => "REJECT_ISSUE",
            Self::SubmitSteelManning { .. } => "SUBMIT_STEEL_MANNING",
            Self::AgreeSteelManning { .. } => "AGREE_STEEL_MANNING",
            Self::RejectSteelManning { .. } => "REJECT_STEEL_MANNING",
            Self::LockStatement { .. } => "LOCK_STATEMENT",
            Self::ProposeResolution { .. } => "PROPOSE_RESOLUTION",
            Self::AgreeResolution { .. } => "AGREE_RESOLUTION",
            Self::RejectResolution { .. } => "REJECT_RESOLUTION",
            Self::SubmitPerspectiveUpdate { .. } => "SUBMIT_PERSPECTIVE_UPDATE",
            Self::SubmitFeedback { .. } => "SUBMIT_FEEDBACK",
            Self::CompleteSession => "COMPLETE_SESSION",
            Self::Reset => "RESET",
        }
    }

    /// Returns the acting user, if the event carries one.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserSlot> {
        match self {
            Self::ProposeIssue { user_id, .. }
            | Self::AgreeIssue { user_id }
            | Self::RejectIssue { user_id }
            | Self::SubmitSteelManning { user_id, .. }
            | Self::AgreeSteelManning { user_id }
            | Self::RejectSteelManning { user_id }
            | Self::LockStatement { user_id, .. }
            | Self::ProposeResolution { user_id, .. }
            | Self::AgreeResolution { user_id }
            | Self::RejectResolution { user_id }
            | Self::SubmitPerspectiveUpdate { user_id, .. }
            | Self::SubmitFeedback { user_id } => Some(*user_id),
            Self::CompleteSession | Self::Reset => None,
        }
    }
}

/// Record of a phase transition for downstream processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Phase the machine transitioned from.
    pub from: Phase,
    /// Phase the machine transitioned to.
    pub to: Phase,
    /// Wire name of the event that fired the transition.
    pub trigger: &'static str,
}

/// Why an event was dropped without touching phase or context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event is not accepted in the current phase.
    WrongPhase {
        /// Phase the machine was in.
        phase: Phase,
        /// Wire name of the dropped event.
        event: &'static str,
    },
}

/// Result of dispatching one event.
///
/// Dropped events are never errors; callers that need to distinguish
/// "nothing happened" inspect the [`Ignored`](Self::Ignored) reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event's effect was applied to the context.
    Applied {
        /// The transition it fired, if the phase changed.
        transition: Option<Transition>,
    },
    /// The event was dropped; phase and context are unchanged.
    Ignored {
        /// Why the event was dropped.
        reason: IgnoreReason,
    },
}

impl EventOutcome {
    /// True when the event mutated the context.
    #[must_use]
    pub const fn accepted(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Returns the fired transition, if any.
    #[must_use]
    pub const fn transition(&self) -> Option<&Transition> {
        match self {
            Self::Applied { transition } => transition.as_ref(),
            Self::Ignored { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let event = PhaseEvent::ProposeIssue {
            user_id: UserSlot::A,
            issue_statement: "chores".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PROPOSE_ISSUE");
        assert_eq!(json["userId"], "userA");
        assert_eq!(json["issueStatement"], "chores");
    }

    #[test]
    fn steel_manning_event_carries_target() {
        let event = PhaseEvent::SubmitSteelManning {
            user_id: UserSlot::B,
            target_user_id: UserSlot::A,
            content: "their view".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SUBMIT_STEEL_MANNING");
        assert_eq!(json["targetUserId"], "userA");
    }

    #[test]
    fn event_round_trips() {
        let event = PhaseEvent::LockStatement {
            user_id: UserSlot::B,
            statement: "my position".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: PhaseEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn name_matches_wire_tag() {
        assert_eq!(PhaseEvent::Reset.name(), "RESET");
        assert_eq!(
            PhaseEvent::AgreeIssue { user_id: UserSlot::A }.name(),
            "AGREE_ISSUE"
        );
    }

    #[test]
    fn user_id_extraction() {
        assert_eq!(
            PhaseEvent::SubmitFeedback { user_id: UserSlot::B }.user_id(),
            Some(UserSlot::B)
        );
        assert_eq!(PhaseEvent::CompleteSession.user_id(), None);
    }

    #[test]
    fn outcome_accessors() {
        let applied = EventOutcome::Applied {
            transition: Some(Transition {
                from: Phase::Initialization,
                to: Phase::IssueAgreement,
                trigger: "PROPOSE_ISSUE",
            }),
        };
        assert!(applied.accepted());
        assert_eq!(applied.transition().unwrap().to, Phase::IssueAgreement);

        let ignored = EventOutcome::Ignored {
            reason: IgnoreReason::WrongPhase {
                phase: Phase::Closure,
                event: "AGREE_ISSUE",
            },
        };
        assert!(!ignored.accepted());
        assert!(ignored.transition().is_none());
    }
}
