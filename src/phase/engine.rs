//! Event dispatch for the phase progression engine.
//!
//! The engine owns one [`PhaseContext`] and mutates it synchronously, one
//! event at a time. It never errors: events that don't fit the current
//! phase are dropped with an observable reason, and unmet advancement
//! guards simply leave the machine where it is.

use tracing::{debug, info};

use super::context::{Phase, PhaseContext};
use super::event::{EventOutcome, IgnoreReason, PhaseEvent, Transition};
use super::transition;
use crate::error::TransitionError;
use crate::session::{PerUser, UserSlot};

/// Deterministic state machine for one session's phase progression.
///
/// Effects are applied for the acting user with the other slot preserved,
/// and advancement guards are evaluated on the post-update context — an
/// agreeing user's own vote counts in the very same step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseEngine {
    context: PhaseContext,
}

impl PhaseEngine {
    /// Creates an engine at the initial context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            context: PhaseContext::initial(),
        }
    }

    /// Returns the full context snapshot.
    #[must_use]
    pub const fn context(&self) -> &PhaseContext {
        &self.context
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.context.current_phase
    }

    /// Pre-flight check: could the session jump to `target` right now?
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] identifying either a missing edge or
    /// an unmet guard. Nothing is mutated.
    pub fn can_transition_to(&self, target: Phase) -> Result<(), TransitionError> {
        transition::validate(self.context.current_phase, target, &self.context)
    }

    /// Dispatches one event, mutating the context and possibly the phase.
    ///
    /// Events that are not accepted in the current phase are dropped with
    /// [`EventOutcome::Ignored`]; phase and context stay untouched.
    pub fn send(&mut self, event: &PhaseEvent) -> EventOutcome {
        let from = self.context.current_phase;
        match (from, event) {
            (_, PhaseEvent::Reset) => {
                self.context.reset();
                info!(%from, "session reset to initial context");
                EventOutcome::Applied {
                    transition: Some(Transition {
                        from,
                        to: Phase::Initialization,
                        trigger: "RESET",
                    }),
                }
            }

            (Phase::Initialization, PhaseEvent::ProposeIssue { user_id, issue_statement }) => {
                self.propose_issue(*user_id, issue_statement);
                EventOutcome::Applied {
                    transition: self.advance(Phase::IssueAgreement, "PROPOSE_ISSUE"),
                }
            }
            (Phase::IssueAgreement, PhaseEvent::ProposeIssue { user_id, issue_statement }) => {
                // Re-proposal overwrites the text and resets agreement to
                // the submitter only.
                self.propose_issue(*user_id, issue_statement);
                EventOutcome::Applied { transition: None }
            }
            (Phase::IssueAgreement, PhaseEvent::AgreeIssue { user_id }) => {
                self.context.issue_agreed.set(*user_id, true);
                EventOutcome::Applied {
                    transition: self.advance(Phase::SteelManning, "AGREE_ISSUE"),
                }
            }
            (Phase::IssueAgreement, PhaseEvent::RejectIssue { user_id }) => {
                self.context.issue_agreed.set(*user_id, false);
                EventOutcome::Applied { transition: None }
            }

            (
                Phase::SteelManning,
                PhaseEvent::SubmitSteelManning {
                    target_user_id,
                    content,
                    ..
                },
            ) => {
                // Keyed by the user the summary is about, not its author.
                self.context.steel_manning.set(*target_user_id, Some(content.clone()));
                EventOutcome::Applied { transition: None }
            }
            (Phase::SteelManning, PhaseEvent::AgreeSteelManning { user_id }) => {
                self.context.steel_manning_agreed.set(*user_id, true);
                EventOutcome::Applied {
                    transition: self.advance(Phase::StatementLocking, "AGREE_STEEL_MANNING"),
                }
            }
            (Phase::SteelManning, PhaseEvent::RejectSteelManning { user_id }) => {
                self.context.steel_manning_agreed.set(*user_id, false);
                EventOutcome::Applied { transition: None }
            }

            (Phase::StatementLocking, PhaseEvent::LockStatement { user_id, statement }) => {
                self.context.statements.set(*user_id, Some(statement.clone()));
                self.context.statement_locked.set(*user_id, true);
                EventOutcome::Applied {
                    transition: self.advance(Phase::Discussion, "LOCK_STATEMENT"),
                }
            }

            (Phase::Discussion, PhaseEvent::ProposeResolution { user_id, resolution }) => {
                self.propose_resolution(*user_id, resolution);
                EventOutcome::Applied {
                    transition: self.advance(Phase::Resolution, "PROPOSE_RESOLUTION"),
                }
            }
            (Phase::Resolution, PhaseEvent::ProposeResolution { user_id, resolution }) => {
                self.propose_resolution(*user_id, resolution);
                EventOutcome::Applied { transition: None }
            }
            (Phase::Resolution, PhaseEvent::AgreeResolution { user_id }) => {
                self.context.resolution_agreed.set(*user_id, true);
                EventOutcome::Applied {
                    transition: self.advance(Phase::Summary, "AGREE_RESOLUTION"),
                }
            }
            (Phase::Resolution, PhaseEvent::RejectResolution { user_id }) => {
                self.context.resolution_agreed.set(*user_id, false);
                EventOutcome::Applied { transition: None }
            }

            (Phase::Summary, PhaseEvent::SubmitPerspectiveUpdate { user_id, update }) => {
                self.context.perspective_updates.set(*user_id, Some(update.clone()));
                EventOutcome::Applied {
                    transition: self.advance(Phase::PerspectiveUpdate, "SUBMIT_PERSPECTIVE_UPDATE"),
                }
            }
            (Phase::PerspectiveUpdate, PhaseEvent::SubmitPerspectiveUpdate { user_id, update }) => {
                self.context.perspective_updates.set(*user_id, Some(update.clone()));
                EventOutcome::Applied { transition: None }
            }
            (Phase::PerspectiveUpdate, PhaseEvent::SubmitFeedback { user_id }) => {
                self.context.feedback_submitted.set(*user_id, true);
                EventOutcome::Applied {
                    transition: self.advance(Phase::Closure, "SUBMIT_FEEDBACK"),
                }
            }

            (Phase::Closure, PhaseEvent::CompleteSession) => {
                self.context.reset();
                info!("session cycle completed; context reset");
                EventOutcome::Applied {
                    transition: Some(Transition {
                        from,
                        to: Phase::Initialization,
                        trigger: "COMPLETE_SESSION",
                    }),
                }
            }

            _ => {
                debug!(phase = %from, event = event.name(), "event dropped: wrong phase");
                EventOutcome::Ignored {
                    reason: IgnoreReason::WrongPhase {
                        phase: from,
                        event: event.name(),
                    },
                }
            }
        }
    }

    /// Sets the issue text and resets agreement to the submitter only.
    fn propose_issue(&mut self, user: UserSlot, text: &str) {
        self.context.issue_statement = Some(text.to_string());
        self.context.issue_agreed = PerUser::default().with(user, true);
    }

    /// Sets the resolution text and resets agreement to the submitter only.
    fn propose_resolution(&mut self, user: UserSlot, text: &str) {
        self.context.resolution_statement = Some(text.to_string());
        self.context.resolution_agreed = PerUser::default().with(user, true);
    }

    /// Advances to `to` if the shared table's guard holds on the current
    /// (post-update) context; otherwise stays put.
    fn advance(&mut self, to: Phase, trigger: &'static str) -> Option<Transition> {
        let from = self.context.current_phase;
        if !transition::guard_holds(from, to, &self.context) {
            debug!(%from, %to, trigger, "advance guard not met; staying in phase");
            return None;
        }
        self.context.current_phase = to;
        info!(%from, %to, trigger, "phase transition");
        Some(Transition { from, to, trigger })
    }
}
