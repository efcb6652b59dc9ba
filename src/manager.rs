//! Session registry composing the engine, content store, and flag store.
//!
//! The manager owns all live sessions and is the only mutation entry point.
//! Each session's state sits behind its own mutex inside a concurrent map,
//! so independent sessions never contend and every event within one session
//! is applied atomically: engine dispatch, content mirroring, and the
//! session record update happen under one lock.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use tracing::{info, warn};

use crate::content::ContentStore;
use crate::error::{AccordError, Result, SessionError};
use crate::flags::{Flag, FlagStatus, FlagStore, NewFlag, ReviewVerdict};
use crate::ids::{ContentionId, FlagId, RebuttalId, SessionId};
use crate::phase::{EventOutcome, Phase, PhaseContext, PhaseEngine, PhaseEvent};
use crate::session::{Session, UserSlot};

/// Everything belonging to one session, mutated under one lock.
#[derive(Debug)]
struct SessionState {
    session: Session,
    engine: PhaseEngine,
    content: ContentStore,
    flags: FlagStore,
}

/// Concurrent registry of live sessions.
///
/// Shared across callers by reference; all methods take `&self`.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<SessionId, Mutex<SessionState>>,
}

impl SessionManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new active session between the two given users and
    /// registers it.
    pub fn create_session(
        &self,
        user_a: impl Into<String>,
        user_b: impl Into<String>,
    ) -> SessionId {
        let id = SessionId::generate();
        let session = Session::new(id.clone(), user_a, user_b);
        info!(session_id = %id, "session created");
        self.sessions.insert(
            id.clone(),
            Mutex::new(SessionState {
                session,
                engine: PhaseEngine::new(),
                content: ContentStore::new(),
                flags: FlagStore::new(),
            }),
        );
        id
    }

    /// Runs `f` under the session's lock.
    fn with_state<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut SessionState) -> Result<R>,
    ) -> Result<R> {
        let entry = self
            .sessions
            .get(id)
            .ok_or_else(|| SessionError::NotFound { id: id.clone() })?;
        let mut state = entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    fn with_active_state<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut SessionState) -> Result<R>,
    ) -> Result<R> {
        self.with_state(id, |state| {
            if !state.session.is_active {
                warn!(session_id = %id, "mutation rejected: session inactive");
                return Err(SessionError::Inactive { id: id.clone() }.into());
            }
            f(state)
        })
    }

    /// Dispatches one event into the session's engine.
    ///
    /// On an applied event the session record and the content store are
    /// brought in line with the new context in the same locked step.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError`] when the session is unknown or inactive.
    /// Dropped events are not errors; they come back as
    /// [`EventOutcome::Ignored`].
    pub fn send(&self, id: &SessionId, event: &PhaseEvent) -> Result<EventOutcome> {
        self.with_active_state(id, |state| {
            let phase_before = state.engine.phase();
            let outcome = state.engine.send(event);
            if outcome.accepted() {
                Self::sync_after_event(state, event, phase_before, &outcome)?;
                state.session.updated_at = Utc::now();
            }
            Ok(outcome)
        })
    }

    /// Mirrors an applied event into the session record and content store.
    fn sync_after_event(
        state: &mut SessionState,
        event: &PhaseEvent,
        phase_before: Phase,
        outcome: &EventOutcome,
    ) -> Result<()> {
        state.session.current_phase = state.engine.phase();
        match event {
            PhaseEvent::ProposeIssue { user_id, issue_statement } => {
                state.session.issue_statement = Some(issue_statement.clone());
                state.session.issue_proposed_by =
                    Some(state.session.user_id(*user_id).to_string());
                state.session.issue_agreed_at = None;
                state.content.set_issue(state.engine.phase(), issue_statement)?;
            }
            PhaseEvent::AgreeIssue { .. } => {
                if outcome.transition().is_some_and(|t| t.to == Phase::SteelManning) {
                    state.session.issue_agreed_at = Some(Utc::now());
                }
            }
            PhaseEvent::SubmitSteelManning { target_user_id, content, .. } => {
                state
                    .content
                    .set_steel_manning(state.engine.phase(), *target_user_id, content)?;
            }
            PhaseEvent::LockStatement { user_id, statement } => {
                // The second lock advances the phase, so gate on the phase
                // the lock landed in.
                state
                    .content
                    .set_locked_statement(phase_before, *user_id, statement)?;
            }
            PhaseEvent::ProposeResolution { resolution, .. } => {
                state.content.set_resolution(state.engine.phase(), resolution)?;
            }
            PhaseEvent::SubmitPerspectiveUpdate { user_id, update } => {
                state
                    .content
                    .set_perspective_update(state.engine.phase(), *user_id, update)?;
            }
            PhaseEvent::CompleteSession => {
                state.session.completed_at = Some(Utc::now());
                state.session.is_active = false;
                info!(session_id = %state.session.id, "session completed");
            }
            PhaseEvent::Reset => {
                Self::clear_session_record(&mut state.session);
                state.content.reset();
            }
            PhaseEvent::RejectIssue { .. }
            | PhaseEvent::AgreeSteelManning { .. }
            | PhaseEvent::RejectSteelManning { .. }
            | PhaseEvent::AgreeResolution { .. }
            | PhaseEvent::RejectResolution { .. }
            | PhaseEvent::SubmitFeedback { .. } => {}
        }
        Ok(())
    }

    fn clear_session_record(session: &mut Session) {
        session.current_phase = Phase::Initialization;
        session.issue_statement = None;
        session.issue_proposed_by = None;
        session.issue_agreed_at = None;
    }

    /// Pre-flight check against the session's current phase and context.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions, or
    /// surfaces the [`TransitionError`](crate::error::TransitionError) the
    /// validator reports.
    pub fn check_transition(&self, id: &SessionId, target: Phase) -> Result<()> {
        self.with_state(id, |state| {
            state
                .engine
                .can_transition_to(target)
                .map_err(AccordError::from)
        })
    }

    /// Resets the session back to the initial phase, clearing the context,
    /// all content, and all flags.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError`] when the session is unknown or inactive.
    pub fn reset_session(&self, id: &SessionId) -> Result<()> {
        self.with_active_state(id, |state| {
            state.engine.send(&PhaseEvent::Reset);
            state.content.reset();
            state.flags.reset();
            Self::clear_session_record(&mut state.session);
            state.session.updated_at = Utc::now();
            info!(session_id = %id, "session fully reset");
            Ok(())
        })
    }

    /// Marks the session inactive without completing it. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn deactivate(&self, id: &SessionId) -> Result<()> {
        self.with_state(id, |state| {
            state.session.is_active = false;
            state.session.updated_at = Utc::now();
            info!(session_id = %id, "session deactivated");
            Ok(())
        })
    }

    /// Resolves an external user id to its slot in the session.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotAParticipant`] when the user is in
    /// neither slot.
    pub fn slot_of(&self, id: &SessionId, user_id: &str) -> Result<UserSlot> {
        self.with_state(id, |state| {
            state
                .session
                .slot_of(user_id)
                .ok_or_else(|| {
                    SessionError::NotAParticipant {
                        id: id.clone(),
                        user_id: user_id.to_string(),
                    }
                    .into()
                })
        })
    }

    /// Returns a copy of the session record.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn session(&self, id: &SessionId) -> Result<Session> {
        self.with_state(id, |state| Ok(state.session.clone()))
    }

    /// Returns a copy of the session's engine context.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn context(&self, id: &SessionId) -> Result<PhaseContext> {
        self.with_state(id, |state| Ok(state.engine.context().clone()))
    }

    /// Returns the session's current phase.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn phase(&self, id: &SessionId) -> Result<Phase> {
        self.with_state(id, |state| Ok(state.engine.phase()))
    }

    /// Returns a copy of the session's content store.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn content(&self, id: &SessionId) -> Result<ContentStore> {
        self.with_state(id, |state| Ok(state.content.clone()))
    }

    /// Serializes the session record and engine context as one JSON value.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions, or
    /// [`AccordError::Json`] if serialization fails.
    pub fn snapshot(&self, id: &SessionId) -> Result<serde_json::Value> {
        self.with_state(id, |state| {
            Ok(json!({
                "session": serde_json::to_value(&state.session)?,
                "context": serde_json::to_value(state.engine.context())?,
            }))
        })
    }

    /// Raises a contention for the given user during discussion.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError`] for unknown or inactive sessions,
    /// [`SessionError::NotAParticipant`] for outsiders, or the store's
    /// [`WriteRejected`](crate::error::WriteRejected) reasons.
    pub fn add_contention(
        &self,
        id: &SessionId,
        user_id: &str,
        statement: &str,
        supporting_text: &str,
    ) -> Result<ContentionId> {
        self.with_active_state(id, |state| {
            let slot = Self::participant(state, id, user_id)?;
            let phase = state.engine.phase();
            state
                .content
                .add_contention(phase, slot, statement, supporting_text)
                .map_err(AccordError::from)
        })
    }

    /// Responds to an existing contention during discussion.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`add_contention`](Self::add_contention), plus
    /// a rejection for an unknown parent contention.
    pub fn add_rebuttal(
        &self,
        id: &SessionId,
        user_id: &str,
        contention_id: &ContentionId,
        content: &str,
    ) -> Result<RebuttalId> {
        self.with_active_state(id, |state| {
            let slot = Self::participant(state, id, user_id)?;
            let phase = state.engine.phase();
            state
                .content
                .add_rebuttal(phase, slot, contention_id, content)
                .map_err(AccordError::from)
        })
    }

    fn participant(state: &SessionState, id: &SessionId, user_id: &str) -> Result<UserSlot> {
        state.session.slot_of(user_id).ok_or_else(|| {
            SessionError::NotAParticipant {
                id: id.clone(),
                user_id: user_id.to_string(),
            }
            .into()
        })
    }

    /// Registers a detector flag against the session.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError`] for unknown or inactive sessions.
    pub fn add_flag(&self, id: &SessionId, new: NewFlag) -> Result<FlagId> {
        self.with_active_state(id, |state| Ok(state.flags.add_flag(new)))
    }

    /// Challenges a flag on behalf of the user it was shown to.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError`] for unknown or inactive sessions, or the
    /// flag store's [`FlagRejected`](crate::error::FlagRejected) reasons.
    pub fn challenge_flag(
        &self,
        id: &SessionId,
        flag_id: &FlagId,
        issue_id: &str,
    ) -> Result<()> {
        self.with_active_state(id, |state| {
            state
                .flags
                .challenge_flag(flag_id, issue_id)
                .map_err(AccordError::from)
        })
    }

    /// Records a manual-review verdict for a challenged flag.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError`] for unknown or inactive sessions, or the
    /// flag store's rejection reasons.
    pub fn review_flag(
        &self,
        id: &SessionId,
        flag_id: &FlagId,
        verdict: ReviewVerdict,
        note: Option<String>,
    ) -> Result<()> {
        self.with_active_state(id, |state| {
            state
                .flags
                .set_manual_review_status(flag_id, verdict, note)
                .map_err(AccordError::from)
        })
    }

    /// Directly overrides a live flag's status.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError`] for unknown or inactive sessions, or the
    /// flag store's rejection reasons.
    pub fn update_flag_status(
        &self,
        id: &SessionId,
        flag_id: &FlagId,
        status: FlagStatus,
    ) -> Result<()> {
        self.with_active_state(id, |state| {
            state
                .flags
                .update_status(flag_id, status)
                .map_err(AccordError::from)
        })
    }

    /// Returns the flags visible to the given user.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn flags_for_user(&self, id: &SessionId, user_id: &str) -> Result<Vec<Flag>> {
        self.with_state(id, |state| {
            Ok(state.flags.flags_for_user(user_id).cloned().collect())
        })
    }

    /// Returns the flags attached to the given target text.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn flags_for_target(&self, id: &SessionId, target_text_id: &str) -> Result<Vec<Flag>> {
        self.with_state(id, |state| {
            Ok(state.flags.flags_for_target(target_text_id).cloned().collect())
        })
    }

    /// Returns how many flag challenges exist for the given issue.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotFound`] for unknown sessions.
    pub fn review_count(&self, id: &SessionId, issue_id: &str) -> Result<u32> {
        self.with_state(id, |state| Ok(state.flags.review_count(issue_id)))
    }
}
