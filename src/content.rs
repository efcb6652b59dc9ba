//! Phase-gated store for discussion artifacts.
//!
//! Every mutator takes the session's current phase and rejects writes the
//! phase does not own. Rejections are values ([`WriteRejected`]), not
//! faults; the store is left untouched and the caller decides what to
//! surface. Callers are expected to check the phase before offering the
//! action — the guard here is a safety net.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::WriteRejected;
use crate::ids::{ContentionId, RebuttalId};
use crate::phase::Phase;
use crate::session::{PerUser, UserSlot};

/// Maximum number of contentions each user may raise per session.
pub const MAX_CONTENTIONS_PER_USER: usize = 3;

/// One position point raised during discussion. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contention {
    /// Contention identity.
    pub id: ContentionId,
    /// The user who raised it.
    pub user_id: UserSlot,
    /// Ordinal among the user's contentions (1–3).
    pub contention_number: u8,
    /// The position statement.
    pub statement: String,
    /// Supporting detail for the statement.
    pub supporting_text: String,
    /// When the contention was raised.
    pub created_at: DateTime<Utc>,
}

/// A response to exactly one contention. Immutable once created.
///
/// Holds a non-owning back-reference to its parent by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rebuttal {
    /// Rebuttal identity.
    pub id: RebuttalId,
    /// The contention being responded to.
    pub contention_id: ContentionId,
    /// The responding user.
    pub user_id: UserSlot,
    /// The response text.
    pub content: String,
    /// When the rebuttal was written.
    pub created_at: DateTime<Utc>,
}

/// Phase-aware guarded mutation layer for one session's artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStore {
    /// The agreed issue statement.
    pub issue_statement: Option<String>,
    /// Steel-manning summaries, keyed by the user each summary is about.
    pub steel_manning: PerUser<Option<String>>,
    /// Locked position statements per user.
    pub locked_statements: PerUser<Option<String>>,
    /// All contentions raised this session, in creation order.
    pub contentions: Vec<Contention>,
    /// All rebuttals written this session, in creation order.
    pub rebuttals: Vec<Rebuttal>,
    /// The agreed resolution statement.
    pub resolution_statement: Option<String>,
    /// Perspective updates per user.
    pub perspective_updates: PerUser<Option<String>>,
}

fn require_phase(actual: Phase, expected: Phase, field: &'static str) -> Result<(), WriteRejected> {
    if actual == expected {
        Ok(())
    } else {
        warn!(field, %expected, %actual, "content write rejected: wrong phase");
        Err(WriteRejected::WrongPhase {
            field,
            expected,
            actual,
        })
    }
}

impl ContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the issue statement. Only during issue agreement.
    ///
    /// # Errors
    ///
    /// Rejects with [`WriteRejected::WrongPhase`] outside
    /// [`Phase::IssueAgreement`].
    pub fn set_issue(&mut self, phase: Phase, statement: &str) -> Result<(), WriteRejected> {
        require_phase(phase, Phase::IssueAgreement, "issueStatement")?;
        self.issue_statement = Some(statement.to_string());
        Ok(())
    }

    /// Records the summary written *about* the given user. Only during
    /// steel-manning.
    ///
    /// # Errors
    ///
    /// Rejects with [`WriteRejected::WrongPhase`] outside
    /// [`Phase::SteelManning`].
    pub fn set_steel_manning(
        &mut self,
        phase: Phase,
        about: UserSlot,
        content: &str,
    ) -> Result<(), WriteRejected> {
        require_phase(phase, Phase::SteelManning, "steelManning")?;
        self.steel_manning.set(about, Some(content.to_string()));
        Ok(())
    }

    /// Records a user's locked statement. Only during statement locking.
    ///
    /// # Errors
    ///
    /// Rejects with [`WriteRejected::WrongPhase`] outside
    /// [`Phase::StatementLocking`].
    pub fn set_locked_statement(
        &mut self,
        phase: Phase,
        user: UserSlot,
        statement: &str,
    ) -> Result<(), WriteRejected> {
        require_phase(phase, Phase::StatementLocking, "lockedStatement")?;
        self.locked_statements.set(user, Some(statement.to_string()));
        Ok(())
    }

    /// Raises a new contention for the given user. Only during discussion,
    /// and only while the user is under the per-session quota.
    ///
    /// The ordinal is assigned by the store (the user's count plus one),
    /// so the 1–3 invariant cannot be broken by callers.
    ///
    /// # Errors
    ///
    /// Rejects with [`WriteRejected::WrongPhase`] outside
    /// [`Phase::Discussion`], or [`WriteRejected::ContentionQuota`] once the
    /// user has [`MAX_CONTENTIONS_PER_USER`] contentions.
    pub fn add_contention(
        &mut self,
        phase: Phase,
        user: UserSlot,
        statement: &str,
        supporting_text: &str,
    ) -> Result<ContentionId, WriteRejected> {
        require_phase(phase, Phase::Discussion, "contention")?;
        let count = self.contention_count(user);
        if count >= MAX_CONTENTIONS_PER_USER {
            warn!(%user, "contention rejected: quota reached");
            return Err(WriteRejected::ContentionQuota { user });
        }

        let id = ContentionId::generate();
        self.contentions.push(Contention {
            id: id.clone(),
            user_id: user,
            contention_number: u8::try_from(count + 1).unwrap_or(u8::MAX),
            statement: statement.to_string(),
            supporting_text: supporting_text.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    /// Responds to an existing contention. Only during discussion; no cap.
    ///
    /// # Errors
    ///
    /// Rejects with [`WriteRejected::WrongPhase`] outside
    /// [`Phase::Discussion`], or [`WriteRejected::MissingContention`] when
    /// the parent does not exist.
    pub fn add_rebuttal(
        &mut self,
        phase: Phase,
        user: UserSlot,
        contention_id: &ContentionId,
        content: &str,
    ) -> Result<RebuttalId, WriteRejected> {
        require_phase(phase, Phase::Discussion, "rebuttal")?;
        if !self.contentions.iter().any(|c| &c.id == contention_id) {
            warn!(contention_id = %contention_id, "rebuttal rejected: unknown contention");
            return Err(WriteRejected::MissingContention {
                id: contention_id.clone(),
            });
        }

        let id = RebuttalId::generate();
        self.rebuttals.push(Rebuttal {
            id: id.clone(),
            contention_id: contention_id.clone(),
            user_id: user,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    /// Records the resolution statement. Only during resolution.
    ///
    /// # Errors
    ///
    /// Rejects with [`WriteRejected::WrongPhase`] outside
    /// [`Phase::Resolution`].
    pub fn set_resolution(&mut self, phase: Phase, resolution: &str) -> Result<(), WriteRejected> {
        require_phase(phase, Phase::Resolution, "resolutionStatement")?;
        self.resolution_statement = Some(resolution.to_string());
        Ok(())
    }

    /// Records a user's perspective update. Only during perspective update.
    ///
    /// # Errors
    ///
    /// Rejects with [`WriteRejected::WrongPhase`] outside
    /// [`Phase::PerspectiveUpdate`].
    pub fn set_perspective_update(
        &mut self,
        phase: Phase,
        user: UserSlot,
        update: &str,
    ) -> Result<(), WriteRejected> {
        require_phase(phase, Phase::PerspectiveUpdate, "perspectiveUpdate")?;
        self.perspective_updates.set(user, Some(update.to_string()));
        Ok(())
    }

    /// Returns the given user's contentions, in creation order.
    pub fn contentions_by_user(&self, user: UserSlot) -> impl Iterator<Item = &Contention> {
        self.contentions.iter().filter(move |c| c.user_id == user)
    }

    /// Returns how many contentions the user has raised.
    #[must_use]
    pub fn contention_count(&self, user: UserSlot) -> usize {
        self.contentions_by_user(user).count()
    }

    /// Returns the rebuttals responding to the given contention.
    pub fn rebuttals_by_contention<'a>(
        &'a self,
        contention_id: &'a ContentionId,
    ) -> impl Iterator<Item = &'a Rebuttal> {
        self.rebuttals
            .iter()
            .filter(move |r| &r.contention_id == contention_id)
    }

    /// Clears every artifact back to the empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
