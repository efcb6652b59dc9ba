//! The phase state set and the full mutable context of one session.

use serde::{Deserialize, Serialize};

use crate::session::PerUser;

/// One stage of the fixed nine-stage conflict-resolution workflow.
///
/// Serialized values match the external store's phase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for either user to propose an issue.
    Initialization,
    /// An issue has been proposed; both users must agree on it.
    IssueAgreement,
    /// Each user restates the other's perspective.
    SteelManning,
    /// Each user locks their own position statement.
    StatementLocking,
    /// Structured point/counterpoint discussion.
    Discussion,
    /// A resolution has been proposed; both users must agree on it.
    Resolution,
    /// Reviewing the agreed resolution.
    Summary,
    /// Each user records how their perspective changed.
    PerspectiveUpdate,
    /// Post-session reflection; completes back to initialization.
    Closure,
}

impl Phase {
    /// Every phase, in workflow order.
    pub const ALL: [Self; 9] = [
        Self::Initialization,
        Self::IssueAgreement,
        Self::SteelManning,
        Self::StatementLocking,
        Self::Discussion,
        Self::Resolution,
        Self::Summary,
        Self::PerspectiveUpdate,
        Self::Closure,
    ];

    /// Returns the store-facing phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::IssueAgreement => "issue_agreement",
            Self::SteelManning => "steel_manning",
            Self::StatementLocking => "statement_locking",
            Self::Discussion => "discussion",
            Self::Resolution => "resolution",
            Self::Summary => "summary",
            Self::PerspectiveUpdate => "perspective_update",
            Self::Closure => "closure",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full mutable state of the phase machine for one session.
///
/// Every "agreed" / "locked" / "submitted" pair is keyed per participant
/// slot so partial agreement is always representable. Steel-manning
/// summaries are keyed by the user the summary is *about* (slot A holds
/// B's restatement of A's perspective).
///
/// Field names mirror the external store's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseContext {
    /// Phase the machine is currently in.
    pub current_phase: Phase,
    /// The proposed or agreed issue statement.
    pub issue_statement: Option<String>,
    /// Per-user agreement with the current issue statement.
    pub issue_agreed: PerUser<bool>,
    /// Steel-manning summaries, keyed by the user each summary is about.
    pub steel_manning: PerUser<Option<String>>,
    /// Per-user agreement that the summary of their perspective is fair.
    pub steel_manning_agreed: PerUser<bool>,
    /// Each user's own position statement.
    pub statements: PerUser<Option<String>>,
    /// Per-user statement lock flags.
    pub statement_locked: PerUser<bool>,
    /// The proposed or agreed resolution statement.
    pub resolution_statement: Option<String>,
    /// Per-user agreement with the current resolution.
    pub resolution_agreed: PerUser<bool>,
    /// Each user's post-resolution perspective update.
    pub perspective_updates: PerUser<Option<String>>,
    /// Per-user feedback submission flags.
    pub feedback_submitted: PerUser<bool>,
}

impl PhaseContext {
    /// The all-empty context every session starts from (and resets to).
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            current_phase: Phase::Initialization,
            issue_statement: None,
            issue_agreed: PerUser::new(false, false),
            steel_manning: PerUser::new(None, None),
            steel_manning_agreed: PerUser::new(false, false),
            statements: PerUser::new(None, None),
            statement_locked: PerUser::new(false, false),
            resolution_statement: None,
            resolution_agreed: PerUser::new(false, false),
            perspective_updates: PerUser::new(None, None),
            feedback_submitted: PerUser::new(false, false),
        }
    }

    /// Restores the initial context in place.
    pub fn reset(&mut self) {
        *self = Self::initial();
    }
}

impl Default for PhaseContext {
    fn default() -> Self {
        Self::initial()
    }
}
