//! Detection-flag lifecycle and review-count bookkeeping.
//!
//! Flags arrive from an external content-analysis service; this store only
//! manages their lifecycle: `active → challenged → {confirmed, overturned}`,
//! with the last two terminal. A per-issue review counter tracks challenge
//! attempts and increments on every challenge of a live flag, including a
//! re-challenge of an already-challenged one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FlagRejected;
use crate::ids::{FlagId, SessionId};

/// The closed set of detected unproductive patterns.
///
/// Serialized under the external detector's category codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagCategory {
    /// Persistent reality denial.
    #[serde(rename = "G1")]
    RealityDenial,
    /// Minimizing one's own action.
    #[serde(rename = "G2_1")]
    MinimizingOwnAction,
    /// Dismissing the other user's stated impact.
    #[serde(rename = "G2_2")]
    DismissingStatedImpact,
    /// Consistent blame-shifting.
    #[serde(rename = "G3")]
    BlameShifting,
    /// Severe language.
    #[serde(rename = "C")]
    SevereLanguage,
}

impl FlagCategory {
    /// Returns the detector's category code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::RealityDenial => "G1",
            Self::MinimizingOwnAction => "G2_1",
            Self::DismissingStatedImpact => "G2_2",
            Self::BlameShifting => "G3",
            Self::SevereLanguage => "C",
        }
    }
}

/// Lifecycle status of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStatus {
    /// Raised by the detector, not yet disputed.
    Active,
    /// Disputed by the flagged user, awaiting review.
    Challenged,
    /// Upheld by manual review. Terminal.
    Confirmed,
    /// Rejected by manual review. Terminal.
    Overturned,
}

impl FlagStatus {
    /// True for the two review verdict states, which never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Overturned)
    }

    /// Returns the store-facing status name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Challenged => "challenged",
            Self::Confirmed => "confirmed",
            Self::Overturned => "overturned",
        }
    }
}

/// What kind of discussion text a flag points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// The flag targets a contention.
    Contention,
    /// The flag targets a rebuttal.
    Rebuttal,
}

/// Outcome of a manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVerdict {
    /// The flag stands.
    Confirmed,
    /// The flag was raised in error.
    Overturned,
}

/// A detection marker attached to one piece of discussion text.
///
/// Field names mirror the external store's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    /// Flag identity.
    pub id: FlagId,
    /// The session the flagged text belongs to.
    pub session_id: SessionId,
    /// Whether the target is a contention or a rebuttal.
    #[serde(rename = "targetTextType")]
    pub target_kind: TargetKind,
    /// Identity of the flagged contention or rebuttal.
    pub target_text_id: String,
    /// Detected pattern category.
    #[serde(rename = "flagType")]
    pub category: FlagCategory,
    /// Excerpt of the text that triggered the detection.
    #[serde(rename = "flaggedContent")]
    pub excerpt: String,
    /// The detector's explanation of the pattern.
    pub explanation: String,
    /// The single user the flag is shown to.
    pub visible_to_user_id: String,
    /// Current lifecycle status.
    pub status: FlagStatus,
    /// When the flag was challenged, if it was.
    pub challenged_at: Option<DateTime<Utc>>,
    /// Manual review verdict, once one exists.
    pub manual_review_status: Option<ReviewVerdict>,
    /// Reviewer's note, if any.
    pub manual_review_note: Option<String>,
    /// When the flag was created.
    pub created_at: DateTime<Utc>,
}

/// Creation request for a flag, as produced by the external detector.
///
/// Identity, status, and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlag {
    /// The session the flagged text belongs to.
    pub session_id: SessionId,
    /// Whether the target is a contention or a rebuttal.
    pub target_kind: TargetKind,
    /// Identity of the flagged contention or rebuttal.
    pub target_text_id: String,
    /// Detected pattern category.
    pub category: FlagCategory,
    /// Excerpt of the text that triggered the detection.
    pub excerpt: String,
    /// The detector's explanation of the pattern.
    pub explanation: String,
    /// The single user the flag is shown to.
    pub visible_to_user_id: String,
}

/// Flag lifecycle store for one session's flags and review counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagStore {
    flags: Vec<Flag>,
    review_counts: HashMap<String, u32>,
}

impl FlagStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an active flag from a detector request. No phase restriction.
    ///
    /// Returns the generated flag id.
    pub fn add_flag(&mut self, new: NewFlag) -> FlagId {
        let id = FlagId::generate();
        debug!(flag_id = %id, category = new.category.code(), "flag created");
        self.flags.push(Flag {
            id: id.clone(),
            session_id: new.session_id,
            target_kind: new.target_kind,
            target_text_id: new.target_text_id,
            category: new.category,
            excerpt: new.excerpt,
            explanation: new.explanation,
            visible_to_user_id: new.visible_to_user_id,
            status: FlagStatus::Active,
            challenged_at: None,
            manual_review_status: None,
            manual_review_note: None,
            created_at: Utc::now(),
        });
        id
    }

    /// Challenges a flag, recording the challenge timestamp and bumping the
    /// per-issue review counter.
    ///
    /// The counter counts challenge *attempts*: re-challenging an
    /// already-challenged flag increments it again.
    ///
    /// # Errors
    ///
    /// Rejects with [`FlagRejected::NotFound`] for an unknown flag, or
    /// [`FlagRejected::Terminal`] for a flag already confirmed or
    /// overturned; neither case touches the counter.
    pub fn challenge_flag(&mut self, flag_id: &FlagId, issue_id: &str) -> Result<(), FlagRejected> {
        let flag = self.live_flag_mut(flag_id)?;
        flag.status = FlagStatus::Challenged;
        flag.challenged_at = Some(Utc::now());
        *self.review_counts.entry(issue_id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    /// Records a manual-review verdict, moving the flag to its terminal
    /// status.
    ///
    /// # Errors
    ///
    /// Rejects with [`FlagRejected::NotFound`] for an unknown flag, or
    /// [`FlagRejected::Terminal`] when a verdict already exists.
    pub fn set_manual_review_status(
        &mut self,
        flag_id: &FlagId,
        verdict: ReviewVerdict,
        note: Option<String>,
    ) -> Result<(), FlagRejected> {
        let flag = self.live_flag_mut(flag_id)?;
        flag.manual_review_status = Some(verdict);
        flag.manual_review_note = note;
        flag.status = match verdict {
            ReviewVerdict::Confirmed => FlagStatus::Confirmed,
            ReviewVerdict::Overturned => FlagStatus::Overturned,
        };
        Ok(())
    }

    /// Directly overrides a live flag's status, bypassing the challenge
    /// path. Used by automated re-evaluation.
    ///
    /// # Errors
    ///
    /// Rejects with [`FlagRejected::NotFound`] for an unknown flag, or
    /// [`FlagRejected::Terminal`] for a flag already confirmed or
    /// overturned.
    pub fn update_status(&mut self, flag_id: &FlagId, status: FlagStatus) -> Result<(), FlagRejected> {
        let flag = self.live_flag_mut(flag_id)?;
        flag.status = status;
        Ok(())
    }

    fn live_flag_mut(&mut self, flag_id: &FlagId) -> Result<&mut Flag, FlagRejected> {
        let Some(flag) = self.flags.iter_mut().find(|f| &f.id == flag_id) else {
            warn!(flag_id = %flag_id, "flag mutation rejected: not found");
            return Err(FlagRejected::NotFound {
                id: flag_id.clone(),
            });
        };
        if flag.status.is_terminal() {
            warn!(flag_id = %flag_id, status = flag.status.as_str(), "flag mutation rejected: terminal");
            return Err(FlagRejected::Terminal {
                id: flag_id.clone(),
                status: flag.status.as_str(),
            });
        }
        Ok(flag)
    }

    /// Looks up a flag by id.
    #[must_use]
    pub fn flag(&self, flag_id: &FlagId) -> Option<&Flag> {
        self.flags.iter().find(|f| &f.id == flag_id)
    }

    /// Returns the flags visible to the given user.
    pub fn flags_for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Flag> {
        self.flags.iter().filter(move |f| f.visible_to_user_id == user_id)
    }

    /// Returns the flags attached to the given target text.
    pub fn flags_for_target<'a>(&'a self, target_text_id: &'a str) -> impl Iterator<Item = &'a Flag> {
        self.flags.iter().filter(move |f| f.target_text_id == target_text_id)
    }

    /// Returns how many challenges have been raised for the given issue.
    #[must_use]
    pub fn review_count(&self, issue_id: &str) -> u32 {
        self.review_counts.get(issue_id).copied().unwrap_or(0)
    }

    /// Clears all flags and review counts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_flag(visible_to: &str, target: &str) -> NewFlag {
        NewFlag {
            session_id: SessionId::new("session-1"),
            target_kind: TargetKind::Contention,
            target_text_id: target.to_string(),
            category: FlagCategory::BlameShifting,
            excerpt: "it's always your fault".to_string(),
            explanation: "shifts responsibility without engaging".to_string(),
            visible_to_user_id: visible_to.to_string(),
        }
    }

    #[test]
    fn added_flag_starts_active() {
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        let flag = store.flag(&id).unwrap();
        assert_eq!(flag.status, FlagStatus::Active);
        assert!(flag.challenged_at.is_none());
        assert!(flag.manual_review_status.is_none());
    }

    #[test]
    fn challenge_sets_status_and_timestamp() {
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        store.challenge_flag(&id, "issue-x").unwrap();

        let flag = store.flag(&id).unwrap();
        assert_eq!(flag.status, FlagStatus::Challenged);
        assert!(flag.challenged_at.is_some());
        assert_eq!(store.review_count("issue-x"), 1);
    }

    #[test]
    fn second_challenge_still_increments_review_count() {
        // Counter counts attempts, not distinct flags challenged.
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        store.challenge_flag(&id, "issue-x").unwrap();
        store.challenge_flag(&id, "issue-x").unwrap();
        assert_eq!(store.review_count("issue-x"), 2);
        assert_eq!(store.flag(&id).unwrap().status, FlagStatus::Challenged);
    }

    #[test]
    fn challenge_of_unknown_flag_does_not_count() {
        let mut store = FlagStore::new();
        let err = store
            .challenge_flag(&FlagId::new("flag-nope"), "issue-x")
            .unwrap_err();
        assert!(matches!(err, FlagRejected::NotFound { .. }));
        assert_eq!(store.review_count("issue-x"), 0);
    }

    #[test]
    fn manual_review_moves_to_terminal_status() {
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        store.challenge_flag(&id, "issue-x").unwrap();
        store
            .set_manual_review_status(&id, ReviewVerdict::Overturned, Some("misfire".to_string()))
            .unwrap();

        let flag = store.flag(&id).unwrap();
        assert_eq!(flag.status, FlagStatus::Overturned);
        assert_eq!(flag.manual_review_status, Some(ReviewVerdict::Overturned));
        assert_eq!(flag.manual_review_note.as_deref(), Some("misfire"));
    }

    #[test]
    fn terminal_flag_rejects_all_further_mutation() {
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        store
            .set_manual_review_status(&id, ReviewVerdict::Confirmed, None)
            .unwrap();

        assert!(matches!(
            store.challenge_flag(&id, "issue-x").unwrap_err(),
            FlagRejected::Terminal { .. }
        ));
        assert!(matches!(
            store.update_status(&id, FlagStatus::Active).unwrap_err(),
            FlagRejected::Terminal { .. }
        ));
        assert!(store
            .set_manual_review_status(&id, ReviewVerdict::Overturned, None)
            .is_err());
        assert_eq!(store.flag(&id).unwrap().status, FlagStatus::Confirmed);
        // Rejected challenge must not have counted.
        assert_eq!(store.review_count("issue-x"), 0);
    }

    #[test]
    fn update_status_bypasses_challenge_path() {
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        store.update_status(&id, FlagStatus::Overturned).unwrap();

        let flag = store.flag(&id).unwrap();
        assert_eq!(flag.status, FlagStatus::Overturned);
        // Direct override records no challenge timestamp or verdict.
        assert!(flag.challenged_at.is_none());
        assert!(flag.manual_review_status.is_none());
    }

    #[test]
    fn queries_filter_by_user_and_target() {
        let mut store = FlagStore::new();
        store.add_flag(new_flag("alice", "contention-1"));
        store.add_flag(new_flag("alice", "contention-2"));
        store.add_flag(new_flag("bob", "contention-1"));

        assert_eq!(store.flags_for_user("alice").count(), 2);
        assert_eq!(store.flags_for_user("bob").count(), 1);
        assert_eq!(store.flags_for_user("mallory").count(), 0);
        assert_eq!(store.flags_for_target("contention-1").count(), 2);
    }

    #[test]
    fn review_count_defaults_to_zero() {
        let store = FlagStore::new();
        assert_eq!(store.review_count("issue-never-seen"), 0);
    }

    #[test]
    fn reset_clears_flags_and_counts() {
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        store.challenge_flag(&id, "issue-x").unwrap();

        store.reset();
        assert!(store.flag(&id).is_none());
        assert_eq!(store.review_count("issue-x"), 0);
    }

    #[test]
    fn flag_serializes_with_store_field_names() {
        let mut store = FlagStore::new();
        let id = store.add_flag(new_flag("alice", "contention-1"));
        let json = serde_json::to_value(store.flag(&id).unwrap()).unwrap();
        assert_eq!(json["flagType"], "G3");
        assert_eq!(json["targetTextType"], "contention");
        assert_eq!(json["flaggedContent"], "it's always your fault");
        assert_eq!(json["status"], "active");
        assert_eq!(json["visibleToUserId"], "alice");
    }
}
