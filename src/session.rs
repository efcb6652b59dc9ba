//! Participant slots, per-user keyed state, and the session record.
//!
//! A session always has exactly two participants. All "agreed" / "locked" /
//! "submitted" booleans in the workflow are keyed per slot via [`PerUser`]
//! so partial agreement is always representable; nothing in the core ever
//! aggregates the pair into a single flag before both sides are inspected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;
use crate::phase::Phase;

/// One of the two fixed participant slots in a session.
///
/// Serialized as `"userA"` / `"userB"` to match the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserSlot {
    /// The first participant.
    #[serde(rename = "userA")]
    A,
    /// The second participant.
    #[serde(rename = "userB")]
    B,
}

impl UserSlot {
    /// Returns the opposite slot.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Returns the store-facing name of the slot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "userA",
            Self::B => "userB",
        }
    }
}

impl std::fmt::Display for UserSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pair of values keyed by participant slot.
///
/// Updates go through [`set`](Self::set) (or the pure [`with`](Self::with)),
/// which touch exactly one slot and preserve the other. Guards that must see
/// a just-applied vote therefore read the updated pair directly instead of
/// reconstructing it from conditionals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerUser<T> {
    /// Value for [`UserSlot::A`].
    #[serde(rename = "userA")]
    pub a: T,
    /// Value for [`UserSlot::B`].
    #[serde(rename = "userB")]
    pub b: T,
}

impl<T> PerUser<T> {
    /// Creates a pair from both values.
    pub const fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Returns the value for the given slot.
    pub const fn get(&self, slot: UserSlot) -> &T {
        match slot {
            UserSlot::A => &self.a,
            UserSlot::B => &self.b,
        }
    }

    /// Returns a mutable reference to the value for the given slot.
    pub const fn get_mut(&mut self, slot: UserSlot) -> &mut T {
        match slot {
            UserSlot::A => &mut self.a,
            UserSlot::B => &mut self.b,
        }
    }

    /// Replaces the value for the given slot, preserving the other.
    pub fn set(&mut self, slot: UserSlot, value: T) {
        *self.get_mut(slot) = value;
    }

    /// Pure merge: returns the pair with one slot replaced.
    #[must_use]
    pub fn with(mut self, slot: UserSlot, value: T) -> Self {
        self.set(slot, value);
        self
    }
}

impl PerUser<bool> {
    /// True when both slots are true.
    #[must_use]
    pub const fn both(&self) -> bool {
        self.a && self.b
    }
}

impl<T> PerUser<Option<T>> {
    /// True when both slots hold a value.
    #[must_use]
    pub const fn both_present(&self) -> bool {
        self.a.is_some() && self.b.is_some()
    }
}

/// One conflict-resolution engagement between two fixed user identities.
///
/// Created once at session start; mutated only through
/// [`SessionManager`](crate::manager::SessionManager) as the engine
/// transitions; never deleted, only marked inactive/completed.
///
/// Field names mirror the external store's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identity.
    pub id: SessionId,
    /// External user id occupying slot A.
    pub user_a: String,
    /// External user id occupying slot B.
    pub user_b: String,
    /// Phase the session is currently in.
    pub current_phase: Phase,
    /// The agreed (or proposed) issue statement.
    pub issue_statement: Option<String>,
    /// External user id of whoever proposed the current issue.
    pub issue_proposed_by: Option<String>,
    /// When both users agreed on the issue.
    pub issue_agreed_at: Option<DateTime<Utc>>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last mutated.
    pub updated_at: DateTime<Utc>,
    /// When the session completed its closure phase.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the session still accepts events.
    pub is_active: bool,
}

impl Session {
    /// Creates an active session between the two given users.
    #[must_use]
    pub fn new(id: SessionId, user_a: impl Into<String>, user_b: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_a: user_a.into(),
            user_b: user_b.into(),
            current_phase: Phase::Initialization,
            issue_statement: None,
            issue_proposed_by: None,
            issue_agreed_at: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            is_active: true,
        }
    }

    /// Resolves an external user id to its slot, if the user participates.
    #[must_use]
    pub fn slot_of(&self, user_id: &str) -> Option<UserSlot> {
        if user_id == self.user_a {
            Some(UserSlot::A)
        } else if user_id == self.user_b {
            Some(UserSlot::B)
        } else {
            None
        }
    }

    /// Returns the external user id occupying the given slot.
    #[must_use]
    pub fn user_id(&self, slot: UserSlot) -> &str {
        match slot {
            UserSlot::A => &self.user_a,
            UserSlot::B => &self.user_b,
        }
    }
}
