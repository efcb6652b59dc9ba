//! `accord` — phase progression engine for two-party conflict resolution
//!
//! This library provides the deterministic core of a structured
//! conflict-resolution workflow: two fixed participants move together through
//! a nine-phase sequence, with every cross-user step gated behind
//! "both parties agreed" conditions.
//!
//! # Architecture
//!
//! - [`phase::PhaseEngine`] — state machine owning the current phase and all
//!   per-phase agreement/content fields for one session
//! - [`phase::transition`] — shared transition table and pure pre-flight
//!   validation, consumed by both the engine and external callers
//! - [`content::ContentStore`] — phase-gated store for discussion artifacts
//!   (contentions, rebuttals, locked statements, resolution)
//! - [`flags::FlagStore`] — lifecycle of detection flags
//!   (active → challenged → confirmed/overturned) and review-count bookkeeping
//! - [`manager::SessionManager`] — one composed state per active session
//!
//! The core performs no I/O and assumes serialized event application per
//! session; see [`manager`] for the session-scoped locking that provides it.

pub mod content;
pub mod error;
pub mod flags;
pub mod ids;
pub mod manager;
pub mod observability;
pub mod phase;
pub mod session;
