//! Phase progression engine
//!
//! Implements the nine-phase conflict-resolution state machine. The engine
//! manages event-driven transitions where every cross-user step is gated on
//! both participants agreeing, with guards evaluated against the context
//! *after* the acting user's vote has been applied.
//!
//! # Architecture
//!
//! - [`Phase`] / [`PhaseContext`] — the state set and full mutable context
//! - [`PhaseEvent`] / [`EventOutcome`] — closed event set and dispatch result
//! - [`transition`] — the single shared edge table plus pure pre-flight
//!   validation, so the engine and external checks cannot drift apart
//! - [`PhaseEngine`] — event dispatch and context mutation

pub mod context;
pub mod engine;
pub mod event;
pub mod transition;

pub use context::{Phase, PhaseContext};
pub use engine::PhaseEngine;
pub use event::{EventOutcome, IgnoreReason, PhaseEvent, Transition};
pub use transition::validate;
