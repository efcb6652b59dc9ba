//! The shared transition table and pure pre-flight validation.
//!
//! One table defines both what the engine may do and what
//! [`validate`] reports, so event dispatch and pre-flight checks cannot
//! drift apart. Guards are pure predicates over [`PhaseContext`]; the
//! engine evaluates them against the context *after* applying the acting
//! user's update.

use super::context::{Phase, PhaseContext};
use crate::error::TransitionError;

/// A guard predicate over the session context.
type Guard = fn(&PhaseContext) -> bool;

/// One edge of the phase state graph.
struct Edge {
    from: Phase,
    to: Phase,
    /// Guard that must hold for the edge to fire; `None` means always.
    guard: Option<Guard>,
    /// Human-readable description of the guard, for rejection reasons.
    requirement: &'static str,
}

fn issue_ready(ctx: &PhaseContext) -> bool {
    ctx.issue_statement.is_some() && ctx.issue_agreed.both()
}

fn steel_manning_ready(ctx: &PhaseContext) -> bool {
    ctx.steel_manning.both_present() && ctx.steel_manning_agreed.both()
}

fn statements_locked(ctx: &PhaseContext) -> bool {
    ctx.statements.both_present() && ctx.statement_locked.both()
}

fn resolution_ready(ctx: &PhaseContext) -> bool {
    ctx.resolution_statement.is_some() && ctx.resolution_agreed.both()
}

fn feedback_complete(ctx: &PhaseContext) -> bool {
    ctx.feedback_submitted.both()
}

/// The complete state graph, one entry per legal `(from, to)` pair.
const EDGES: &[Edge] = &[
    Edge {
        from: Phase::Initialization,
        to: Phase::IssueAgreement,
        guard: None,
        requirement: "",
    },
    Edge {
        from: Phase::IssueAgreement,
        to: Phase::SteelManning,
        guard: Some(issue_ready),
        requirement: "an issue statement agreed by both users",
    },
    Edge {
        from: Phase::SteelManning,
        to: Phase::StatementLocking,
        guard: Some(steel_manning_ready),
        requirement: "both summaries submitted and agreed by both users",
    },
    Edge {
        from: Phase::StatementLocking,
        to: Phase::Discussion,
        guard: Some(statements_locked),
        requirement: "both statements submitted and locked",
    },
    Edge {
        from: Phase::Discussion,
        to: Phase::Resolution,
        guard: None,
        requirement: "",
    },
    Edge {
        from: Phase::Resolution,
        to: Phase::Summary,
        guard: Some(resolution_ready),
        requirement: "a resolution statement agreed by both users",
    },
    Edge {
        from: Phase::Summary,
        to: Phase::PerspectiveUpdate,
        guard: None,
        requirement: "",
    },
    Edge {
        from: Phase::PerspectiveUpdate,
        to: Phase::Closure,
        guard: Some(feedback_complete),
        requirement: "feedback submitted by both users",
    },
    Edge {
        from: Phase::Closure,
        to: Phase::Initialization,
        guard: None,
        requirement: "",
    },
];

fn edge(from: Phase, to: Phase) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.from == from && e.to == to)
}

/// Checks whether a proposed phase jump is legal for the given context.
///
/// Pure pre-flight query, independent of event dispatch: nothing is
/// mutated, and the result distinguishes a missing edge from an unmet
/// guard.
///
/// # Errors
///
/// Returns [`TransitionError::UnknownTransition`] when the state graph has
/// no such edge, or [`TransitionError::GuardUnmet`] naming the missing
/// requirement when the edge exists but its guard fails.
pub fn validate(from: Phase, to: Phase, ctx: &PhaseContext) -> Result<(), TransitionError> {
    let Some(edge) = edge(from, to) else {
        return Err(TransitionError::UnknownTransition { from, to });
    };
    match edge.guard {
        Some(guard) if !guard(ctx) => Err(TransitionError::GuardUnmet {
            from,
            to,
            requirement: edge.requirement,
        }),
        _ => Ok(()),
    }
}

/// True when the edge exists and its guard holds for the given context.
///
/// Used by the engine after applying an event's effect, so the guard sees
/// the just-applied update.
#[must_use]
pub fn guard_holds(from: Phase, to: Phase, ctx: &PhaseContext) -> bool {
    validate(from, to, ctx).is_ok()
}

/// Returns the phases reachable from `from`, ignoring guards.
#[must_use]
pub fn allowed_targets(from: Phase) -> Vec<Phase> {
    EDGES.iter().filter(|e| e.from == from).map(|e| e.to).collect()
}
