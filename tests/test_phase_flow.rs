//! End-to-end walk of the nine-phase progression.

use accord::phase::{EventOutcome, IgnoreReason, Phase, PhaseContext, PhaseEngine, PhaseEvent};
use accord::session::UserSlot;

fn propose_issue(user: UserSlot, text: &str) -> PhaseEvent {
    PhaseEvent::ProposeIssue {
        user_id: user,
        issue_statement: text.to_string(),
    }
}

fn steel_manning(author: UserSlot, about: UserSlot, text: &str) -> PhaseEvent {
    PhaseEvent::SubmitSteelManning {
        user_id: author,
        target_user_id: about,
        content: text.to_string(),
    }
}

fn lock(user: UserSlot, text: &str) -> PhaseEvent {
    PhaseEvent::LockStatement {
        user_id: user,
        statement: text.to_string(),
    }
}

#[test]
fn full_cycle_visits_every_phase_in_order() {
    let mut engine = PhaseEngine::new();
    let mut visited = vec![engine.phase()];

    let script = [
        propose_issue(UserSlot::A, "who does the dishes"),
        PhaseEvent::AgreeIssue { user_id: UserSlot::B },
        steel_manning(UserSlot::B, UserSlot::A, "A feels the split is uneven"),
        steel_manning(UserSlot::A, UserSlot::B, "B feels unappreciated"),
        PhaseEvent::AgreeSteelManning { user_id: UserSlot::A },
        PhaseEvent::AgreeSteelManning { user_id: UserSlot::B },
        lock(UserSlot::A, "I want a rotating schedule"),
        lock(UserSlot::B, "I want credit for invisible work"),
        PhaseEvent::ProposeResolution {
            user_id: UserSlot::B,
            resolution: "weekly rotation with a shared list".to_string(),
        },
        PhaseEvent::AgreeResolution { user_id: UserSlot::A },
        PhaseEvent::SubmitPerspectiveUpdate {
            user_id: UserSlot::A,
            update: "I understand the invisible work now".to_string(),
        },
        PhaseEvent::SubmitFeedback { user_id: UserSlot::A },
        PhaseEvent::SubmitFeedback { user_id: UserSlot::B },
        PhaseEvent::CompleteSession,
    ];

    for event in &script {
        let outcome = engine.send(event);
        assert!(outcome.accepted(), "event {} was dropped", event.name());
        if let Some(transition) = outcome.transition() {
            visited.push(transition.to);
        }
    }

    assert_eq!(
        visited,
        vec![
            Phase::Initialization,
            Phase::IssueAgreement,
            Phase::SteelManning,
            Phase::StatementLocking,
            Phase::Discussion,
            Phase::Resolution,
            Phase::Summary,
            Phase::PerspectiveUpdate,
            Phase::Closure,
            Phase::Initialization,
        ]
    );
    // The cycle ends back at a pristine context, ready for a new run.
    assert_eq!(engine.context(), &PhaseContext::initial());
}

#[test]
fn rejection_then_reproposal_restarts_agreement() {
    let mut engine = PhaseEngine::new();
    engine.send(&propose_issue(UserSlot::A, "money"));
    engine.send(&PhaseEvent::RejectIssue { user_id: UserSlot::B });
    assert_eq!(engine.phase(), Phase::IssueAgreement);

    // B counter-proposes; only B's vote survives.
    engine.send(&propose_issue(UserSlot::B, "budget expectations"));
    assert!(!engine.context().issue_agreed.a);
    assert!(engine.context().issue_agreed.b);

    let outcome = engine.send(&PhaseEvent::AgreeIssue { user_id: UserSlot::A });
    assert_eq!(outcome.transition().unwrap().to, Phase::SteelManning);
    assert_eq!(
        engine.context().issue_statement.as_deref(),
        Some("budget expectations")
    );
}

#[test]
fn resolution_rejection_keeps_session_in_resolution() {
    let mut engine = engine_in_discussion();
    engine.send(&PhaseEvent::ProposeResolution {
        user_id: UserSlot::A,
        resolution: "split everything evenly".to_string(),
    });
    assert_eq!(engine.phase(), Phase::Resolution);

    engine.send(&PhaseEvent::RejectResolution { user_id: UserSlot::B });
    assert_eq!(engine.phase(), Phase::Resolution);
    assert!(!engine.context().resolution_agreed.b);

    // A new proposal resets the votes to the proposer only.
    engine.send(&PhaseEvent::ProposeResolution {
        user_id: UserSlot::B,
        resolution: "split by time, not count".to_string(),
    });
    assert!(!engine.context().resolution_agreed.a);
    let outcome = engine.send(&PhaseEvent::AgreeResolution { user_id: UserSlot::A });
    assert_eq!(outcome.transition().unwrap().to, Phase::Summary);
}

#[test]
fn perspective_update_can_be_rewritten_before_feedback() {
    let mut engine = engine_in_discussion();
    engine.send(&PhaseEvent::ProposeResolution {
        user_id: UserSlot::A,
        resolution: "rotation".to_string(),
    });
    engine.send(&PhaseEvent::AgreeResolution { user_id: UserSlot::B });
    assert_eq!(engine.phase(), Phase::Summary);

    engine.send(&PhaseEvent::SubmitPerspectiveUpdate {
        user_id: UserSlot::A,
        update: "first draft".to_string(),
    });
    assert_eq!(engine.phase(), Phase::PerspectiveUpdate);

    engine.send(&PhaseEvent::SubmitPerspectiveUpdate {
        user_id: UserSlot::A,
        update: "second draft".to_string(),
    });
    assert_eq!(
        engine.context().perspective_updates.a.as_deref(),
        Some("second draft")
    );

    // One user's feedback alone does not close the session.
    let outcome = engine.send(&PhaseEvent::SubmitFeedback { user_id: UserSlot::A });
    assert!(outcome.transition().is_none());
    assert_eq!(engine.phase(), Phase::PerspectiveUpdate);

    let outcome = engine.send(&PhaseEvent::SubmitFeedback { user_id: UserSlot::B });
    assert_eq!(outcome.transition().unwrap().to, Phase::Closure);
}

#[test]
fn early_events_are_dropped_with_phase_and_name() {
    let mut engine = PhaseEngine::new();
    let outcome = engine.send(&PhaseEvent::SubmitFeedback { user_id: UserSlot::A });
    let EventOutcome::Ignored {
        reason: IgnoreReason::WrongPhase { phase, event },
    } = outcome
    else {
        panic!("expected the event to be ignored, got {outcome:?}");
    };
    assert_eq!(phase, Phase::Initialization);
    assert_eq!(event, "SUBMIT_FEEDBACK");
}

#[test]
fn reset_mid_flow_discards_all_progress() {
    let mut engine = engine_in_discussion();
    engine.send(&PhaseEvent::Reset);
    assert_eq!(engine.context(), &PhaseContext::initial());

    // The machine accepts a fresh cycle immediately.
    let outcome = engine.send(&propose_issue(UserSlot::B, "a new issue"));
    assert_eq!(outcome.transition().unwrap().to, Phase::IssueAgreement);
}

fn engine_in_discussion() -> PhaseEngine {
    let mut engine = PhaseEngine::new();
    for event in [
        propose_issue(UserSlot::A, "chores"),
        PhaseEvent::AgreeIssue { user_id: UserSlot::B },
        steel_manning(UserSlot::B, UserSlot::A, "about A"),
        steel_manning(UserSlot::A, UserSlot::B, "about B"),
        PhaseEvent::AgreeSteelManning { user_id: UserSlot::A },
        PhaseEvent::AgreeSteelManning { user_id: UserSlot::B },
        lock(UserSlot::A, "A's position"),
        lock(UserSlot::B, "B's position"),
    ] {
        assert!(engine.send(&event).accepted());
    }
    assert_eq!(engine.phase(), Phase::Discussion);
    engine
}
