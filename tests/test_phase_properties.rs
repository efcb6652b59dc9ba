//! Property tests: the engine stays on the state graph no matter what
//! event sequence it is fed.

use accord::phase::{transition, Phase, PhaseContext, PhaseEngine, PhaseEvent};
use accord::session::UserSlot;
use proptest::prelude::*;

fn user_slot() -> impl Strategy<Value = UserSlot> {
    prop_oneof![Just(UserSlot::A), Just(UserSlot::B)]
}

fn phase_event() -> impl Strategy<Value = PhaseEvent> {
    let text = "[a-z ]{1,20}";
    prop_oneof![
        (user_slot(), text).prop_map(|(user_id, issue_statement)| PhaseEvent::ProposeIssue {
            user_id,
            issue_statement,
        }),
        user_slot().prop_map(|user_id| PhaseEvent::AgreeIssue { user_id }),
        user_slot().prop_map(|user_id| PhaseEvent::RejectIssue { user_id }),
        (user_slot(), user_slot(), text).prop_map(|(user_id, target_user_id, content)| {
            PhaseEvent::SubmitSteelManning {
                user_id,
                target_user_id,
                content,
            }
        }),
        user_slot().prop_map(|user_id| PhaseEvent::AgreeSteelManning { user_id }),
        user_slot().prop_map(|user_id| PhaseEvent::RejectSteelManning { user_id }),
        (user_slot(), text).prop_map(|(user_id, statement)| PhaseEvent::LockStatement {
            user_id,
            statement,
        }),
        (user_slot(), text).prop_map(|(user_id, resolution)| PhaseEvent::ProposeResolution {
            user_id,
            resolution,
        }),
        user_slot().prop_map(|user_id| PhaseEvent::AgreeResolution { user_id }),
        user_slot().prop_map(|user_id| PhaseEvent::RejectResolution { user_id }),
        (user_slot(), text).prop_map(|(user_id, update)| PhaseEvent::SubmitPerspectiveUpdate {
            user_id,
            update,
        }),
        user_slot().prop_map(|user_id| PhaseEvent::SubmitFeedback { user_id }),
        Just(PhaseEvent::CompleteSession),
        Just(PhaseEvent::Reset),
    ]
}

proptest! {
    /// Every transition the engine reports starts at the phase the machine
    /// was actually in, and ends on an edge of the state graph (reset and
    /// completion jump back to the start by construction).
    #[test]
    fn transitions_stay_on_the_state_graph(events in prop::collection::vec(phase_event(), 0..40)) {
        let mut engine = PhaseEngine::new();
        for event in &events {
            let before = engine.phase();
            let outcome = engine.send(event);
            if let Some(t) = outcome.transition() {
                prop_assert_eq!(t.from, before);
                prop_assert_eq!(t.to, engine.phase());
                let on_graph = transition::allowed_targets(t.from).contains(&t.to);
                let is_restart = t.to == Phase::Initialization;
                prop_assert!(on_graph || is_restart, "off-graph transition {:?}", t);
            } else {
                prop_assert_eq!(engine.phase(), before);
            }
        }
    }

    /// Ignored events leave the whole context untouched.
    #[test]
    fn ignored_events_do_not_mutate(events in prop::collection::vec(phase_event(), 0..40)) {
        let mut engine = PhaseEngine::new();
        for event in &events {
            let before = engine.context().clone();
            let outcome = engine.send(event);
            if !outcome.accepted() {
                prop_assert_eq!(engine.context(), &before);
            }
        }
    }

    /// A reset is total: no prefix of activity leaves residue behind.
    #[test]
    fn reset_always_restores_the_initial_context(events in prop::collection::vec(phase_event(), 0..40)) {
        let mut engine = PhaseEngine::new();
        for event in &events {
            engine.send(event);
        }
        engine.send(&PhaseEvent::Reset);
        prop_assert_eq!(engine.context(), &PhaseContext::initial());
    }

    /// The phase never leaves the defined set, and the pre-flight validator
    /// agrees with where the engine actually is.
    #[test]
    fn phase_is_always_defined(events in prop::collection::vec(phase_event(), 0..40)) {
        let mut engine = PhaseEngine::new();
        for event in &events {
            engine.send(event);
            let phase = engine.phase();
            prop_assert!(Phase::ALL.contains(&phase));
            // Exactly one outgoing edge exists from every phase.
            prop_assert_eq!(transition::allowed_targets(phase).len(), 1);
        }
    }
}
