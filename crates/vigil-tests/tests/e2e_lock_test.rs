//! End-to-end lock session tests
//!
//! These drive the full pipeline (grab every screen, read keys, verify,
//! escalate, release) against the scripted display and recording
//! countermeasures.

use clap::Parser;
use proptest::prelude::*;
use rstest::rstest;

use vigil::{Cli, Outcome, VigilConfig};
use vigil_core::keysym;
use vigil_core::mock::{Call, MockDisplay, RecordingCountermeasures, ScreenScript};
use vigil_core::{
    Alert, CredentialVerifier, Cue, EscalationPolicy, Features, GrabPolicy, InputStateMachine,
    KeyPress, LockCoordinator, ScreenGrabber, StaticSecret, Tier,
};

const SECRET: &str = "correct horse";

fn verifier() -> CredentialVerifier {
    CredentialVerifier::new(Box::new(StaticSecret::new(SECRET.as_bytes())))
}

fn grab() -> GrabPolicy {
    GrabPolicy {
        attempts: 5,
        interval_ms: 0,
    }
}

#[test]
fn test_three_wrong_then_correct() {
    let mut display = MockDisplay::new(vec![ScreenScript::cooperative(), ScreenScript::busy(2, 3)]);
    for _ in 0..3 {
        display.type_line("wrong");
    }
    display.type_line(SECRET);

    let policy = EscalationPolicy::new(Features::default());
    let actions = RecordingCountermeasures::new();

    let outcome = vigil::lock_screens(&mut display, grab(), &verifier(), &policy, &actions).unwrap();

    assert_eq!(outcome, Outcome::Unlocked);
    assert_eq!(
        actions.calls(),
        vec![
            Call::Play(Cue::Beep),
            Call::Play(Cue::Beep),
            Call::Play(Cue::Alarm),
            Call::AlertInBackground(Alert::BadPassword),
            Call::Play(Cue::Beep),
        ]
    );
    assert_eq!(display.bells(), 3);
    assert_eq!(display.live_covers(), 0);
    assert_eq!(display.released(), 2);
    assert_eq!(display.pending_events(), 0);
}

#[test]
fn test_nothing_locked_never_reads_input() {
    let mut display = MockDisplay::new(vec![ScreenScript::unavailable(), ScreenScript::no_window()]);
    display.type_line(SECRET);

    let policy = EscalationPolicy::new(Features::default());
    let actions = RecordingCountermeasures::new();

    let outcome = vigil::lock_screens(&mut display, grab(), &verifier(), &policy, &actions).unwrap();

    assert_eq!(outcome, Outcome::NotLocked);
    assert_eq!(display.pending_events(), SECRET.len() + 1);
    assert_eq!(display.live_covers(), 0);
    assert!(actions.calls().is_empty());
}

#[test]
fn test_partial_lock_still_unlocks() {
    let mut display = MockDisplay::new(vec![ScreenScript::unavailable(), ScreenScript::cooperative()]);
    display.type_line(SECRET);

    let policy = EscalationPolicy::new(Features::none());
    let actions = RecordingCountermeasures::new();

    let outcome = vigil::lock_screens(&mut display, grab(), &verifier(), &policy, &actions).unwrap();

    assert_eq!(outcome, Outcome::Unlocked);
    assert_eq!(display.pointer_attempts(0), grab().attempts);
    assert_eq!(display.released(), 2);
    assert_eq!(display.live_covers(), 0);
}

#[test]
fn test_danger_key_before_any_failure() {
    let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
    display.press(KeyPress::bare(keysym::ALT_L)).type_line(SECRET);

    let policy = EscalationPolicy::new(Features::default());
    let actions = RecordingCountermeasures::new();

    let outcome = vigil::lock_screens(&mut display, grab(), &verifier(), &policy, &actions).unwrap();

    assert_eq!(outcome, Outcome::Unlocked);
    assert_eq!(
        actions.calls(),
        vec![
            Call::DisableKillSwitches,
            Call::Capture,
            Call::Notify(Alert::DangerKey, None),
            Call::Discard,
            Call::PowerOff,
            Call::Play(Cue::Beep),
        ]
    );
    assert_eq!(display.bells(), 0);
}

#[test]
fn test_severe_sequence_with_image_host() {
    let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
    for _ in 0..6 {
        display.type_line("wrong");
    }
    display.type_line(SECRET);

    let policy = EscalationPolicy::new(Features {
        audio: false,
        image_upload: true,
        ..Features::default()
    });
    let actions = RecordingCountermeasures::new().failing_power_off();

    let outcome = vigil::lock_screens(&mut display, grab(), &verifier(), &policy, &actions).unwrap();
    assert_eq!(outcome, Outcome::Unlocked);

    let calls = actions.calls();
    let severe = &calls[calls.len() - 7..];
    assert_eq!(
        severe,
        &[
            Call::DisableKillSwitches,
            Call::Capture,
            Call::Publish,
            Call::Notify(
                Alert::BadPassword,
                Some(RecordingCountermeasures::LINK.to_string())
            ),
            Call::Retract,
            Call::Discard,
            Call::PowerOff,
        ]
    );
    assert_eq!(actions.power_offs(), 1);
}

#[test]
fn test_safe_flag_keeps_danger_key_alerts_without_poweroff() {
    let cli = Cli::try_parse_from(["vigil", "--safe"]).unwrap();
    let mut config = VigilConfig::default();
    cli.apply(&mut config);

    let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
    display
        .press(KeyPress::bare(keysym::CONTROL_L))
        .press(KeyPress::bare(keysym::F1 + 3))
        .type_line(SECRET);

    let policy = config.escalation_policy();
    let actions = RecordingCountermeasures::new();

    let outcome = vigil::lock_screens(&mut display, grab(), &verifier(), &policy, &actions).unwrap();
    assert_eq!(outcome, Outcome::Unlocked);
    assert_eq!(actions.power_offs(), 0);
    assert_eq!(
        actions.calls(),
        vec![
            Call::Capture,
            Call::Notify(Alert::DangerKey, None),
            Call::Discard,
            Call::Capture,
            Call::Notify(Alert::DangerKey, None),
            Call::Discard,
            Call::Play(Cue::Beep),
        ]
    );
}

#[rstest]
#[case(1, Tier::Soft)]
#[case(2, Tier::Soft)]
#[case(3, Tier::Alarm)]
#[case(5, Tier::Alarm)]
#[case(6, Tier::Severe)]
#[case(9, Tier::Severe)]
fn test_tier_of_nth_failure(#[case] failures: usize, #[case] expected: Tier) {
    let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
    let mut coordinator = LockCoordinator::new(ScreenGrabber::new(grab()));
    assert!(coordinator.lock_all(&mut display));

    for _ in 0..failures {
        display.type_line("nope");
    }

    let verifier = verifier();
    let policy = EscalationPolicy::new(Features::none());
    let actions = RecordingCountermeasures::new();
    let mut machine = InputStateMachine::new(&verifier, &policy, &actions);

    let mut last = None;
    while display.pending_events() > 0 {
        if let Some(tier) = machine.step(&mut display, coordinator.sessions()).unwrap() {
            last = Some(tier);
        }
    }

    assert_eq!(last, Some(expected));
    coordinator.unlock_all(&mut display);
}

proptest! {
    #[test]
    fn prop_attempts_equal_failed_submissions(
        entries in proptest::collection::vec("[a-z]{0,12}", 0..12)
    ) {
        let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
        let mut coordinator = LockCoordinator::new(ScreenGrabber::new(grab()));
        prop_assert!(coordinator.lock_all(&mut display));

        for entry in &entries {
            display.type_line(entry);
        }

        let verifier = verifier();
        let policy = EscalationPolicy::new(Features::none());
        let actions = RecordingCountermeasures::new();
        let mut machine = InputStateMachine::new(&verifier, &policy, &actions);
        while display.pending_events() > 0 {
            machine.step(&mut display, coordinator.sessions()).unwrap();
        }

        prop_assert_eq!(machine.attempts() as usize, entries.len());
        prop_assert_eq!(machine.buffered(), 0);
        prop_assert!(machine.is_running());
        prop_assert_eq!(display.bells(), entries.len());
    }
}
