#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vigil_core::keysym;
use vigil_core::mock::{MockDisplay, RecordingCountermeasures, ScreenScript};
use vigil_core::{
    CredentialBackend, CredentialVerifier, EscalationPolicy, Features, GrabPolicy, InputEvent,
    InputStateMachine, KeyPress, LockCoordinator, ScreenGrabber, SECRET_CAPACITY,
};

/// Rejects everything so the loop never ends
struct Never;

impl CredentialBackend for Never {
    fn verify(&self, _candidate: &[u8]) -> vigil_core::Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "never"
    }
}

#[derive(Debug, Arbitrary)]
enum Step {
    Key { keysym: u32, text: Vec<u8> },
    Char(char),
    Return,
    Escape,
    BackSpace,
    Other,
}

fuzz_target!(|steps: Vec<Step>| {
    let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
    let mut coordinator = LockCoordinator::new(ScreenGrabber::new(GrabPolicy {
        attempts: 1,
        interval_ms: 0,
    }));
    assert!(coordinator.lock_all(&mut display));

    let mut submissions = 0u32;
    for step in steps {
        let press = match step {
            Step::Key { keysym, text } => KeyPress::new(keysym, text),
            Step::Char(c) => KeyPress::char(c),
            Step::Return => KeyPress::bare(keysym::RETURN),
            Step::Escape => KeyPress::bare(keysym::ESCAPE),
            Step::BackSpace => KeyPress::bare(keysym::BACKSPACE),
            Step::Other => {
                display.push_event(InputEvent::Other);
                continue;
            }
        };
        if keysym::normalize(press.keysym) == keysym::RETURN {
            submissions += 1;
        }
        display.press(press);
    }

    let verifier = CredentialVerifier::new(Box::new(Never));
    let policy = EscalationPolicy::new(Features {
        danger_keys: false,
        ..Features::default()
    });
    let actions = RecordingCountermeasures::new();
    let mut machine = InputStateMachine::new(&verifier, &policy, &actions);

    while display.pending_events() > 0 {
        machine.step(&mut display, coordinator.sessions()).unwrap();
        assert!(machine.buffered() <= SECRET_CAPACITY);
        assert!(machine.is_running());
    }

    assert_eq!(machine.attempts(), submissions);
    // danger keys are disarmed, so only the failure-driven severe tier powers off
    assert_eq!(
        actions.power_offs(),
        submissions.saturating_sub(vigil_core::SEVERE_AFTER) as usize
    );
    coordinator.unlock_all(&mut display);
    assert_eq!(display.live_covers(), 0);
});
