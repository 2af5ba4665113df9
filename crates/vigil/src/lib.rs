//! Vigil - Screen locker with escalating countermeasures
//!
//! Wires the pieces together: configuration and command line, credential
//! resolution from the host, and the lock session itself, which is generic
//! over the display server and the countermeasure set.

pub mod account;
pub mod cli;
pub mod config;
pub mod error;
pub mod oom;

use tracing::{error, info};
use vigil_core::{
    Countermeasures, CredentialVerifier, DisplayServer, EscalationPolicy, GrabPolicy,
    InputStateMachine, LockCoordinator, ScreenGrabber,
};

pub use cli::Cli;
pub use config::VigilConfig;
pub use error::{ConfigError, Result};

/// How a lock session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No screen could be locked; the input loop never ran
    NotLocked,
    /// The correct secret was entered and every screen was released
    Unlocked,
}

/// Lock every screen of `display` and block until the secret is entered
///
/// Screens are released even when the input loop fails.
pub fn lock_screens<D, C>(
    display: &mut D,
    grab: GrabPolicy,
    verifier: &CredentialVerifier,
    policy: &EscalationPolicy,
    actions: &C,
) -> vigil_core::Result<Outcome>
where
    D: DisplayServer,
    C: Countermeasures + ?Sized,
{
    let mut coordinator = LockCoordinator::new(ScreenGrabber::new(grab));
    if !coordinator.lock_all(display) {
        error!("Unable to lock any screen");
        return Ok(Outcome::NotLocked);
    }

    let mut machine = InputStateMachine::new(verifier, policy, actions);
    let result = machine.run(display, coordinator.sessions());
    coordinator.unlock_all(display);

    result?;
    info!("Unlocked after {} failed attempt(s)", machine.attempts());
    Ok(Outcome::Unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::mock::{MockDisplay, RecordingCountermeasures, ScreenScript};
    use vigil_core::{Features, StaticSecret};

    fn grab() -> GrabPolicy {
        GrabPolicy {
            attempts: 2,
            interval_ms: 0,
        }
    }

    #[test]
    fn test_unlock_releases_screens() {
        let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
        display.type_line("pw");
        let verifier = CredentialVerifier::new(Box::new(StaticSecret::new(b"pw")));
        let policy = EscalationPolicy::new(Features::none());
        let actions = RecordingCountermeasures::new();

        let outcome = lock_screens(&mut display, grab(), &verifier, &policy, &actions).unwrap();
        assert_eq!(outcome, Outcome::Unlocked);
        assert_eq!(display.live_covers(), 0);
    }

    #[test]
    fn test_display_failure_still_releases() {
        let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
        let verifier = CredentialVerifier::new(Box::new(StaticSecret::new(b"pw")));
        let policy = EscalationPolicy::new(Features::none());
        let actions = RecordingCountermeasures::new();

        assert!(lock_screens(&mut display, grab(), &verifier, &policy, &actions).is_err());
        assert_eq!(display.live_covers(), 0);
    }
}
