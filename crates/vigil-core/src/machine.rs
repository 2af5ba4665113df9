//! The lock loop: assemble a secret from key presses and act on submission

use tracing::{debug, info};

use crate::context::LockContext;
use crate::credential::CredentialVerifier;
use crate::display::DisplayServer;
use crate::error::Result;
use crate::escalation::{Countermeasures, Cue, EscalationPolicy, Tier};
use crate::grabber::LockSession;
use crate::input::{InputEvent, KeyAction, KeyPress};
use crate::secret::SecretBuffer;

/// Single control loop over all locked screens
///
/// Owns the secret buffer and the lock context; nothing else writes to
/// either. The loop blocks on the display and only ends on a verified match
/// (or a display error).
pub struct InputStateMachine<'a, C: Countermeasures + ?Sized> {
    verifier: &'a CredentialVerifier,
    policy: &'a EscalationPolicy,
    actions: &'a C,
    buffer: SecretBuffer,
    context: LockContext,
}

impl<'a, C: Countermeasures + ?Sized> InputStateMachine<'a, C> {
    pub fn new(
        verifier: &'a CredentialVerifier,
        policy: &'a EscalationPolicy,
        actions: &'a C,
    ) -> Self {
        Self {
            verifier,
            policy,
            actions,
            buffer: SecretBuffer::new(),
            context: LockContext::new(),
        }
    }

    /// Consume events until the correct secret is submitted
    pub fn run<D: DisplayServer>(
        &mut self,
        display: &mut D,
        sessions: &[LockSession<D::Cover>],
    ) -> Result<()> {
        info!("Waiting for the unlock secret");
        while self.context.is_running() {
            self.step(display, sessions)?;
        }
        Ok(())
    }

    /// Process exactly one event, returning the tier of a failed submission
    pub fn step<D: DisplayServer>(
        &mut self,
        display: &mut D,
        sessions: &[LockSession<D::Cover>],
    ) -> Result<Option<Tier>> {
        match display.next_event()? {
            InputEvent::Key(press) => Ok(self.handle_key(display, &press)),
            InputEvent::Other => {
                for cover in sessions.iter().filter_map(|s| s.cover()) {
                    display.raise(cover);
                }
                Ok(None)
            }
        }
    }

    fn handle_key<D: DisplayServer>(&mut self, display: &mut D, press: &KeyPress) -> Option<Tier> {
        match press.action(self.policy.features().danger_keys) {
            KeyAction::Submit => return self.submit(display),
            KeyAction::Cancel => self.buffer.clear(),
            KeyAction::Erase => self.buffer.pop(),
            KeyAction::Text(text) => self.append(text),
            KeyAction::Danger(text) => {
                self.policy.on_danger_key(self.actions);
                if let Some(text) = text {
                    self.append(text);
                }
            }
            KeyAction::Ignore => {}
        }
        None
    }

    fn append(&mut self, text: &[u8]) {
        if !self.buffer.push(text) {
            debug!("Secret buffer full, dropping input");
        }
    }

    fn submit<D: DisplayServer>(&mut self, display: &mut D) -> Option<Tier> {
        let matched = self.verifier.verify(self.buffer.as_bytes());
        self.buffer.clear();

        if matched {
            info!("Secret accepted");
            self.context.unlock();
            if self.policy.features().audio {
                self.actions.play(Cue::Beep);
            }
            return None;
        }

        display.bell();
        let attempts = self.context.record_failure();
        Some(self.policy.on_failure(attempts, self.actions))
    }

    /// Failed submissions so far
    pub fn attempts(&self) -> u32 {
        self.context.attempts()
    }

    pub fn is_running(&self) -> bool {
        self.context.is_running()
    }

    /// Bytes currently typed
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
