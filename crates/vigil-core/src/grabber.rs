//! Per-screen cover window and exclusive input grabs

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::display::DisplayServer;
use crate::error::GrabError;
use crate::{GRAB_ATTEMPTS, GRAB_INTERVAL_MS};

/// Retry budget for grabbing a single input device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrabPolicy {
    /// Attempts per device before giving up on the screen
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Pause between attempts in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_attempts() -> u32 {
    GRAB_ATTEMPTS
}

fn default_interval_ms() -> u64 {
    GRAB_INTERVAL_MS
}

impl Default for GrabPolicy {
    fn default() -> Self {
        Self {
            attempts: GRAB_ATTEMPTS,
            interval_ms: GRAB_INTERVAL_MS,
        }
    }
}

impl GrabPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Grab state of a lock session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabStatus {
    /// Cover window exists, no grab attempted yet (or released)
    Ungrabbed,
    /// Grab attempts in progress
    Grabbing,
    /// Pointer and keyboard both grabbed
    Grabbed,
    /// A retry budget was exhausted
    Failed,
}

/// One screen's cover window plus its grab status
#[derive(Debug)]
pub struct LockSession<C> {
    screen: usize,
    cover: Option<C>,
    status: GrabStatus,
}

impl<C> LockSession<C> {
    pub fn screen(&self) -> usize {
        self.screen
    }

    pub fn status(&self) -> GrabStatus {
        self.status
    }

    /// The cover window, while the session still owns one
    pub fn cover(&self) -> Option<&C> {
        self.cover.as_ref()
    }

    pub fn is_grabbed(&self) -> bool {
        self.status == GrabStatus::Grabbed
    }
}

/// Acquires and releases screen lock sessions
#[derive(Clone, Debug, Default)]
pub struct ScreenGrabber {
    policy: GrabPolicy,
}

impl ScreenGrabber {
    pub fn new(policy: GrabPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GrabPolicy {
        &self.policy
    }

    /// Cover a screen and grab pointer then keyboard
    ///
    /// The cover is mapped before any grab is attempted. If either device
    /// cannot be grabbed within the retry budget, the cover is destroyed
    /// before the error is returned.
    pub fn acquire<D: DisplayServer>(
        &self,
        display: &mut D,
        screen: usize,
    ) -> Result<LockSession<D::Cover>, GrabError> {
        let cover = display.create_cover(screen)?;
        let mut session = LockSession {
            screen,
            cover: Some(cover),
            status: GrabStatus::Ungrabbed,
        };

        session.status = GrabStatus::Grabbing;
        let outcome = self.grab_devices(display, &session);

        match outcome {
            Ok(()) => {
                session.status = GrabStatus::Grabbed;
                if let Some(cover) = session.cover.as_ref() {
                    display.watch_screen(cover);
                }
                debug!("Screen {} locked", screen);
                Ok(session)
            }
            Err(e) => {
                warn!("Screen {} could not be locked: {}", screen, e);
                session.status = GrabStatus::Failed;
                if let Some(cover) = session.cover.take() {
                    display.release_cover(cover);
                }
                Err(e)
            }
        }
    }

    /// Destroy the cover; no-op when nothing is held
    pub fn release<D: DisplayServer>(&self, display: &mut D, session: &mut LockSession<D::Cover>) {
        if let Some(cover) = session.cover.take() {
            display.release_cover(cover);
            debug!("Screen {} released", session.screen);
        }
        if session.status == GrabStatus::Grabbed {
            session.status = GrabStatus::Ungrabbed;
        }
    }

    fn grab_devices<D: DisplayServer>(
        &self,
        display: &mut D,
        session: &LockSession<D::Cover>,
    ) -> Result<(), GrabError> {
        if !self.retry(display, session, D::grab_pointer)? {
            return Err(GrabError::PointerExhausted(self.policy.attempts));
        }
        if !self.retry(display, session, D::grab_keyboard)? {
            return Err(GrabError::KeyboardExhausted(self.policy.attempts));
        }
        Ok(())
    }

    /// Call one grab request until it succeeds or the budget runs out
    fn retry<D: DisplayServer>(
        &self,
        display: &mut D,
        session: &LockSession<D::Cover>,
        grab: fn(&mut D, &D::Cover) -> Result<bool, GrabError>,
    ) -> Result<bool, GrabError> {
        let Some(cover) = session.cover.as_ref() else {
            return Ok(false);
        };
        let interval = self.policy.interval();
        for attempt in 0..self.policy.attempts {
            if grab(display, cover)? {
                return Ok(true);
            }
            if attempt + 1 < self.policy.attempts && !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDisplay, ScreenScript};

    fn instant_grabber(attempts: u32) -> ScreenGrabber {
        ScreenGrabber::new(GrabPolicy {
            attempts,
            interval_ms: 0,
        })
    }

    #[test]
    fn test_acquire_grabs_pointer_then_keyboard() {
        let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
        let grabber = instant_grabber(3);

        let session = grabber.acquire(&mut display, 0).unwrap();
        assert_eq!(session.status(), GrabStatus::Grabbed);
        assert_eq!(
            display.log(),
            &["create 0", "grab-pointer 0", "grab-keyboard 0", "watch 0"]
        );
    }

    #[test]
    fn test_busy_pointer_is_retried() {
        let mut display = MockDisplay::new(vec![ScreenScript::busy(2, 0)]);
        let grabber = instant_grabber(3);

        let session = grabber.acquire(&mut display, 0).unwrap();
        assert!(session.is_grabbed());
        assert_eq!(display.pointer_attempts(0), 3);
    }

    #[test]
    fn test_pointer_exhaustion_tears_down_cover() {
        let mut display = MockDisplay::new(vec![ScreenScript::busy(10, 0)]);
        let grabber = instant_grabber(4);

        let err = grabber.acquire(&mut display, 0).unwrap_err();
        assert_eq!(err, GrabError::PointerExhausted(4));
        assert_eq!(display.pointer_attempts(0), 4);
        assert_eq!(display.keyboard_attempts(0), 0);
        assert_eq!(display.live_covers(), 0);
    }

    #[test]
    fn test_keyboard_exhaustion_tears_down_cover() {
        let mut display = MockDisplay::new(vec![ScreenScript::busy(0, 10)]);
        let grabber = instant_grabber(2);

        let err = grabber.acquire(&mut display, 0).unwrap_err();
        assert_eq!(err, GrabError::KeyboardExhausted(2));
        assert_eq!(display.live_covers(), 0);
    }

    #[test]
    fn test_window_failure_is_reported() {
        let mut display = MockDisplay::new(vec![ScreenScript::no_window()]);
        let err = instant_grabber(1).acquire(&mut display, 0).unwrap_err();
        assert!(matches!(err, GrabError::Window(_)));
        assert_eq!(display.pointer_attempts(0), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut display = MockDisplay::new(vec![ScreenScript::cooperative()]);
        let grabber = instant_grabber(1);

        let mut session = grabber.acquire(&mut display, 0).unwrap();
        grabber.release(&mut display, &mut session);
        grabber.release(&mut display, &mut session);

        assert_eq!(session.status(), GrabStatus::Ungrabbed);
        assert!(session.cover().is_none());
        assert_eq!(display.released(), 1);
    }
}
