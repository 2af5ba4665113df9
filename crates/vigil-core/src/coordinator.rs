//! Locks every screen and decides whether the lock is effective

use tracing::{info, warn};

use crate::display::DisplayServer;
use crate::grabber::{LockSession, ScreenGrabber};

/// Owns the lock sessions for all screens of one display
///
/// A lock is effective when at least one screen holds both grabs. Screens
/// that could not be grabbed are dropped and reported, not retried.
pub struct LockCoordinator<D: DisplayServer> {
    grabber: ScreenGrabber,
    sessions: Vec<LockSession<D::Cover>>,
    failed: Vec<usize>,
}

impl<D: DisplayServer> LockCoordinator<D> {
    pub fn new(grabber: ScreenGrabber) -> Self {
        Self {
            grabber,
            sessions: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Try to lock every screen of the display, returning whether the lock is effective
    pub fn lock_all(&mut self, display: &mut D) -> bool {
        for screen in 0..display.screen_count() {
            match self.grabber.acquire(display, screen) {
                Ok(session) => self.sessions.push(session),
                Err(_) => self.failed.push(screen),
            }
        }
        display.sync();

        if self.sessions.is_empty() {
            warn!("No screen could be locked");
            display.ungrab();
            display.sync();
            return false;
        }
        if !self.failed.is_empty() {
            warn!(
                "Partial lock: screens {:?} are not covered, continuing with {} locked",
                self.failed,
                self.sessions.len()
            );
        }
        info!("Locked {} screen(s)", self.sessions.len());
        true
    }

    /// Release every held session
    pub fn unlock_all(&mut self, display: &mut D) {
        for session in &mut self.sessions {
            self.grabber.release(display, session);
        }
        self.sessions.clear();
        display.ungrab();
        display.sync();
        info!("All screens released");
    }

    /// Sessions that reached the grabbed state
    pub fn sessions(&self) -> &[LockSession<D::Cover>] {
        &self.sessions
    }

    /// Screens that could not be locked
    pub fn failed_screens(&self) -> &[usize] {
        &self.failed
    }

    pub fn is_effective(&self) -> bool {
        !self.sessions.is_empty()
    }
}
