//! Per-process lock state shared by the state machine and the policy

/// Count of failed submissions since the process started
///
/// Only ever increases; there is no reset or decrement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttemptCounter(u32);

impl AttemptCounter {
    pub fn new() -> Self {
        Self(0)
    }

    /// Record one more failure and return the new count
    pub fn increment(&mut self) -> u32 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Explicit context passed through the lock loop instead of process globals
#[derive(Debug)]
pub struct LockContext {
    attempts: AttemptCounter,
    running: bool,
}

impl LockContext {
    /// Fresh context: no failures, loop armed
    pub fn new() -> Self {
        Self {
            attempts: AttemptCounter::new(),
            running: true,
        }
    }

    /// Whether the input loop should keep consuming events
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the loop after a verified match
    pub fn unlock(&mut self) {
        debug_assert!(self.running, "lock context unlocked twice");
        self.running = false;
    }

    /// Record a failed submission, returning the new attempt count
    pub fn record_failure(&mut self) -> u32 {
        self.attempts.increment()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }
}

impl Default for LockContext {
    fn default() -> Self {
        Self::new()
    }
}
