//! Scripted display server and recording countermeasures for testing
//!
//! These stand-ins let the whole lock pipeline run without an X server or
//! any real side effects. Use for development and testing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use crate::display::DisplayServer;
use crate::error::{GrabError, LockError, Result};
use crate::escalation::{
    ActionResult, Alert, Countermeasures, Cue, Evidence, PublishedEvidence,
};
use crate::input::{InputEvent, KeyPress};

/// How one screen of the mock display reacts to grab requests
#[derive(Clone, Debug)]
pub struct ScreenScript {
    window_ok: bool,
    pointer_busy: u32,
    keyboard_busy: u32,
}

impl ScreenScript {
    /// Every request succeeds on the first try
    pub fn cooperative() -> Self {
        Self::busy(0, 0)
    }

    /// Refuse the first `pointer` pointer grabs and `keyboard` keyboard grabs
    pub fn busy(pointer: u32, keyboard: u32) -> Self {
        Self {
            window_ok: true,
            pointer_busy: pointer,
            keyboard_busy: keyboard,
        }
    }

    /// Pointer is held by someone else forever
    pub fn unavailable() -> Self {
        Self::busy(u32::MAX, 0)
    }

    /// Cover window creation fails
    pub fn no_window() -> Self {
        Self {
            window_ok: false,
            pointer_busy: 0,
            keyboard_busy: 0,
        }
    }
}

/// Cover handle issued by the mock display
#[derive(Debug, PartialEq, Eq)]
pub struct MockCover {
    pub screen: usize,
}

/// In-memory display server fed from a script of events
pub struct MockDisplay {
    screens: Vec<ScreenScript>,
    pointer_attempts: Vec<u32>,
    keyboard_attempts: Vec<u32>,
    events: VecDeque<InputEvent>,
    log: Vec<String>,
    live_covers: usize,
    released: usize,
    grabs_held: bool,
    raises: usize,
    bells: usize,
}

impl MockDisplay {
    pub fn new(screens: Vec<ScreenScript>) -> Self {
        let count = screens.len();
        Self {
            screens,
            pointer_attempts: vec![0; count],
            keyboard_attempts: vec![0; count],
            events: VecDeque::new(),
            log: Vec::new(),
            live_covers: 0,
            released: 0,
            grabs_held: false,
            raises: 0,
            bells: 0,
        }
    }

    /// Queue a raw event
    pub fn push_event(&mut self, event: InputEvent) -> &mut Self {
        self.events.push_back(event);
        self
    }

    /// Queue a key press
    pub fn press(&mut self, press: KeyPress) -> &mut Self {
        self.push_event(InputEvent::Key(press))
    }

    /// Queue the characters of `text` followed by Return
    pub fn type_line(&mut self, text: &str) -> &mut Self {
        for c in text.chars() {
            self.press(KeyPress::char(c));
        }
        self.press(KeyPress::bare(crate::keysym::RETURN))
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn pointer_attempts(&self, screen: usize) -> u32 {
        self.pointer_attempts[screen]
    }

    pub fn keyboard_attempts(&self, screen: usize) -> u32 {
        self.keyboard_attempts[screen]
    }

    /// Covers created and not yet released
    pub fn live_covers(&self) -> usize {
        self.live_covers
    }

    /// Number of release calls that destroyed a cover
    pub fn released(&self) -> usize {
        self.released
    }

    /// Whether any pointer or keyboard grab is held by the client
    pub fn holds_grabs(&self) -> bool {
        self.grabs_held
    }

    pub fn raises(&self) -> usize {
        self.raises
    }

    pub fn bells(&self) -> usize {
        self.bells
    }

    /// Events still queued
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl DisplayServer for MockDisplay {
    type Cover = MockCover;

    fn screen_count(&self) -> usize {
        self.screens.len()
    }

    fn create_cover(&mut self, screen: usize) -> std::result::Result<MockCover, GrabError> {
        if !self.screens[screen].window_ok {
            return Err(GrabError::Window(format!("screen {} has no root", screen)));
        }
        self.log.push(format!("create {}", screen));
        self.live_covers += 1;
        Ok(MockCover { screen })
    }

    fn grab_pointer(&mut self, cover: &MockCover) -> std::result::Result<bool, GrabError> {
        let screen = cover.screen;
        self.log.push(format!("grab-pointer {}", screen));
        self.pointer_attempts[screen] += 1;
        let granted = self.pointer_attempts[screen] > self.screens[screen].pointer_busy;
        self.grabs_held |= granted;
        Ok(granted)
    }

    fn grab_keyboard(&mut self, cover: &MockCover) -> std::result::Result<bool, GrabError> {
        let screen = cover.screen;
        self.log.push(format!("grab-keyboard {}", screen));
        self.keyboard_attempts[screen] += 1;
        let granted = self.keyboard_attempts[screen] > self.screens[screen].keyboard_busy;
        self.grabs_held |= granted;
        Ok(granted)
    }

    fn watch_screen(&mut self, cover: &MockCover) {
        self.log.push(format!("watch {}", cover.screen));
    }

    fn release_cover(&mut self, cover: MockCover) {
        self.log.push(format!("release {}", cover.screen));
        self.live_covers -= 1;
        self.released += 1;
    }

    fn ungrab(&mut self) {
        self.log.push("ungrab".to_string());
        self.grabs_held = false;
    }

    fn next_event(&mut self) -> Result<InputEvent> {
        self.events
            .pop_front()
            .ok_or_else(|| LockError::Display("event script exhausted".to_string()))
    }

    fn raise(&mut self, _cover: &MockCover) {
        self.raises += 1;
    }

    fn bell(&mut self) {
        self.bells += 1;
    }

    fn sync(&mut self) {}
}

/// A countermeasure invocation captured by [`RecordingCountermeasures`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Play(Cue),
    AlertInBackground(Alert),
    DisableKillSwitches,
    Capture,
    Publish,
    Notify(Alert, Option<String>),
    Retract,
    Discard,
    PowerOff,
}

/// Countermeasures that only record what they were asked to do
#[derive(Default)]
pub struct RecordingCountermeasures {
    calls: RefCell<Vec<Call>>,
    fail_capture: bool,
    fail_power_off: bool,
}

impl RecordingCountermeasures {
    /// Link returned by `publish`
    pub const LINK: &'static str = "https://images.example/evidence.jpg";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    pub fn failing_power_off(mut self) -> Self {
        self.fail_power_off = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Number of times the power-off step ran
    pub fn power_offs(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| **c == Call::PowerOff)
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Countermeasures for RecordingCountermeasures {
    fn play(&self, cue: Cue) {
        self.record(Call::Play(cue));
    }

    fn alert_in_background(&self, alert: Alert) {
        self.record(Call::AlertInBackground(alert));
    }

    fn disable_kill_switches(&self) -> ActionResult<()> {
        self.record(Call::DisableKillSwitches);
        Ok(())
    }

    fn capture(&self) -> ActionResult<Evidence> {
        self.record(Call::Capture);
        if self.fail_capture {
            return Err("no camera".into());
        }
        Ok(Evidence {
            path: PathBuf::from("/tmp/vigil-evidence.jpg"),
        })
    }

    fn publish(&self, _evidence: &Evidence) -> ActionResult<Option<PublishedEvidence>> {
        self.record(Call::Publish);
        Ok(Some(PublishedEvidence {
            link: Self::LINK.to_string(),
            delete_token: "token".to_string(),
        }))
    }

    fn notify(&self, alert: Alert, media: Option<&str>) -> ActionResult<()> {
        self.record(Call::Notify(alert, media.map(str::to_string)));
        Ok(())
    }

    fn retract(&self, _published: &PublishedEvidence, _delay: Duration) -> ActionResult<()> {
        self.record(Call::Retract);
        Ok(())
    }

    fn discard(&self, _evidence: &Evidence) -> ActionResult<()> {
        self.record(Call::Discard);
        Ok(())
    }

    fn power_off(&self) -> ActionResult<()> {
        self.record(Call::PowerOff);
        if self.fail_power_off {
            return Err("sudo: a password is required".into());
        }
        Ok(())
    }
}
