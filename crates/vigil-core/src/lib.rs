//! Vigil Core - Lock acquisition, input handling and escalation
//!
//! This crate holds everything in the screen locker that has real invariants:
//! - Per-screen input grabs with bounded retry ([`ScreenGrabber`])
//! - Aggregation of screen locks into an effective lock ([`LockCoordinator`])
//! - Constant-effort credential verification ([`CredentialVerifier`])
//! - The key-press state machine that assembles and submits secrets
//!   ([`InputStateMachine`])
//! - The failure-tiered response pipeline ([`EscalationPolicy`])
//!
//! The display server and the side-effect actions are reached only through
//! the [`DisplayServer`] and [`Countermeasures`] traits.
//!
//! # Features
//!
//! - `mock` - Enable a scripted display and recording countermeasures for tests

pub mod context;
pub mod coordinator;
pub mod credential;
pub mod display;
pub mod error;
pub mod escalation;
pub mod grabber;
pub mod input;
pub mod keysym;
pub mod machine;
pub mod secret;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use context::{AttemptCounter, LockContext};
pub use coordinator::LockCoordinator;
pub use credential::{
    CredentialBackend, CredentialVerifier, ExternalAuthenticator, HashedSecret, StaticSecret,
};
pub use display::DisplayServer;
pub use error::{GrabError, LockError, Result};
pub use escalation::{
    ActionResult, Alert, Countermeasures, Cue, EscalationPolicy, Evidence, Features,
    PublishedEvidence, Tier,
};
pub use grabber::{GrabPolicy, GrabStatus, LockSession, ScreenGrabber};
pub use input::{InputEvent, KeyAction, KeyPress};
pub use machine::InputStateMachine;
pub use secret::SecretBuffer;

/// Capacity of the secret buffer in bytes
pub const SECRET_CAPACITY: usize = 256;

/// Default number of grab attempts per input device
pub const GRAB_ATTEMPTS: u32 = 1000;

/// Default pause between grab attempts in milliseconds
pub const GRAB_INTERVAL_MS: u64 = 1;

/// Failed attempts tolerated before the alarm tier
pub const ALARM_AFTER: u32 = 2;

/// Failed attempts tolerated before the severe tier
pub const SEVERE_AFTER: u32 = 5;
