//! Vigil X11 - Display server backend over the X11 protocol
//!
//! Implements [`vigil_core::DisplayServer`] with `x11rb`: one
//! override-redirect cover window per screen, pointer and keyboard grabs on
//! the root window, and key press translation through the server's keyboard
//! mapping.

pub mod display;
pub mod error;
pub mod keymap;

pub use display::{X11Cover, X11Display};
pub use error::{Result, X11Error};
pub use keymap::Keymap;
