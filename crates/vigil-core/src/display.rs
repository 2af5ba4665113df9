//! Display server abstraction used by the grabber and the input loop

use crate::error::{GrabError, Result};
use crate::input::InputEvent;

/// Operations the locker needs from a display server
///
/// Implementations are driven from a single thread. Every grab request
/// reports success as `Ok(true)`; `Ok(false)` means the server refused the
/// grab for now (another client holds it) and the caller may retry.
pub trait DisplayServer {
    /// Handle to a full-screen cover window and its per-window resources
    type Cover;

    /// Number of screens to lock
    fn screen_count(&self) -> usize;

    /// Create and map an override-redirect, topmost cover window
    fn create_cover(&mut self, screen: usize) -> std::result::Result<Self::Cover, GrabError>;

    /// Try once to grab the pointer for the cover's screen
    fn grab_pointer(&mut self, cover: &Self::Cover) -> std::result::Result<bool, GrabError>;

    /// Try once to grab the keyboard for the cover's screen
    fn grab_keyboard(&mut self, cover: &Self::Cover) -> std::result::Result<bool, GrabError>;

    /// Start receiving restack-worthy notifications for the cover's screen
    fn watch_screen(&mut self, cover: &Self::Cover);

    /// Destroy the cover window and its resources
    ///
    /// Grabs belong to the client, not to a cover, so they are left in place.
    fn release_cover(&mut self, cover: Self::Cover);

    /// Release the pointer and keyboard grabs held by this client
    fn ungrab(&mut self);

    /// Block until the next input event arrives
    fn next_event(&mut self) -> Result<InputEvent>;

    /// Put the cover window back on top of the stacking order
    fn raise(&mut self, cover: &Self::Cover);

    /// Ring the display bell
    fn bell(&mut self);

    /// Flush pending requests and wait for the server to process them
    fn sync(&mut self);
}
