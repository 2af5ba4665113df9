//! Input events delivered by the display server and their classification

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keysym;

/// A single event pulled from the display server
#[derive(Debug)]
pub enum InputEvent {
    /// A key was pressed
    Key(KeyPress),
    /// Anything else (pointer motion, map/configure notifications, ...)
    Other,
}

/// A key press translated to a keysym plus the text it produces
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPress {
    pub keysym: u32,
    pub text: Vec<u8>,
}

impl KeyPress {
    pub fn new(keysym: u32, text: impl Into<Vec<u8>>) -> Self {
        Self {
            keysym,
            text: text.into(),
        }
    }

    /// A press that produces no text (modifiers, function keys, ...)
    pub fn bare(keysym: u32) -> Self {
        Self::new(keysym, Vec::new())
    }

    /// A press of a printable character whose keysym equals its Latin-1 value
    pub fn char(c: char) -> Self {
        let mut buf = [0u8; 4];
        Self::new(c as u32, c.encode_utf8(&mut buf).as_bytes())
    }

    /// Decide what this key does to the secret buffer
    pub fn action(&self, danger_armed: bool) -> KeyAction<'_> {
        let sym = keysym::normalize(self.keysym);

        if danger_armed && keysym::is_danger(sym) {
            return KeyAction::Danger(self.printable());
        }

        if keysym::is_function(sym)
            || keysym::is_keypad(sym)
            || keysym::is_misc_function(sym)
            || keysym::is_pf(sym)
            || keysym::is_private_keypad(sym)
        {
            return KeyAction::Ignore;
        }

        match sym {
            keysym::RETURN => KeyAction::Submit,
            keysym::ESCAPE => KeyAction::Cancel,
            keysym::BACKSPACE | keysym::DELETE => KeyAction::Erase,
            _ => self.printable().map_or(KeyAction::Ignore, KeyAction::Text),
        }
    }

    fn printable(&self) -> Option<&[u8]> {
        match self.text.first() {
            Some(&first) if !first.is_ascii_control() => Some(&self.text),
            _ => None,
        }
    }
}

impl std::fmt::Debug for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPress")
            .field("keysym", &format_args!("{:#x}", self.keysym))
            .field("text_len", &self.text.len())
            .finish()
    }
}

/// Effect of a key press on the lock loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction<'a> {
    /// Verify the buffered secret
    Submit,
    /// Discard the buffered secret
    Cancel,
    /// Remove the last buffered byte
    Erase,
    /// Append text to the buffer
    Text(&'a [u8]),
    /// Escalate immediately, then handle any text the key produced
    Danger(Option<&'a [u8]>),
    /// Nothing to do
    Ignore,
}
