//! Keycode to keysym/text translation from the server's keyboard mapping
//!
//! This follows the core protocol rules for choosing between the first two
//! keysyms of a keycode (Shift, Lock, NumLock). Group switching and input
//! methods are not supported; the locker only needs printable text plus the
//! handful of control keys it reacts to.

use vigil_core::keysym;

const NO_SYMBOL: u32 = 0;

const SHIFT_MASK: u16 = 1 << 0;
const LOCK_MASK: u16 = 1 << 1;
const CONTROL_MASK: u16 = 1 << 2;
const NUM_LOCK_MASK: u16 = 1 << 4;

/// Snapshot of the server's keycode to keysym table
#[derive(Clone, Debug)]
pub struct Keymap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<u32>,
}

impl Keymap {
    pub fn new(min_keycode: u8, per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode,
            per_keycode: usize::from(per_keycode.max(1)),
            keysyms,
        }
    }

    /// Keysym for a keycode under the given modifier state
    pub fn keysym(&self, keycode: u8, state: u16) -> u32 {
        let (lower, upper) = self.columns(keycode);

        if state & NUM_LOCK_MASK != 0 && keysym::is_keypad(upper) {
            return if state & SHIFT_MASK != 0 { lower } else { upper };
        }

        let shift = state & SHIFT_MASK != 0;
        let lock = state & LOCK_MASK != 0 && is_alphabetic(lower);
        if shift ^ lock {
            upper
        } else {
            lower
        }
    }

    /// Keysym plus the text it produces
    pub fn lookup(&self, keycode: u8, state: u16) -> (u32, Vec<u8>) {
        let sym = self.keysym(keycode, state);
        let text = match keysym_to_char(sym) {
            Some(c) if state & CONTROL_MASK != 0 && ('@'..='\x7f').contains(&c) => {
                vec![(c as u8) & 0x1f]
            }
            Some(c) => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf).as_bytes().to_vec()
            }
            None => Vec::new(),
        };
        (sym, text)
    }

    fn columns(&self, keycode: u8) -> (u32, u32) {
        let Some(index) = keycode.checked_sub(self.min_keycode) else {
            return (NO_SYMBOL, NO_SYMBOL);
        };
        let base = usize::from(index) * self.per_keycode;
        let get = |i: usize| {
            if i < self.per_keycode {
                self.keysyms.get(base + i).copied().unwrap_or(NO_SYMBOL)
            } else {
                NO_SYMBOL
            }
        };

        let first = get(0);
        let second = get(1);
        if second == NO_SYMBOL {
            case_pair(first)
        } else {
            (first, second)
        }
    }
}

/// Lower and upper case keysyms for a single-keysym keycode
fn case_pair(sym: u32) -> (u32, u32) {
    match sym {
        0x41..=0x5a => (sym + 0x20, sym),
        0x61..=0x7a => (sym, sym - 0x20),
        0xc0..=0xde if sym != 0xd7 => (sym + 0x20, sym),
        0xe0..=0xfe if sym != 0xf7 => (sym, sym - 0x20),
        _ => (sym, sym),
    }
}

fn is_alphabetic(sym: u32) -> bool {
    let (lower, upper) = case_pair(sym);
    lower != upper
}

/// Character produced by a keysym, if it is a text keysym
pub fn keysym_to_char(sym: u32) -> Option<char> {
    match sym {
        0x20..=0x7e | 0xa0..=0xff => char::from_u32(sym),
        0x0100_0100..=0x0110_ffff => char::from_u32(sym - 0x0100_0000),
        keysym::KP_0..=keysym::KP_9 => char::from_u32(sym - keysym::KP_0 + u32::from(b'0')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Keycodes 8..=12: a/A, 1/!, Return, KP_End/KP_1, eacute (single column)
    fn sample() -> Keymap {
        Keymap::new(
            8,
            2,
            vec![
                0x61,
                0x41,
                0x31,
                0x21,
                keysym::RETURN,
                NO_SYMBOL,
                0xff9c,
                keysym::KP_0 + 1,
                0xe9,
                NO_SYMBOL,
            ],
        )
    }

    #[rstest]
    #[case(8, 0, 0x61)]
    #[case(8, SHIFT_MASK, 0x41)]
    #[case(8, LOCK_MASK, 0x41)]
    #[case(8, SHIFT_MASK | LOCK_MASK, 0x61)]
    #[case(9, LOCK_MASK, 0x31)]
    #[case(9, SHIFT_MASK, 0x21)]
    #[case(10, SHIFT_MASK, keysym::RETURN)]
    #[case(11, 0, 0xff9c)]
    #[case(11, NUM_LOCK_MASK, keysym::KP_0 + 1)]
    #[case(12, SHIFT_MASK, 0xc9)]
    fn test_keysym_selection(#[case] keycode: u8, #[case] state: u16, #[case] expected: u32) {
        assert_eq!(sample().keysym(keycode, state), expected);
    }

    #[test]
    fn test_lookup_text() {
        let map = sample();
        assert_eq!(map.lookup(8, 0), (0x61, b"a".to_vec()));
        assert_eq!(map.lookup(12, 0), (0xe9, "é".as_bytes().to_vec()));
        assert_eq!(map.lookup(10, 0), (keysym::RETURN, Vec::new()));
        assert_eq!(map.lookup(11, NUM_LOCK_MASK).1, b"1".to_vec());
    }

    #[test]
    fn test_control_produces_control_byte() {
        let (_, text) = sample().lookup(8, CONTROL_MASK);
        assert_eq!(text, vec![0x01]);
    }

    #[test]
    fn test_out_of_range_keycode() {
        assert_eq!(sample().keysym(3, 0), NO_SYMBOL);
        assert_eq!(sample().keysym(200, 0), NO_SYMBOL);
    }

    #[test]
    fn test_unicode_keysym() {
        assert_eq!(keysym_to_char(0x0100_20ac), Some('€'));
        assert_eq!(keysym_to_char(keysym::F1), None);
    }
}
