//! X keysym values and the range predicates used to classify key presses

pub const BACKSPACE: u32 = 0xff08;
pub const RETURN: u32 = 0xff0d;
pub const ESCAPE: u32 = 0xff1b;
pub const DELETE: u32 = 0xffff;

pub const KP_ENTER: u32 = 0xff8d;
pub const KP_0: u32 = 0xffb0;
pub const KP_9: u32 = 0xffb9;

pub const F1: u32 = 0xffbe;
pub const F2: u32 = 0xffbf;
pub const F13: u32 = 0xffca;
pub const F35: u32 = 0xffe0;

pub const CONTROL_L: u32 = 0xffe3;
pub const CONTROL_R: u32 = 0xffe4;
pub const ALT_L: u32 = 0xffe9;
pub const ALT_R: u32 = 0xffea;

/// ASCII digit zero; keypad digits map onto `DIGIT_0..=DIGIT_0 + 9`
pub const DIGIT_0: u32 = 0x0030;

pub fn is_keypad(keysym: u32) -> bool {
    (0xff80..=0xffbd).contains(&keysym)
}

pub fn is_function(keysym: u32) -> bool {
    (F1..=F35).contains(&keysym)
}

pub fn is_misc_function(keysym: u32) -> bool {
    (0xff60..=0xff6b).contains(&keysym)
}

pub fn is_pf(keysym: u32) -> bool {
    (0xff91..=0xff94).contains(&keysym)
}

pub fn is_private_keypad(keysym: u32) -> bool {
    (0x1100_0000..=0x1100_ffff).contains(&keysym)
}

/// Keys treated as an attempt to escape the locker (ctrl/alt combos, VT switch)
pub fn is_danger(keysym: u32) -> bool {
    matches!(keysym, ALT_L | ALT_R | CONTROL_L | CONTROL_R) || (F1..=F13).contains(&keysym)
}

/// Map keypad Enter and keypad digits onto their main-row equivalents
pub fn normalize(keysym: u32) -> u32 {
    match keysym {
        KP_ENTER => RETURN,
        KP_0..=KP_9 => DIGIT_0 + (keysym - KP_0),
        other => other,
    }
}
