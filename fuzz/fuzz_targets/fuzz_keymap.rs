#![no_main]

use libfuzzer_sys::fuzz_target;
use vigil_x11::Keymap;

fuzz_target!(|input: (u8, u8, Vec<u32>, Vec<(u8, u16)>)| {
    let (min_keycode, per_keycode, keysyms, presses) = input;
    let keymap = Keymap::new(min_keycode, per_keycode, keysyms);

    for (keycode, state) in presses {
        let (sym, text) = keymap.lookup(keycode, state);
        assert_eq!(sym, keymap.keysym(keycode, state));
        // At most one UTF-8 encoded character
        assert!(text.len() <= 4);
    }
});
