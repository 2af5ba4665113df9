//! X11 implementation of the locker's display server

use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt as _, CreateGCAux,
    CreateWindowAux, EventMask, GrabMode, GrabStatus as XGrabStatus, Rectangle, Screen,
    StackMode, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

use vigil_core::{DisplayServer, GrabError, InputEvent, KeyPress};

use crate::error::{Result, X11Error};
use crate::keymap::Keymap;

/// Side length of the blank cursor bitmap
const CURSOR_SIZE: u16 = 8;

/// Per-screen X resources owned by a lock session
#[derive(Debug)]
pub struct X11Cover {
    pub screen: usize,
    pub root: u32,
    pub window: u32,
    pixmap: u32,
    cursor: u32,
}

/// Connection to the X server plus what is needed to translate key presses
pub struct X11Display {
    conn: RustConnection,
    screens: Vec<Screen>,
    keymap: Keymap,
}

impl X11Display {
    /// Connect to `$DISPLAY` and load the keyboard mapping
    pub fn connect() -> Result<Self> {
        let (conn, _default_screen) = x11rb::connect(None)?;
        let setup = conn.setup();
        let screens = setup.roots.clone();
        let min = setup.min_keycode;
        let count = setup.max_keycode - min + 1;

        let mapping = conn.get_keyboard_mapping(min, count)?.reply()?;
        let keymap = Keymap::new(min, mapping.keysyms_per_keycode, mapping.keysyms);

        debug!("Connected to X server with {} screen(s)", screens.len());
        Ok(Self {
            conn,
            screens,
            keymap,
        })
    }

    fn build_cover(&self, info: &Screen, screen: usize) -> Result<X11Cover> {
        let root = info.root;

        let window = self.conn.generate_id()?;
        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            root,
            0,
            0,
            info.width_in_pixels,
            info.height_in_pixels,
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .override_redirect(1)
                .background_pixel(info.black_pixel),
        )?;

        // 1-bit pixmap cleared to zero gives a fully transparent cursor
        let pixmap = self.conn.generate_id()?;
        self.conn
            .create_pixmap(1, pixmap, window, CURSOR_SIZE, CURSOR_SIZE)?;
        let gc = self.conn.generate_id()?;
        self.conn
            .create_gc(gc, pixmap, &CreateGCAux::new().foreground(0))?;
        self.conn.poly_fill_rectangle(
            pixmap,
            gc,
            &[Rectangle {
                x: 0,
                y: 0,
                width: CURSOR_SIZE,
                height: CURSOR_SIZE,
            }],
        )?;
        self.conn.free_gc(gc)?;

        let cursor = self.conn.generate_id()?;
        self.conn
            .create_cursor(cursor, pixmap, pixmap, 0, 0, 0, 0, 0, 0, 0, 0)?;
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().cursor(cursor),
        )?;

        self.conn.map_window(window)?;
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        self.conn.flush()?;

        Ok(X11Cover {
            screen,
            root,
            window,
            pixmap,
            cursor,
        })
    }

    fn try_grab_pointer(&self, cover: &X11Cover) -> Result<bool> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                cover.root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                cover.cursor,
                CURRENT_TIME,
            )?
            .reply()?;
        Ok(reply.status == XGrabStatus::SUCCESS)
    }

    fn try_grab_keyboard(&self, cover: &X11Cover) -> Result<bool> {
        let reply = self
            .conn
            .grab_keyboard(true, cover.root, CURRENT_TIME, GrabMode::ASYNC, GrabMode::ASYNC)?
            .reply()?;
        Ok(reply.status == XGrabStatus::SUCCESS)
    }

    fn destroy(&self, cover: &X11Cover) -> Result<()> {
        self.conn.free_cursor(cover.cursor)?;
        self.conn.free_pixmap(cover.pixmap)?;
        self.conn.destroy_window(cover.window)?;
        self.conn.flush()?;
        Ok(())
    }

    fn release_grabs(&self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        self.conn.ungrab_keyboard(CURRENT_TIME)?;
        self.conn.flush()?;
        Ok(())
    }

    fn round_trip(&self) -> Result<()> {
        self.conn.get_input_focus()?.reply()?;
        Ok(())
    }
}

impl DisplayServer for X11Display {
    type Cover = X11Cover;

    fn screen_count(&self) -> usize {
        self.screens.len()
    }

    fn create_cover(&mut self, screen: usize) -> std::result::Result<X11Cover, GrabError> {
        let info = self
            .screens
            .get(screen)
            .ok_or_else(|| GrabError::Window(format!("no screen {}", screen)))?;
        self.build_cover(info, screen)
            .map_err(|e| GrabError::Window(e.to_string()))
    }

    fn grab_pointer(&mut self, cover: &X11Cover) -> std::result::Result<bool, GrabError> {
        Ok(self.try_grab_pointer(cover)?)
    }

    fn grab_keyboard(&mut self, cover: &X11Cover) -> std::result::Result<bool, GrabError> {
        Ok(self.try_grab_keyboard(cover)?)
    }

    fn watch_screen(&mut self, cover: &X11Cover) {
        let result = self
            .conn
            .change_window_attributes(
                cover.root,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_NOTIFY),
            )
            .map_err(X11Error::from)
            .and_then(|_| self.conn.flush().map_err(X11Error::from));
        if let Err(e) = result {
            warn!("Cannot watch root of screen {}: {}", cover.screen, e);
        }
    }

    fn release_cover(&mut self, cover: X11Cover) {
        if let Err(e) = self.destroy(&cover) {
            warn!("Failed to release screen {}: {}", cover.screen, e);
        }
    }

    fn ungrab(&mut self) {
        if let Err(e) = self.release_grabs() {
            warn!("Failed to release grabs: {}", e);
        }
    }

    fn next_event(&mut self) -> vigil_core::Result<InputEvent> {
        let event = self.conn.wait_for_event().map_err(X11Error::from)?;
        Ok(match event {
            Event::KeyPress(key) => {
                let (keysym, text) = self.keymap.lookup(key.detail, u16::from(key.state));
                InputEvent::Key(KeyPress::new(keysym, text))
            }
            Event::MappingNotify(_) => {
                if let Err(e) = self.reload_keymap() {
                    warn!("Failed to reload keyboard mapping: {}", e);
                }
                InputEvent::Other
            }
            _ => InputEvent::Other,
        })
    }

    fn raise(&mut self, cover: &X11Cover) {
        let result = self
            .conn
            .configure_window(
                cover.window,
                &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
            )
            .map_err(X11Error::from)
            .and_then(|_| self.conn.flush().map_err(X11Error::from));
        if let Err(e) = result {
            debug!("Raise failed on screen {}: {}", cover.screen, e);
        }
    }

    fn bell(&mut self) {
        if let Err(e) = self.conn.bell(100).and_then(|_| self.conn.flush()) {
            debug!("Bell failed: {}", e);
        }
    }

    fn sync(&mut self) {
        if let Err(e) = self.round_trip() {
            warn!("X server sync failed: {}", e);
        }
    }
}

impl X11Display {
    fn reload_keymap(&mut self) -> Result<()> {
        let setup = self.conn.setup();
        let min = setup.min_keycode;
        let count = setup.max_keycode - min + 1;
        let mapping = self.conn.get_keyboard_mapping(min, count)?.reply()?;
        self.keymap = Keymap::new(min, mapping.keysyms_per_keycode, mapping.keysyms);
        Ok(())
    }
}
