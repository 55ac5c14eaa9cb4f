use crate::keyboard::KeyboardDevice;
use anyhow::{bail, Context, Result};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use tracing::{info, warn};

/// KEY_CNT from linux/input-event-codes.h; key codes must stay below it.
const KEY_CNT: u32 = 0x300;

pub trait EventEmitter {
    fn emit_events(&mut self, events: &[InputEvent]) -> Result<()>;
}

impl EventEmitter for VirtualDevice {
    fn emit_events(&mut self, events: &[InputEvent]) -> Result<()> {
        self.emit(events)?;
        Ok(())
    }
}

fn syn() -> InputEvent {
    InputEvent::new(EventType::SYNCHRONIZATION, 0, 0)
}

fn key_code(code: u32) -> Result<u16> {
    if code >= KEY_CNT {
        bail!("key code {:#x} is out of range", code);
    }
    Ok(code as u16)
}

/// A keyboard that turns key actions into evdev KEY + SYN events.
///
/// Outside of tests the emitter is a uinput device; dropping the keyboard
/// destroys it, so the device goes away on every exit path.
pub struct VirtualKeyboard<E: EventEmitter = VirtualDevice> {
    emitter: E,
    name: String,
}

impl VirtualKeyboard<VirtualDevice> {
    /// Create a uinput keyboard called `name`. It advertises the first 256
    /// key codes plus any higher code listed in `codes`.
    pub fn open(name: &str, codes: impl IntoIterator<Item = u32>) -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in 0..=255u16 {
            keys.insert(Key::new(code));
        }
        for code in codes {
            match key_code(code) {
                Ok(code) => {
                    keys.insert(Key::new(code));
                }
                Err(e) => {
                    warn!(error = %e, "key not advertised by virtual keyboard");
                }
            }
        }

        let vdev = VirtualDeviceBuilder::new()
            .context("opening /dev/uinput")?
            .name(name)
            .with_keys(&keys)
            .context("setting keys")?
            .build()
            .context("building virtual device")?;

        info!(name, "virtual keyboard created");
        Ok(Self::with_emitter(vdev, name))
    }
}

impl<E: EventEmitter> VirtualKeyboard<E> {
    pub fn with_emitter(emitter: E, name: &str) -> Self {
        Self {
            emitter,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release the device now rather than at end of scope.
    pub fn close(self) {
        drop(self);
    }

    fn emit_key(&mut self, code: u32, value: i32) -> Result<()> {
        let code = key_code(code)?;
        self.emitter
            .emit_events(&[InputEvent::new(EventType::KEY, code, value), syn()])
    }
}

impl<E: EventEmitter> KeyboardDevice for VirtualKeyboard<E> {
    fn key_down(&mut self, code: u32) -> Result<()> {
        self.emit_key(code, 1)
    }

    fn key_up(&mut self, code: u32) -> Result<()> {
        self.emit_key(code, 0)
    }
}

impl<E: EventEmitter> Drop for VirtualKeyboard<E> {
    fn drop(&mut self) {
        info!(name = %self.name, "virtual keyboard closed");
    }
}
