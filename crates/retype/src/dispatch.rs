use crate::keyboard::KeyboardDevice;
use anyhow::Result;
use retype_core::{KeyEntry, Keymap};
use std::io::Read;
use std::time::Duration;
use tracing::{trace, warn};

/// What happened to the bytes of one input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Bytes typed on the keyboard.
    pub pressed: usize,
    /// Bytes with no bound key.
    pub skipped: usize,
    /// Bytes whose key press the device rejected.
    pub failed: usize,
}

/// Press one keymap entry, holding its modifier around the key.
/// The modifier is released even if the key itself fails.
pub fn press(keyboard: &mut impl KeyboardDevice, entry: KeyEntry) -> Result<()> {
    if entry.has_modifier() {
        keyboard.key_down(entry.modifier)?;
    }
    let pressed = keyboard.key_press(entry.code);
    let released = if entry.has_modifier() {
        keyboard.key_up(entry.modifier)
    } else {
        Ok(())
    };
    pressed.and(released)
}

/// Type `input` byte by byte, sleeping `interval` after every key press.
///
/// Bytes are looked up on their own, so multi-byte UTF-8 sequences never
/// match. Unknown and unbound bytes are skipped without a pause. A failed
/// press is logged and not retried. Stops at end of input or at the first
/// read error.
pub fn type_stream<R: Read, K: KeyboardDevice>(
    input: R,
    keymap: &Keymap,
    keyboard: &mut K,
    interval: Duration,
) -> DispatchStats {
    let mut stats = DispatchStats::default();

    for byte in input.bytes() {
        let byte = match byte {
            Ok(byte) => byte,
            Err(e) => {
                warn!(error = %e, "reading input failed, stopping");
                break;
            }
        };

        let c = char::from(byte);
        let Some(entry) = keymap.get(c).filter(KeyEntry::is_bound) else {
            trace!(byte, "no key bound");
            stats.skipped += 1;
            continue;
        };

        match press(keyboard, entry) {
            Ok(()) => stats.pressed += 1,
            Err(e) => {
                warn!(key = ?c, code = entry.code, error = %e, "key press failed");
                stats.failed += 1;
            }
        }
        std::thread::sleep(interval);
    }

    stats
}
