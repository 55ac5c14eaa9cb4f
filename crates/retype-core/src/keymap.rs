use crate::names;
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, trace};

/// Linux `KEY_LEFTSHIFT`. The only modifier a keymap line can ask for.
pub const KEY_LEFTSHIFT: u32 = 42;

/// Keymap shipped inside the binary, used when no override is configured.
/// `retype --dump-keymap` prints it verbatim.
pub const DEFAULT_KEYMAP: &str = include_str!("../keymaps/us.keymap");

/// What to press for one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEntry {
    /// Key code; 0 means unbound.
    pub code: u32,
    /// Key held down around the press; 0 means none.
    pub modifier: u32,
}

impl KeyEntry {
    pub fn new(code: u32, modifier: u32) -> Self {
        Self { code, modifier }
    }

    pub fn is_bound(&self) -> bool {
        self.code != 0
    }

    pub fn has_modifier(&self) -> bool {
        self.modifier != 0
    }
}

/// Character → key entry table, built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    entries: HashMap<char, KeyEntry>,
}

impl Keymap {
    pub fn get(&self, c: char) -> Option<KeyEntry> {
        self.entries.get(&c).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every non-zero key code the keymap can emit, modifiers included.
    pub fn key_codes(&self) -> BTreeSet<u32> {
        self.entries
            .values()
            .flat_map(|e| [e.code, e.modifier])
            .filter(|&code| code != 0)
            .collect()
    }
}

impl FromIterator<(char, KeyEntry)> for Keymap {
    fn from_iter<I: IntoIterator<Item = (char, KeyEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Where the keymap document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeymapSource {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for KeymapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeymapSource::Embedded => f.write_str("<embedded>"),
            KeymapSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read and parse a keymap. Only reading an external file can fail; the
/// document itself is parsed best-effort.
pub fn load_keymap(source: &KeymapSource) -> Result<Keymap> {
    let keymap = match source {
        KeymapSource::Embedded => parse_keymap(DEFAULT_KEYMAP),
        KeymapSource::File(path) => {
            let contents = std::fs::read(path)
                .with_context(|| format!("reading keymap from {}", path.display()))?;
            parse_keymap(contents)
        }
    };
    debug!(source = %source, keys = keymap.len(), "keymap parsed");
    Ok(keymap)
}

/// Parse a keymap document. Lines that don't describe a mapping are skipped,
/// so a partly broken document still yields every line that is well formed.
/// A later line for the same character replaces an earlier one.
///
/// The document is raw bytes: a line that isn't valid UTF-8 can't match and
/// is dropped on its own.
pub fn parse_keymap(document: impl AsRef<[u8]>) -> Keymap {
    let mut keymap = Keymap::default();
    for (idx, raw) in document.as_ref().split(|&b| b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        match parse_line(&line) {
            Some((c, entry)) => {
                keymap.entries.insert(c, entry);
            }
            None => trace!(line = idx + 1, text = %line, "skipping keymap line"),
        }
    }
    keymap
}

/// `<char-or-name> 0x<hex> [<modifier>]`, fields separated by single spaces.
fn parse_line(line: &str) -> Option<(char, KeyEntry)> {
    if line.starts_with('#') || line.starts_with(' ') {
        return None;
    }
    if !line.contains("0x") {
        return None;
    }

    // Each space delimits a field, so doubled or trailing spaces count.
    let tokens: Vec<&str> = line.split(' ').collect();
    if !(2..=3).contains(&tokens.len()) {
        return None;
    }

    let c = parse_character(tokens[0])?;
    let code = parse_code(tokens[1])?;
    // The third column's text is not interpreted: its presence means shift.
    let modifier = if tokens.len() == 3 { KEY_LEFTSHIFT } else { 0 };

    Some((c, KeyEntry::new(code, modifier)))
}

fn parse_character(token: &str) -> Option<char> {
    if token.len() == 1 {
        token.chars().next()
    } else {
        names::resolve(token)
    }
}

/// Hex literal with a mandatory `0x` prefix, within the non-negative i32 range.
fn parse_code(token: &str) -> Option<u32> {
    let digits = token.strip_prefix("0x")?;
    let value = i32::from_str_radix(digits, 16).ok()?;
    u32::try_from(value).ok()
}
