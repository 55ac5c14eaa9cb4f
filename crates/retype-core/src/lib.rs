pub mod config;
pub mod keymap;
pub mod names;

pub use keymap::{load_keymap, parse_keymap, KeyEntry, Keymap, KeymapSource};
