use crate::keymap::KeymapSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variables naming an alternative keymap file, in order of
/// precedence. `KEYMAPS` is the name older scripts set.
pub const KEYMAP_ENVS: [&str; 2] = ["RETYPE_KEYMAP", "KEYMAPS"];

pub const DEFAULT_DEVICE_NAME: &str = "retype-keyboard";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub keymap: KeymapConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Pause after each key press.
    #[serde(default = "TypingConfig::default_interval")]
    pub interval_ms: u64,
    /// Pause before the virtual device is created.
    #[serde(default)]
    pub delay_secs: u64,
}

impl TypingConfig {
    fn default_interval() -> u64 { 1 }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1,
            delay_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeymapConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "DeviceConfig::default_name")]
    pub name: String,
}

impl DeviceConfig {
    fn default_name() -> String { DEFAULT_DEVICE_NAME.into() }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.into(),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("retype")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load the user config if there is one, defaults otherwise.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "parsing config TOML")
    }

    /// Pick the keymap source: explicit flag, then `RETYPE_KEYMAP`, then
    /// `KEYMAPS`, then the config file, then the embedded keymap.
    pub fn keymap_source(&self, flag: Option<&Path>) -> KeymapSource {
        let env = env_keymap(|name| std::env::var_os(name));
        self.keymap_source_with(flag, env)
    }

    fn keymap_source_with(&self, flag: Option<&Path>, env: Option<PathBuf>) -> KeymapSource {
        let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
        flag.map(Path::to_path_buf)
            .filter(non_empty)
            .or(env.filter(non_empty))
            .or_else(|| self.keymap.path.clone().filter(non_empty))
            .map_or(KeymapSource::Embedded, KeymapSource::File)
    }
}

/// First non-empty keymap variable in `KEYMAP_ENVS` order.
fn env_keymap(lookup: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    KEYMAP_ENVS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(vars: &[(&str, &str)]) -> Option<PathBuf> {
        let vars: HashMap<&str, OsString> =
            vars.iter().map(|&(k, v)| (k, OsString::from(v))).collect();
        env_keymap(|name| vars.get(name).cloned())
    }

    // --- defaults ---

    #[test]
    fn default_interval_is_1ms() {
        let config = Config::default();
        assert_eq!(config.typing.interval_ms, 1);
    }

    #[test]
    fn default_delay_is_zero() {
        let config = Config::default();
        assert_eq!(config.typing.delay_secs, 0);
    }

    #[test]
    fn default_device_name() {
        let config = Config::default();
        assert_eq!(config.device.name, "retype-keyboard");
    }

    #[test]
    fn default_has_no_keymap_path() {
        assert!(Config::default().keymap.path.is_none());
    }

    // --- TOML parsing ---

    #[test]
    fn parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.typing.interval_ms, 1);
        assert_eq!(config.device.name, "retype-keyboard");
        assert!(config.keymap.path.is_none());
    }

    #[test]
    fn parse_custom_interval() {
        let toml = r#"
[typing]
interval_ms = 20
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.typing.interval_ms, 20);
        assert_eq!(config.typing.delay_secs, 0);
    }

    #[test]
    fn parse_keymap_and_device() {
        let toml = r#"
[keymap]
path = "/etc/retype/de.keymap"

[device]
name = "macro-kbd"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.keymap.path, Some(PathBuf::from("/etc/retype/de.keymap")));
        assert_eq!(config.device.name, "macro-kbd");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[typing]\ndelay_secs = 3").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.typing.delay_secs, 3);
        assert_eq!(config.typing.interval_ms, 1);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("config.toml")).is_err());
    }

    #[test]
    fn load_from_invalid_toml_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[typing]\ninterval_ms = \"fast\"").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn config_path_ends_with_config_toml() {
        let path = Config::config_path();
        assert_eq!(path.file_name().unwrap(), "config.toml");
        assert!(path.parent().unwrap().ends_with("retype"));
    }

    // --- keymap source precedence ---

    #[test]
    fn no_override_uses_embedded_keymap() {
        let config = Config::default();
        assert_eq!(config.keymap_source_with(None, None), KeymapSource::Embedded);
    }

    #[test]
    fn flag_beats_env_and_config() {
        let mut config = Config::default();
        config.keymap.path = Some("/from/config".into());
        let source = config.keymap_source_with(
            Some(Path::new("/from/flag")),
            Some("/from/env".into()),
        );
        assert_eq!(source, KeymapSource::File("/from/flag".into()));
    }

    #[test]
    fn env_beats_config() {
        let mut config = Config::default();
        config.keymap.path = Some("/from/config".into());
        let source = config.keymap_source_with(None, Some("/from/env".into()));
        assert_eq!(source, KeymapSource::File("/from/env".into()));
    }

    #[test]
    fn config_path_used_last() {
        let mut config = Config::default();
        config.keymap.path = Some("/from/config".into());
        assert_eq!(
            config.keymap_source_with(None, None),
            KeymapSource::File("/from/config".into())
        );
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let mut config = Config::default();
        assert_eq!(
            config.keymap_source_with(None, Some(PathBuf::new())),
            KeymapSource::Embedded
        );
        config.keymap.path = Some("/from/config".into());
        assert_eq!(
            config.keymap_source_with(None, Some(PathBuf::new())),
            KeymapSource::File("/from/config".into())
        );
    }

    #[test]
    fn keymaps_variable_is_honoured() {
        assert_eq!(
            env_from(&[("KEYMAPS", "/from/keymaps")]),
            Some(PathBuf::from("/from/keymaps"))
        );
    }

    #[test]
    fn retype_keymap_beats_keymaps() {
        assert_eq!(
            env_from(&[("RETYPE_KEYMAP", "/from/retype"), ("KEYMAPS", "/from/keymaps")]),
            Some(PathBuf::from("/from/retype"))
        );
    }

    #[test]
    fn empty_retype_keymap_falls_back_to_keymaps() {
        assert_eq!(
            env_from(&[("RETYPE_KEYMAP", ""), ("KEYMAPS", "/from/keymaps")]),
            Some(PathBuf::from("/from/keymaps"))
        );
        assert_eq!(env_from(&[]), None);
    }
}
