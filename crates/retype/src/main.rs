mod dispatch;
mod keyboard;
mod uinput_emitter;

use anyhow::{Context, Result};
use clap::Parser;
use retype_core::config::Config;
use retype_core::keymap::{self, DEFAULT_KEYMAP};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use uinput_emitter::VirtualKeyboard;

#[derive(Parser, Debug)]
#[command(name = "retype", version, about = "Type standard input on a virtual keyboard")]
struct Cli {
    /// Wait this long before typing (seconds)
    #[arg(long, value_name = "SECONDS")]
    delay: Option<u64>,

    /// Pause between key presses (milliseconds, default 1)
    #[arg(long, value_name = "MILLISECONDS")]
    interval: Option<u64>,

    /// Alternative keymap file (or set RETYPE_KEYMAP or KEYMAPS)
    #[arg(long, value_name = "PATH")]
    keymap: Option<PathBuf>,

    /// Print the embedded keymap and exit (use it as a template for your own)
    #[arg(long)]
    dump_keymap: bool,

    /// Config file (default: ~/.config/retype/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Name of the virtual keyboard device
    #[arg(long, value_name = "NAME")]
    device_name: Option<String>,
}

/// Effective run settings: command line first, then config file.
#[derive(Debug, PartialEq)]
struct Settings {
    delay: Duration,
    interval: Duration,
    device_name: String,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            delay: Duration::from_secs(cli.delay.unwrap_or(config.typing.delay_secs)),
            interval: Duration::from_millis(cli.interval.unwrap_or(config.typing.interval_ms)),
            device_name: cli
                .device_name
                .clone()
                .unwrap_or_else(|| config.device.name.clone()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.dump_keymap {
        std::io::stdout()
            .write_all(DEFAULT_KEYMAP.as_bytes())
            .context("writing keymap to stdout")?;
        return Ok(());
    }

    // stdout is reserved for --dump-keymap
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("retype=info".parse()?),
        )
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().context("loading config")?,
    };
    let settings = Settings::resolve(&cli, &config);

    let source = config.keymap_source(cli.keymap.as_deref());
    let keymap = keymap::load_keymap(&source).context("loading keymap")?;
    if keymap.is_empty() {
        warn!(source = %source, "keymap has no usable lines, nothing will be typed");
    }
    info!(source = %source, keys = keymap.len(), "keymap loaded");

    if !settings.delay.is_zero() {
        info!(delay = ?settings.delay, "waiting before typing");
        std::thread::sleep(settings.delay);
    }

    let mut keyboard = VirtualKeyboard::open(&settings.device_name, keymap.key_codes())
        .context("creating virtual keyboard")?;

    let stats = dispatch::type_stream(
        std::io::stdin().lock(),
        &keymap,
        &mut keyboard,
        settings.interval,
    );
    info!(
        device = keyboard.name(),
        pressed = stats.pressed,
        skipped = stats.skipped,
        failed = stats.failed,
        "input finished"
    );

    keyboard.close();
    Ok(())
}
