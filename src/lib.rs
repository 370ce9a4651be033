pub mod app;
pub mod clock;
pub mod console;
pub mod display;
pub mod ntp;
pub mod render;
pub mod settings;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use app::ClockApp;
use clock::SystemClock;
use console::ConsoleSink;
use ntp::NtpClient;
use settings::{RenderFlags, SettingsStore};

pub const SETTINGS_PATH_ENV: &str = "XPCLOCK_SETTINGS";
pub const DEBUG_ENV: &str = "XPCLOCK_DEBUG";
const DEFAULT_SETTINGS_PATH: &str = "xpclock.json";

fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH))
}

/// Console command keys, one per line on stdin.
enum Command {
    ToggleDate,
    ToggleHourFormat,
    ToggleBounce,
    ToggleGradient,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "f" => Some(Self::ToggleDate),
            "t" => Some(Self::ToggleHourFormat),
            "d" => Some(Self::ToggleBounce),
            "g" => Some(Self::ToggleGradient),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Runs the console clock until `q` or Ctrl+C.
pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    let level = if debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("xpclock starting up...");

    let settings = SettingsStore::new(settings_path())?;
    info!("Settings file: {}", settings.path().display());

    let (app, mut notices) = ClockApp::new(
        settings,
        Arc::new(SystemClock::new()),
        NtpClient::default(),
        Arc::new(ConsoleSink::from_env()),
    );
    app.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(notice) = notices.recv() => {
                warn!("{}: {}", notice.title, notice.message);
            }
            line = lines.next_line(), if stdin_open => {
                // Detached stdin: keep ticking until Ctrl+C.
                let Ok(Some(line)) = line else {
                    stdin_open = false;
                    continue;
                };
                match Command::parse(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => {
                        if let Err(err) = apply(&app, command).await {
                            error!("Command failed: {err:#}");
                        }
                    }
                    None => warn!("Unknown command {:?} (f, t, d, g, q)", line.trim()),
                }
            }
        }
    }

    app.shutdown().await
}

async fn apply(app: &ClockApp, command: Command) -> Result<()> {
    match command {
        Command::ToggleDate => {
            app.toggle_show_date().await;
        }
        Command::ToggleHourFormat => {
            app.toggle_hour_format().await;
        }
        Command::ToggleBounce => {
            let flags = app.settings().flags;
            app.set_render_flags(RenderFlags {
                dvd_logo: !flags.dvd_logo,
                ..flags
            })
            .await?;
        }
        Command::ToggleGradient => {
            let flags = app.settings().flags;
            app.set_render_flags(RenderFlags {
                gradient: !flags.gradient,
                ..flags
            })
            .await?;
        }
        Command::Quit => {}
    }
    Ok(())
}
