//! Tracing subscriber setup
//!
//! Level precedence: `--log-level`, then `RUST_LOG`, then `info`. Terminal UI
//! modes draw on stderr, so their logs go to a file instead of the screen.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber; only the first call in a process succeeds
pub fn init(level: Option<&str>, log_file: Option<&Path>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level: {level}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let builder = fmt().with_env_filter(filter).with_target(false);

    let installed = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file at {:?}", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stdout).try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}
