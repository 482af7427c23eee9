use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global subscriber appending plain-text events to `path`.
///
/// Returns false when another subscriber was already installed; that one
/// stays in place.
pub fn init_file_logging(path: &Path) -> std::io::Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
    if let Err(err) = &installed {
        debug!(path = %path.display(), %err, "keeping existing subscriber");
    }
    Ok(installed.is_ok())
}
