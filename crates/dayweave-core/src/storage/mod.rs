mod config;

pub use config::{Config, DayConfig, LayoutSection, LoggingConfig, PersistenceConfig};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns the data directory.
///
/// `DAYWEAVE_HOME` wins when set. Otherwise `~/.config/dayweave[-dev]/`,
/// where `DAYWEAVE_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = match std::env::var_os("DAYWEAVE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("DAYWEAVE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("dayweave-dev")
            } else {
                base_dir.join("dayweave")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
