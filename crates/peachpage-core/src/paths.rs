//! Data directory resolution.

use std::env;
use std::path::PathBuf;

/// Environment variable that overrides the data directory location.
pub const DATA_DIR_ENV: &str = "PEACHPAGE_DATA_DIR";

/// Resolve the default data directory for forum documents.
///
/// `PEACHPAGE_DATA_DIR` wins when set and non-empty; otherwise the
/// documents live under `~/.config/peachpage`.
pub fn default_data_dir() -> Result<PathBuf, String> {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = home_dir().ok_or_else(|| "home directory not set".to_string())?;
    Ok(home.join(".config").join("peachpage"))
}

/// HOME on Unix-like systems, USERPROFILE on Windows.
fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .find_map(|var| env::var(var).ok().filter(|value| !value.is_empty()))
        .map(PathBuf::from)
}
