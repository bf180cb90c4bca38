//! # Config Command
//!
//! Shows the effective configuration, or writes a default config file.

use std::path::PathBuf;

use tracing::debug;

use crate::error::AppResult;
use crate::state::AppConfig;

/// Returns the effective configuration as TOML.
///
/// With `init`, writes `config` to `path` (or the default location) first.
pub fn run(config: &AppConfig, init: bool, path: Option<PathBuf>) -> AppResult<String> {
    debug!(init, "config command");

    let toml = config.to_toml()?;
    if init {
        let written = config.save(path)?;
        return Ok(format!("# written to {}\n{}", written.display(), toml));
    }

    let location = path
        .or_else(AppConfig::default_config_path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    Ok(format!("# config file: {}\n{}", location, toml))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_config() {
        let out = run(&AppConfig::default(), false, Some(PathBuf::from("/etc/pendler.toml"))).unwrap();
        assert!(out.starts_with("# config file: /etc/pendler.toml\n"));
        assert!(out.contains("[rates]"));
        assert!(out.contains("meal_rate_24h = 28.0"));
    }

    #[test]
    fn test_init_writes_file() {
        let path = std::env::temp_dir().join(format!("pendler-{}-init.toml", std::process::id()));
        let out = run(&AppConfig::default(), true, Some(path.clone())).unwrap();
        let loaded = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(out.starts_with("# written to "));
        assert!(loaded.contains("station_distance = 0.0"));
    }
}
