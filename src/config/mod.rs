mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./trailerio.toml",
        "~/.config/trailerio/config.toml",
        "/etc/trailerio/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.fetch.timeout_ms == 0 {
        anyhow::bail!("Fetch timeout must be greater than 0");
    }

    if config.cache.ttl_secs == 0 {
        anyhow::bail!("Cache TTL must be greater than 0");
    }

    if config.cache.max_entries == 0 {
        anyhow::bail!("Cache max_entries must be greater than 0");
    }

    if config.sources.enabled.is_empty() {
        tracing::warn!("No trailer sources enabled; every lookup will return no links");
    }

    let mut seen = Vec::with_capacity(config.sources.enabled.len());
    for kind in &config.sources.enabled {
        if seen.contains(kind) {
            anyhow::bail!("Source '{}' is listed more than once", kind);
        }
        seen.push(*kind);
    }

    Ok(())
}
