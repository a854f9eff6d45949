mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variables that override values from the config file.
pub const ENV_API_KEY: &str = "VODBRIDGE_API_KEY";
pub const ENV_SERVER_URL: &str = "VODBRIDGE_SERVER_URL";
pub const ENV_PUBLIC_URL_BASE: &str = "VODBRIDGE_PUBLIC_URL_BASE";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
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
        "./vodbridge.toml",
        "~/.config/vodbridge/config.toml",
        "/etc/vodbridge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Overlay remote settings from the environment. Empty values are ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(ENV_API_KEY) {
        config.remote.api_key = Some(key);
    }
    if let Some(url) = get(ENV_SERVER_URL) {
        config.remote.server_url = Some(url);
    }
    if let Some(base) = get(ENV_PUBLIC_URL_BASE) {
        config.remote.public_url_base = Some(base);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if let Some(site_url) = config.server.site_url.as_deref() {
        check_http_url("server.site_url", site_url)?;
    }

    if config.remote.max_attempts == 0 {
        anyhow::bail!("remote.max_attempts must be at least 1");
    }

    if config.probe.timeout_secs == 0 {
        anyhow::bail!("probe.timeout_secs must be at least 1");
    }

    if let Some(url) = config.remote.server_url() {
        check_http_url("remote.server_url", url)?;
    }

    if let Some(base) = config.remote.public_url_base() {
        check_http_url("remote.public_url_base", base)?;
    }

    // Missing credentials are not fatal: the server still starts and lists
    // jobs, but submissions fail until they are configured.
    if config.remote.server_url().is_none() {
        tracing::warn!("remote.server_url is not set; submissions will be rejected");
    }
    if config.remote.api_key().is_none() {
        tracing::warn!("remote.api_key is not set; submissions and callbacks will be rejected");
    }

    Ok(())
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let url = url::Url::parse(value.trim())
        .with_context(|| format!("{field} is not a valid URL: {value}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{field} must be an http(s) URL: {value}");
    }
    Ok(())
}
