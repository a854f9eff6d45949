use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Config {
    /// Public base URL of this service, without a trailing slash.
    pub fn site_url(&self) -> String {
        match self.server.site_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.server.host, self.server.port),
        }
    }

    /// URL the conversion service posts status updates to.
    pub fn callback_url(&self) -> String {
        format!("{}/callback", self.site_url())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL, used to build the callback URL
    /// (default: http://<host>:<port>)
    #[serde(default)]
    pub site_url: Option<String>,

    /// Directory holding the job database (default: next to the config file)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            site_url: None,
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Base URL of the conversion service
    #[serde(default)]
    pub server_url: Option<String>,

    /// Pre-shared key. Only its SHA-256 digest is ever sent.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Public base URL that replaces the scheme and host of storage URLs
    /// reported in callbacks
    #[serde(default)]
    pub public_url_base: Option<String>,

    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,

    /// Attempts for submit and delete before giving up (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts; attempt N waits N times this (default: 2)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_remote_timeout() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    2
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            public_url_base: None,
            timeout_secs: default_remote_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl RemoteConfig {
    /// The API key, if set to something non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn server_url(&self) -> Option<&str> {
        self.server_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn public_url_base(&self) -> Option<&str> {
        self.public_url_base
            .as_deref()
            .filter(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Timeout for the reachability check on submitted URLs
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

fn default_probe_timeout() -> u64 {
    10
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout(),
        }
    }
}
