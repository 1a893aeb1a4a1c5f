mod types;

pub use types::*;

use anyhow::{Context, Result};
use plex_catalog::{header_map, MAX_TIMEOUT, TOKEN_PARAM};
use reqwest::header::HeaderMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./plex-export.toml",
        "~/.config/plex-export/config.toml",
        "/etc/plex-export/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let url = Url::parse(&config.server.url)
        .with_context(|| format!("Invalid server url: {}", config.server.url))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Server url must use http or https: {}", config.server.url);
    }

    if config.server.timeout_secs == 0 {
        anyhow::bail!("Server timeout cannot be 0");
    }
    if config.server.timeout_secs > MAX_TIMEOUT.as_secs() {
        anyhow::bail!(
            "Server timeout cannot exceed {} seconds",
            MAX_TIMEOUT.as_secs()
        );
    }

    header_map(&config.headers).context("Invalid header in config")?;

    Ok(())
}

impl Config {
    /// Apply command-line overrides on top of the loaded file and re-validate.
    pub fn with_overrides(
        mut self,
        url: Option<String>,
        token: Option<String>,
        headers: &[(String, String)],
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        if let Some(url) = url {
            self.server.url = url;
        }
        if let Some(token) = token {
            self.server.token = Some(token);
        }
        for (name, value) in headers {
            self.headers.insert(name.clone(), value.clone());
        }
        if let Some(timeout_secs) = timeout_secs {
            self.server.timeout_secs = timeout_secs;
        }

        validate_config(&self)?;
        Ok(self)
    }

    /// The server URL with the configured token, unless the URL already has one.
    pub fn server_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.server.url)
            .with_context(|| format!("Invalid server url: {}", self.server.url))?;

        if let Some(token) = self.server.token.as_deref().filter(|t| !t.is_empty()) {
            let has_token = url
                .query_pairs()
                .any(|(k, v)| k == TOKEN_PARAM && !v.is_empty());
            if !has_token {
                url.query_pairs_mut().append_pair(TOKEN_PARAM, token);
            }
        }

        Ok(url.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Configured request headers, or `None` to keep the catalog default.
    pub fn request_headers(&self) -> Result<Option<HeaderMap>> {
        if self.headers.is_empty() {
            return Ok(None);
        }
        Ok(Some(header_map(&self.headers)?))
    }
}
