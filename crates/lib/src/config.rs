//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.wiserchild/config.json`) and environment.
//! The credential (API key) is never part of the config: it travels with every chat request.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Relay server settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Upstream language-model provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Settings for clients (CLI chat, desktop) that talk to the relay.
    #[serde(default)]
    pub client: ClientConfig,
}

/// Relay bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Port for HTTP (default 15152).
    #[serde(default = "default_relay_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_relay_bind")]
    pub bind: String,
}

/// Upstream provider (Anthropic Messages API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// API base URL. Overridden by WISERCHILD_PROVIDER_URL env.
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Model id sent with every call.
    #[serde(default = "default_provider_model")]
    pub model: String,

    /// Generation length cap (max output tokens).
    #[serde(default = "default_provider_max_tokens")]
    pub max_tokens: u32,
}

/// Client-side settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Full relay base URL (e.g. "http://127.0.0.1:15152"). When unset, derived from `relay`.
    /// Overridden by WISERCHILD_RELAY_URL env.
    pub relay_url: Option<String>,
}

fn default_relay_port() -> u16 {
    15152
}

fn default_relay_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_provider_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_provider_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_provider_max_tokens() -> u32 {
    1024
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: default_relay_port(),
            bind: default_relay_bind(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            model: default_provider_model(),
            max_tokens: default_provider_max_tokens(),
        }
    }
}

/// Non-empty trimmed value of an env var.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the provider base URL: env WISERCHILD_PROVIDER_URL overrides config. No trailing slash.
pub fn resolve_provider_base_url(config: &Config) -> String {
    env_non_empty("WISERCHILD_PROVIDER_URL")
        .unwrap_or_else(|| config.provider.base_url.trim().to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve the relay URL clients post to: env WISERCHILD_RELAY_URL, then `client.relayUrl`,
/// then `http://{relay.bind}:{relay.port}`.
pub fn resolve_relay_url(config: &Config) -> String {
    env_non_empty("WISERCHILD_RELAY_URL")
        .or_else(|| {
            config
                .client
                .relay_url
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| relay_url_from_bind(&config.relay))
        .trim_end_matches('/')
        .to_string()
}

/// `http://bind:port`, with wildcard binds mapped to loopback so clients can connect.
fn relay_url_from_bind(relay: &RelayConfig) -> String {
    let host = match relay.bind.trim() {
        "0.0.0.0" | "" => "127.0.0.1",
        "::" | "[::]" => "::1",
        other => other,
    };
    format!("http://{}:{}", bracket_host(host), relay.port)
}

/// Host part for a `host:port` string; bare IPv6 literals get brackets.
pub fn bracket_host(host: &str) -> String {
    let h = host.trim();
    if h.contains(':') && !h.starts_with('[') {
        format!("[{}]", h)
    } else {
        h.to_string()
    }
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "[::1]" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WISERCHILD_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".wiserchild").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, the default path, or WISERCHILD_CONFIG_PATH. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_relay_port_and_bind() {
        let r = RelayConfig::default();
        assert_eq!(r.port, 15152);
        assert_eq!(r.bind, "127.0.0.1");
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.provider.model, "claude-sonnet-4-20250514");
        assert_eq!(config.provider.max_tokens, 1024);
        assert!(config.client.relay_url.is_none());
    }

    #[test]
    fn partial_provider_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"provider":{"maxTokens":256},"relay":{"port":9000}}"#).unwrap();
        assert_eq!(config.provider.max_tokens, 256);
        assert_eq!(config.provider.base_url, "https://api.anthropic.com");
        assert_eq!(config.relay.port, 9000);
        assert_eq!(config.relay.bind, "127.0.0.1");
    }

    #[test]
    fn relay_url_from_wildcard_bind_uses_loopback() {
        let relay = RelayConfig {
            port: 8080,
            bind: "0.0.0.0".to_string(),
        };
        assert_eq!(relay_url_from_bind(&relay), "http://127.0.0.1:8080");
    }

    #[test]
    fn relay_url_brackets_ipv6_binds() {
        let url = |bind: &str| {
            relay_url_from_bind(&RelayConfig {
                port: 15152,
                bind: bind.to_string(),
            })
        };
        assert_eq!(url("::1"), "http://[::1]:15152");
        assert_eq!(url("::"), "http://[::1]:15152");
        assert_eq!(url("fe80::2"), "http://[fe80::2]:15152");
        assert_eq!(url("[::1]"), "http://[::1]:15152");
        assert_eq!(url("localhost"), "http://localhost:15152");
    }

    #[test]
    fn relay_url_prefers_client_setting() {
        let mut config = Config::default();
        config.client.relay_url = Some("http://chat.example:80/".to_string());
        if std::env::var("WISERCHILD_RELAY_URL").is_err() {
            assert_eq!(resolve_relay_url(&config), "http://chat.example:80");
        }
    }

    #[test]
    fn loopback_detection() {
        assert!(is_loopback_bind("127.0.0.1"));
        assert!(is_loopback_bind(" localhost "));
        assert!(!is_loopback_bind("0.0.0.0"));
    }

    #[test]
    fn load_missing_file_is_default() {
        let path = std::env::temp_dir().join(format!("wiser-missing-{}.json", uuid::Uuid::new_v4()));
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.relay.port, 15152);
    }
}
