//! Environment configuration.

use std::time::Duration;

use url::Url;

use crate::application::streaming::StreamingSettings;
use crate::pages::MonitorSettings;
use worldline_protocol::DEFAULT_ECHO_MARKER;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws";
pub const DEFAULT_MONITOR_POLL_SECS: u64 = 10;
pub const DEFAULT_MONITOR_WINDOW: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub api_url: String,
    pub ws_url: String,
    pub id_token: Option<String>,
    pub echo_marker: String,
    pub monitor_poll: Duration,
    pub monitor_window: usize,
}

impl DashboardConfig {
    /// Read the process environment after loading `.env.local` / `.env` from
    /// the repo root.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv_from_repo_root();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = get("WORLDLINE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        check_url("WORLDLINE_API_URL", &api_url, &["http", "https"])?;

        let ws_url = get("WORLDLINE_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.into());
        check_url("WORLDLINE_WS_URL", &ws_url, &["ws", "wss"])?;

        let monitor_poll_secs = match get("WORLDLINE_MONITOR_POLL_SECS") {
            Some(raw) => parse_positive("WORLDLINE_MONITOR_POLL_SECS", &raw)?,
            None => DEFAULT_MONITOR_POLL_SECS,
        };
        let monitor_window = match get("WORLDLINE_MONITOR_WINDOW") {
            Some(raw) => parse_positive("WORLDLINE_MONITOR_WINDOW", &raw)? as usize,
            None => DEFAULT_MONITOR_WINDOW,
        };

        Ok(Self {
            api_url,
            ws_url,
            id_token: get("WORLDLINE_ID_TOKEN"),
            // The marker is matched as a raw substring, so surrounding spaces
            // are significant and it is not trimmed.
            echo_marker: lookup("WORLDLINE_ECHO_MARKER")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_ECHO_MARKER.into()),
            monitor_poll: Duration::from_secs(monitor_poll_secs),
            monitor_window,
        })
    }

    pub fn require_id_token(&self) -> Result<&str, ConfigError> {
        self.id_token
            .as_deref()
            .ok_or(ConfigError::Missing("WORLDLINE_ID_TOKEN"))
    }

    pub fn streaming(&self) -> StreamingSettings {
        StreamingSettings {
            base_url: self.ws_url.clone(),
            echo_marker: self.echo_marker.clone(),
        }
    }

    pub fn monitor(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: self.monitor_poll,
            window: self.monitor_window,
        }
    }
}

fn check_url(key: &'static str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::Invalid {
            key,
            message: format!("scheme must be one of {}", schemes.join(", ")),
        });
    }
    Ok(())
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            message: "must be greater than zero".into(),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<DashboardConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.echo_marker, "[echo]");
        assert_eq!(config.monitor_poll, Duration::from_secs(10));
        assert_eq!(config.monitor_window, 120);
        assert_eq!(config.require_id_token(), Err(ConfigError::Missing("WORLDLINE_ID_TOKEN")));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("WORLDLINE_API_URL", "https://lab.example/api"),
            ("WORLDLINE_WS_URL", "wss://lab.example/ws"),
            ("WORLDLINE_ID_TOKEN", "abc.def.ghi"),
            ("WORLDLINE_ECHO_MARKER", "(echo)"),
            ("WORLDLINE_MONITOR_POLL_SECS", "3"),
            ("WORLDLINE_MONITOR_WINDOW", "50"),
        ])
        .unwrap();
        assert_eq!(config.streaming().channel_url("chat"), "wss://lab.example/ws/chat");
        assert_eq!(config.require_id_token(), Ok("abc.def.ghi"));
        assert_eq!(config.echo_marker, "(echo)");
        assert_eq!(config.monitor_poll, Duration::from_secs(3));
        assert_eq!(config.monitor_window, 50);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("WORLDLINE_WS_URL", "http://lab.example/ws")]),
            Err(ConfigError::Invalid { key: "WORLDLINE_WS_URL", .. })
        ));
        assert!(matches!(
            config(&[("WORLDLINE_API_URL", "not a url")]),
            Err(ConfigError::Invalid { key: "WORLDLINE_API_URL", .. })
        ));
        assert!(matches!(
            config(&[("WORLDLINE_MONITOR_POLL_SECS", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
