use std::time::Duration;

/// Default interval between status polls when the push channel is down.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default backend URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Render client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// HTTP base URL of the backend.
    pub api_url: String,
    /// WebSocket base URL of the backend.
    pub ws_url: String,
    /// Bearer token sent with HTTP requests, if any.
    pub api_token: Option<String>,
    /// Interval of the polling fallback.
    pub poll_interval: Duration,
    /// Ask the backend to fetch source video with the creator's OAuth
    /// credentials rather than anonymously.
    pub prefer_oauth: bool,
}

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} has an invalid value: '{value}'")]
    Invalid { var: &'static str, value: String },
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: derive_ws_url(DEFAULT_API_URL),
            api_token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            prefer_oauth: true,
        }
    }
}

impl RenderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                        |
    /// |---------------------------|--------------------------------|
    /// | `CLIPWISE_API_URL`        | `http://localhost:8000`        |
    /// | `CLIPWISE_WS_URL`         | API URL with `ws`/`wss` scheme |
    /// | `CLIPWISE_API_TOKEN`      | unset                          |
    /// | `RENDER_POLL_INTERVAL_MS` | `2000`                         |
    /// | `RENDER_PREFER_OAUTH`     | `true`                         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CLIPWISE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let ws_url = lookup("CLIPWISE_WS_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| derive_ws_url(&api_url));

        let api_token = lookup("CLIPWISE_API_TOKEN").filter(|v| !v.is_empty());

        let poll_interval = match lookup("RENDER_POLL_INTERVAL_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "RENDER_POLL_INTERVAL_MS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_POLL_INTERVAL,
        };

        let prefer_oauth = match lookup("RENDER_PREFER_OAUTH") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: "RENDER_PREFER_OAUTH",
                value: raw,
            })?,
            None => true,
        };

        Ok(Self {
            api_url,
            ws_url,
            api_token,
            poll_interval,
            prefer_oauth,
        })
    }
}

/// Map an HTTP base URL onto its WebSocket counterpart.
pub fn derive_ws_url(api_url: &str) -> String {
    let api_url = api_url.trim_end_matches('/');
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_string()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RenderConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RenderConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(load(&[]).unwrap(), RenderConfig::default());
        let config = load(&[]).unwrap();
        assert_eq!(config.ws_url, "ws://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert!(config.prefer_oauth);
    }

    #[test]
    fn ws_url_derived_from_https_api_url() {
        let config = load(&[("CLIPWISE_API_URL", "https://api.clipwise.app/")]).unwrap();
        assert_eq!(config.api_url, "https://api.clipwise.app");
        assert_eq!(config.ws_url, "wss://api.clipwise.app");
    }

    #[test]
    fn explicit_ws_url_wins() {
        let config = load(&[
            ("CLIPWISE_API_URL", "http://localhost:8000"),
            ("CLIPWISE_WS_URL", "ws://realtime.local:9000/"),
        ])
        .unwrap();
        assert_eq!(config.ws_url, "ws://realtime.local:9000");
    }

    #[test]
    fn poll_interval_and_oauth_overrides() {
        let config = load(&[
            ("RENDER_POLL_INTERVAL_MS", "500"),
            ("RENDER_PREFER_OAUTH", "no"),
            ("CLIPWISE_API_TOKEN", "secret"),
        ])
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert!(!config.prefer_oauth);
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            load(&[("RENDER_POLL_INTERVAL_MS", "soon")]).unwrap_err(),
            ConfigError::Invalid {
                var: "RENDER_POLL_INTERVAL_MS",
                value: "soon".into()
            }
        );
        assert!(load(&[("RENDER_POLL_INTERVAL_MS", "0")]).is_err());
        assert!(load(&[("RENDER_PREFER_OAUTH", "maybe")]).is_err());
    }
}
