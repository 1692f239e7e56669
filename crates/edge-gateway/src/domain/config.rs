//! Gateway configuration with validation.
//!
//! Defaults are suitable for local development; `from_env` layers
//! environment overrides on top of them.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// WebSocket push channel configuration
    pub websocket: WebSocketConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Listing limits
    pub limits: LimitsConfig,
}

impl GatewayConfig {
    /// Defaults overridden by the process environment.
    ///
    /// Recognised variables:
    /// - `EDGE_HTTP_HOST`, `EDGE_HTTP_PORT`: bind address
    /// - `EDGE_WS_PUBLISH_INTERVAL_SECS`: seconds between metric pushes
    /// - `EDGE_WS_BUFFER`: per-connection outbound queue length
    /// - `CORS_ORIGINS`: comma separated allowed origins
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparsable values are
    /// logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = parsed(&lookup, "EDGE_HTTP_HOST") {
            self.http.host = host;
        }
        if let Some(port) = parsed(&lookup, "EDGE_HTTP_PORT") {
            self.http.port = port;
        }
        if let Some(secs) = parsed::<u64, _>(&lookup, "EDGE_WS_PUBLISH_INTERVAL_SECS") {
            self.websocket.publish_interval = Duration::from_secs(secs);
        }
        if let Some(buffer) = parsed(&lookup, "EDGE_WS_BUFFER") {
            self.websocket.message_buffer_size = buffer;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                self.cors.allowed_origins = origins;
            }
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.websocket.publish_interval.is_zero() {
            return Err(ConfigError::InvalidInterval(
                "publish_interval cannot be 0".into(),
            ));
        }

        if self.websocket.message_buffer_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "message_buffer_size cannot be 0".into(),
            ));
        }

        if !self.websocket.path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "websocket path must start with '/': {}",
                self.websocket.path
            )));
        }

        if self.limits.list_limit == 0 || self.limits.default_page_limit == 0 {
            return Err(ConfigError::InvalidLimit("list limits cannot be 0".into()));
        }

        if self.limits.default_page_limit > self.limits.list_limit {
            return Err(ConfigError::InvalidLimit(format!(
                "default_page_limit {} exceeds list_limit {}",
                self.limits.default_page_limit, self.limits.list_limit
            )));
        }

        let cors = &self.cors;
        let any_wildcard = [&cors.allowed_origins, &cors.allowed_methods, &cors.allowed_headers]
            .iter()
            .any(|values| values.iter().any(|v| v == "*"));
        if cors.enabled && cors.allow_credentials && any_wildcard {
            return Err(ConfigError::Invalid(
                "CORS credentials require explicit origins, methods and headers".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8001)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8001,
        }
    }
}

/// WebSocket push channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Route the upgrade is served on
    pub path: String,
    /// Interval between synthetic metric pushes
    #[serde(with = "humantime_serde")]
    pub publish_interval: Duration,
    /// Outbound queue length per connection; a full queue evicts the subscriber
    pub message_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            path: "/ws".to_string(),
            publish_interval: edge_bus::DEFAULT_PUBLISH_INTERVAL,
            message_buffer_size: 256,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods ("*" for all)
    pub allowed_methods: Vec<String>,
    /// Allowed headers ("*" for all)
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache, in seconds
    pub max_age: u64,
    /// Allow credentials
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
            max_age: 86400, // 24 hours
            allow_credentials: false,
        }
    }
}

/// Listing limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Upper bound on documents returned by unpaged list endpoints
    pub list_limit: usize,
    /// Default `limit` for paged endpoints (metrics, security events)
    pub default_page_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            list_limit: 1000,
            default_page_limit: 100,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Invalid interval value
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Duration (de)serialization as `"5s"`, `"250ms"` or `"2m"` strings.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s": both end in 's'.
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or("invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_addr().port(), 8001);
        assert_eq!(config.websocket.path, "/ws");
        assert_eq!(config.websocket.publish_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides() {
        let config = GatewayConfig::default().with_overrides(lookup(&[
            ("EDGE_HTTP_HOST", "127.0.0.1"),
            ("EDGE_HTTP_PORT", "9000"),
            ("EDGE_WS_PUBLISH_INTERVAL_SECS", "2"),
            ("EDGE_WS_BUFFER", "16"),
            ("CORS_ORIGINS", "http://localhost:3000, https://ops.example.com"),
        ]));

        assert_eq!(config.http_addr(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.websocket.publish_interval, Duration::from_secs(2));
        assert_eq!(config.websocket.message_buffer_size, 16);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:3000", "https://ops.example.com"]
        );
    }

    #[test]
    fn test_bad_override_ignored() {
        let config = GatewayConfig::default().with_overrides(lookup(&[("EDGE_HTTP_PORT", "nope")]));
        assert_eq!(config.http.port, 8001);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = GatewayConfig::default();
        config.websocket.publish_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidInterval(_))));
    }

    #[test]
    fn test_page_limit_bounded_by_list_limit() {
        let mut config = GatewayConfig::default();
        config.limits.default_page_limit = 5000;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLimit(_))));
    }

    #[test]
    fn test_credentials_with_wildcard_rejected() {
        let mut config = GatewayConfig::default();
        config.cors.allow_credentials = true;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duration_strings() {
        use humantime_serde::parse_duration;
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("7"), Ok(Duration::from_secs(7)));
        assert!(parse_duration("soon").is_err());
        assert_eq!(parse_duration(&format!("{}m", u64::MAX)), Err("invalid minutes"));
    }

    #[test]
    fn test_config_from_json_sections() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "websocket": { "publish_interval": "1500ms" },
            "limits": { "list_limit": 50, "default_page_limit": 10 }
        }))
        .unwrap();
        assert_eq!(config.websocket.publish_interval, Duration::from_millis(1500));
        assert_eq!(config.websocket.message_buffer_size, 256);
        assert_eq!(config.limits.list_limit, 50);
    }
}
