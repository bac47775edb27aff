//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoints and timing used by [`LeaseClient`](super::LeaseClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:5000/api`
    pub base_url: String,

    pub login_path: String,
    pub register_path: String,
    pub refresh_path: String,
    pub profile_path: String,

    /// Timeout for ordinary requests in seconds (0 = none)
    pub request_timeout_secs: u64,

    /// Upper bound on one refresh call; hitting it ends the session
    pub refresh_timeout_secs: u64,

    /// Period of the background token refresh
    pub auto_refresh_interval_secs: u64,

    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            login_path: "/usuarios/login".to_string(),
            register_path: "/usuarios/register".to_string(),
            refresh_path: "/usuarios/refresh".to_string(),
            profile_path: "/usuarios/profile".to_string(),
            request_timeout_secs: 30,
            refresh_timeout_secs: 10,
            auto_refresh_interval_secs: 60,
            user_agent: concat!("leasedesk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub const fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }

    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    pub const fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_interval_secs)
    }

    /// Paths on which a 401 means bad credentials rather than a stale token
    pub fn is_refresh_exempt(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        path == self.login_path || path == self.register_path || path == self.refresh_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_are_exempt() {
        let config = ClientConfig::default();
        assert!(config.is_refresh_exempt("/usuarios/login"));
        assert!(config.is_refresh_exempt("/usuarios/register"));
        assert!(config.is_refresh_exempt("/usuarios/refresh?x=1"));
        assert!(!config.is_refresh_exempt("/personas"));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "https://api.example.com"}"#).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.refresh_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }
}
