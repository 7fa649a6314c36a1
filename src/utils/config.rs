//! Runtime configuration

use std::time::Duration;

/// Environment variable overriding the request timeout (milliseconds)
pub const ENV_TIMEOUT_MS: &str = "NAGARE_CLIENT_TIMEOUT_MS";
/// Environment variable overriding the user agent
pub const ENV_USER_AGENT: &str = "NAGARE_CLIENT_USER_AGENT";

/// Configuration shared by the transport, loader and dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Per-request timeout
    pub request_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Header marking a request as a background request
    pub background_header: (String, String),
    /// Query parameter carrying JSON-encoded extra parameters
    pub params_key: String,
    /// Attribute carrying the action tag on clickable elements
    pub action_attribute: String,
    /// Marker attribute on injected named stylesheets
    pub css_marker_attribute: String,
    /// Marker attribute on named scripts rendered by the server
    pub js_marker_attribute: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
            background_header: ("X-REQUESTED-WITH".to_string(), "XMLHttpRequest".to_string()),
            params_key: "_params".to_string(),
            action_attribute: "data-nagare".to_string(),
            css_marker_attribute: "data-nagare-css".to_string(),
            js_marker_attribute: "data-nagare-js".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration overlaid with `NAGARE_CLIENT_*` variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = std::env::var(ENV_TIMEOUT_MS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Ok(agent) = std::env::var(ENV_USER_AGENT) {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }

        config
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the query parameter used for extra parameters
    pub fn with_params_key(mut self, key: impl Into<String>) -> Self {
        self.params_key = key.into();
        self
    }
}
