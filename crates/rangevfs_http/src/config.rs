//! Configuration for the HTTP transport.

use std::time::Duration;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("rangevfs/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`crate::ReqwestClient`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// User agent header.
    pub user_agent: String,
    /// Base URL that relative paths are joined to.
    pub base_url: Option<String>,
}

impl HttpConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: None,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the base URL for relative paths.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolves `path` against the base URL.
    ///
    /// Absolute `http://` and `https://` URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("rangevfs/"));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn config_builder() {
        let config = HttpConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("rangevfs-test")
            .with_base_url("https://cdn.example.com/db/");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "rangevfs-test");
        assert_eq!(
            config.resolve("/app.db"),
            "https://cdn.example.com/db/app.db"
        );
    }

    #[test]
    fn absolute_urls_are_kept() {
        let config = HttpConfig::new().with_base_url("https://a.example.com");
        assert_eq!(
            config.resolve("http://b.example.com/x.db"),
            "http://b.example.com/x.db"
        );
        assert_eq!(HttpConfig::new().resolve("x.db"), "x.db");
    }
}
