// Shared transport configuration for building reqwest::Client instances.
//
// The device speaks plain HTTP on its private port, so there is no TLS or
// cookie handling here -- only timeout and user-agent tuning. The timeout
// doubles as the stall guard for the session machine: a request that never
// answers fails here instead of wedging the poll loop.

use std::time::Duration;

/// Transport configuration for the device HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout (connect + response).
    pub timeout: Duration,
    /// User-Agent header sent on every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("atag-one/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
