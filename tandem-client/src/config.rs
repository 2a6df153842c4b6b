use std::time::Duration;
use tandem_core::IceServerConfig;
use tandem_core::utils::{DEFAULT_RELAY_PORT, SIGNALING_PATH, default_ice_servers};

/// How long an offer may wait for its answer before the session gives up.
pub const DEFAULT_OFFER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_url: String,
    /// Used until the relay's `welcome` supplies its own list.
    pub ice_servers: Vec<IceServerConfig>,
    pub offer_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: format!("ws://127.0.0.1:{DEFAULT_RELAY_PORT}{SIGNALING_PATH}"),
            ice_servers: default_ice_servers(),
            offer_timeout: DEFAULT_OFFER_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_relay_url(mut self, relay_url: impl Into<String>) -> Self {
        self.relay_url = relay_url.into();
        self
    }

    pub fn with_offer_timeout(mut self, offer_timeout: Duration) -> Self {
        self.offer_timeout = offer_timeout;
        self
    }
}
