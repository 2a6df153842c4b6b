use anyhow::Context;
use axum::http::{HeaderValue, Method};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use tandem_core::utils::{DEFAULT_RELAY_PORT, default_ice_servers};
use tandem_core::{Error, IceServerConfig, Result};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const ANY_ORIGIN: &str = "*";

/// Relay settings. Every field has a default, so a partial JSON file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `"*"` admits any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Handed to clients in `welcome`; the relay itself never contacts them.
    #[serde(default = "default_ice_servers")]
    pub ice_servers: Vec<IceServerConfig>,
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    DEFAULT_RELAY_PORT
}

fn default_allowed_origins() -> Vec<String> {
    vec![ANY_ORIGIN.to_owned()]
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            ice_servers: default_ice_servers(),
        }
    }
}

impl RelayConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read relay config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse relay config {}", path.display()))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == ANY_ORIGIN)
    }

    pub fn cors_layer(&self) -> Result<CorsLayer> {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET])
            .allow_headers(Any);

        if self.allows_any_origin() {
            return Ok(cors.allow_origin(Any));
        }

        let origins = self
            .allowed_origins
            .iter()
            .map(|origin| parse_origin(origin))
            .collect::<Result<Vec<_>>>()?;

        Ok(cors.allow_origin(AllowOrigin::list(origins)))
    }
}

fn parse_origin(origin: &str) -> Result<HeaderValue> {
    let origin = origin.trim().trim_end_matches('/');
    if !(origin.starts_with("http://") || origin.starts_with("https://")) {
        return Err(Error::InvalidArgument(format!(
            "origin '{origin}' must start with http:// or https://"
        )));
    }
    HeaderValue::from_str(origin)
        .map_err(|e| Error::InvalidArgument(format!("origin '{origin}': {e}")))
}
