use crate::model::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:global.stun.twilio.com:3478";

pub const DEFAULT_RELAY_PORT: u16 = 8000;

/// Path of the relay's WebSocket endpoint.
pub const SIGNALING_PATH: &str = "/ws";

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig::new([DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2])]
}
