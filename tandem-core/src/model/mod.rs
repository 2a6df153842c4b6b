mod connection;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use room::{Identity, RoomId};
pub use signaling::{ClientMessage, ErrorCode, IceServerConfig, ServerMessage};
