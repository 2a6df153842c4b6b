use crate::session::NegotiationState;
use tandem_core::{ConnectionId, Error, ErrorCode, Identity, NegotiationError, RoomId};

/// What the engine reports to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Welcome {
        connection_id: ConnectionId,
    },
    Joined {
        identity: Identity,
        room_id: RoomId,
    },
    PeerJoined {
        identity: Identity,
        connection_id: ConnectionId,
    },
    PeerLeft {
        identity: Identity,
        connection_id: ConnectionId,
    },
    IncomingCall {
        from: ConnectionId,
    },
    SessionState {
        remote: ConnectionId,
        state: NegotiationState,
    },
    NegotiationFailed {
        remote: ConnectionId,
        error: NegotiationError,
    },
    MediaFailed {
        error: Error,
    },
    RelayError {
        code: ErrorCode,
        message: String,
    },
}
