use crate::model::connection::ConnectionId;
use crate::model::room::{Identity, RoomId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            username: None,
            credential: None,
        }
    }
}

/// Frames a participant sends to the relay.
///
/// SDP bodies and ICE candidates are opaque strings: the relay moves them into
/// the forwarded [`ServerMessage`] without looking inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        identity: String,
        room_id: String,
    },
    LeaveRoom,
    UserCall {
        offer: String,
        #[serde(rename = "toConnectionId")]
        to: ConnectionId,
    },
    CallAccepted {
        answer: String,
        #[serde(rename = "toConnectionId")]
        to: ConnectionId,
    },
    PeerNegotiationNeeded {
        offer: String,
        #[serde(rename = "toConnectionId")]
        to: ConnectionId,
    },
    PeerNegotiationDone {
        answer: String,
        #[serde(rename = "toConnectionId")]
        to: ConnectionId,
    },
    IceCandidate {
        candidate: String,
        #[serde(rename = "toConnectionId")]
        to: ConnectionId,
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::LeaveRoom => "leave-room",
            Self::UserCall { .. } => "user-call",
            Self::CallAccepted { .. } => "call-accepted",
            Self::PeerNegotiationNeeded { .. } => "peer-negotiation-needed",
            Self::PeerNegotiationDone { .. } => "peer-negotiation-done",
            Self::IceCandidate { .. } => "ice-candidate",
        }
    }

    /// Addressed peer, or `None` for room-level messages.
    pub fn destination(&self) -> Option<ConnectionId> {
        match self {
            Self::JoinRoom { .. } | Self::LeaveRoom => None,
            Self::UserCall { to, .. }
            | Self::CallAccepted { to, .. }
            | Self::PeerNegotiationNeeded { to, .. }
            | Self::PeerNegotiationDone { to, .. }
            | Self::IceCandidate { to, .. } => Some(*to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    InvalidArgument,
}

/// Frames the relay sends to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Welcome {
        connection_id: ConnectionId,
        ice_servers: Vec<IceServerConfig>,
    },
    /// Acknowledges the receiver's own join.
    JoinRoom {
        identity: Identity,
        room_id: RoomId,
    },
    UserJoined {
        identity: Identity,
        connection_id: ConnectionId,
    },
    UserLeft {
        identity: Identity,
        connection_id: ConnectionId,
    },
    IncomingCall {
        offer: String,
        #[serde(rename = "fromConnectionId")]
        from: ConnectionId,
    },
    CallAccepted {
        answer: String,
        #[serde(rename = "fromConnectionId")]
        from: ConnectionId,
    },
    PeerNegotiationNeeded {
        offer: String,
        #[serde(rename = "fromConnectionId")]
        from: ConnectionId,
    },
    PeerNegotiationFinal {
        answer: String,
        #[serde(rename = "fromConnectionId")]
        from: ConnectionId,
    },
    IceCandidate {
        candidate: String,
        #[serde(rename = "fromConnectionId")]
        from: ConnectionId,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::JoinRoom { .. } => "join-room",
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
            Self::IncomingCall { .. } => "incoming-call",
            Self::CallAccepted { .. } => "call-accepted",
            Self::PeerNegotiationNeeded { .. } => "peer-negotiation-needed",
            Self::PeerNegotiationFinal { .. } => "peer-negotiation-final",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::Error { .. } => "error",
        }
    }
}
