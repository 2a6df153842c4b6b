use tandem_core::{ClientMessage, ConnectionId, ServerMessage};

/// Where an inbound frame goes once the relay has attached its sender.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Route {
    Join { identity: String, room_id: String },
    Leave,
    Direct { to: ConnectionId, message: ServerMessage },
}

impl Route {
    /// Payloads are moved, never rewritten; only the addressing changes hands.
    pub(crate) fn of(from: ConnectionId, msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::JoinRoom { identity, room_id } => Route::Join { identity, room_id },
            ClientMessage::LeaveRoom => Route::Leave,
            ClientMessage::UserCall { offer, to } => Route::Direct {
                to,
                message: ServerMessage::IncomingCall { offer, from },
            },
            ClientMessage::CallAccepted { answer, to } => Route::Direct {
                to,
                message: ServerMessage::CallAccepted { answer, from },
            },
            ClientMessage::PeerNegotiationNeeded { offer, to } => Route::Direct {
                to,
                message: ServerMessage::PeerNegotiationNeeded { offer, from },
            },
            ClientMessage::PeerNegotiationDone { answer, to } => Route::Direct {
                to,
                message: ServerMessage::PeerNegotiationFinal { answer, from },
            },
            ClientMessage::IceCandidate { candidate, to } => Route::Direct {
                to,
                message: ServerMessage::IceCandidate { candidate, from },
            },
        }
    }
}
