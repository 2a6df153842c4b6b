use crate::model::ConnectionId;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed join or addressing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The destination is no longer connected. Never reported back to the sender.
    #[error("connection {0} is no longer connected")]
    DeliveryFailed(ConnectionId),

    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    /// Camera, microphone or screen capture could not be obtained.
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("another negotiation operation is already pending on this connection")]
    OperationPending,

    #[error("no local offer is outstanding")]
    NoOutstandingOffer,

    #[error("cannot {operation} while in {state}")]
    WrongState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("session description rejected: {0}")]
    Rejected(String),

    #[error("no answer received within {0:?}")]
    Timeout(Duration),

    #[error("session is closed")]
    Closed,
}
