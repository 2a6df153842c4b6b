use crate::media::TrackId;
use std::fmt;
use tandem_core::NegotiationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationState {
    #[default]
    Idle,
    /// First offer sent, waiting for `call-accepted`.
    OfferSent,
    Stable,
    /// Mid-call offer sent, waiting for `peer-negotiation-final`.
    Renegotiating,
}

impl NegotiationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::OfferSent => "offer-sent",
            Self::Stable => "stable",
            Self::Renegotiating => "renegotiating",
        }
    }

    /// A local offer is waiting for its answer.
    pub fn is_offering(&self) -> bool {
        matches!(self, Self::OfferSent | Self::Renegotiating)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session looks like from outside.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub state: NegotiationState,
    /// Tracks attached to the adapter, sorted.
    pub tracks: Vec<TrackId>,
    pub last_error: Option<NegotiationError>,
}
