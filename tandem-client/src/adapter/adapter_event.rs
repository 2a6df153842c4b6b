/// Notifications an adapter pushes to the session that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// The attached track set changed and the remote side has not seen it yet.
    NegotiationNeeded,
    /// A trickle ICE candidate gathered locally, serialized for the relay.
    LocalCandidate(String),
}
