use crate::media::{MediaTrack, TrackId};

/// Work items for a session actor, handled strictly in order.
#[derive(Debug)]
pub enum SessionCommand<T> {
    /// Local intent to call the remote peer.
    Call,
    RemoteOffer { sdp: String, renegotiation: bool },
    RemoteAnswer { sdp: String },
    RemoteCandidate(String),
    AttachTracks(Vec<MediaTrack<T>>),
    DetachTrack(TrackId),
    /// The remote connection is gone.
    RemoteLost,
    Close,
}
