use crate::media::{MediaTrack, TrackId};
use crate::session::{NegotiationState, SessionCommand, SessionSnapshot};
use std::fmt;
use std::time::Duration;
use tandem_core::{ConnectionId, NegotiationError};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

/// Cheap handle to a running negotiation session.
pub struct SessionHandle<T> {
    remote: ConnectionId,
    commands: mpsc::UnboundedSender<SessionCommand<T>>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl<T> Clone for SessionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote,
            commands: self.commands.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}

impl<T> fmt::Debug for SessionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("remote", &self.remote)
            .field("state", &self.state())
            .finish()
    }
}

impl<T> SessionHandle<T> {
    pub(crate) fn new(
        remote: ConnectionId,
        commands: mpsc::UnboundedSender<SessionCommand<T>>,
        snapshot: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            remote,
            commands,
            snapshot,
        }
    }

    pub fn remote(&self) -> ConnectionId {
        self.remote
    }

    pub fn state(&self) -> NegotiationState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub fn send(&self, command: SessionCommand<T>) -> Result<(), NegotiationError> {
        self.commands
            .send(command)
            .map_err(|_| NegotiationError::Closed)
    }

    pub fn call(&self) -> Result<(), NegotiationError> {
        self.send(SessionCommand::Call)
    }

    pub fn attach_tracks(&self, tracks: Vec<MediaTrack<T>>) -> Result<(), NegotiationError> {
        self.send(SessionCommand::AttachTracks(tracks))
    }

    pub fn detach_track(&self, id: TrackId) -> Result<(), NegotiationError> {
        self.send(SessionCommand::DetachTrack(id))
    }

    pub fn close(&self) {
        let _ = self.send(SessionCommand::Close);
    }

    /// Waits until the snapshot satisfies `predicate`.
    pub async fn wait_until<F>(
        &self,
        within: Duration,
        mut predicate: F,
    ) -> Result<SessionSnapshot, NegotiationError>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshot.clone();
        match timeout(within, rx.wait_for(|s| predicate(s))).await {
            Ok(Ok(snapshot)) => Ok(snapshot.clone()),
            Ok(Err(_)) => Err(NegotiationError::Closed),
            Err(_) => Err(NegotiationError::Timeout(within)),
        }
    }

    pub async fn wait_for_state(
        &self,
        state: NegotiationState,
        within: Duration,
    ) -> Result<SessionSnapshot, NegotiationError> {
        self.wait_until(within, |s| s.state == state).await
    }
}
