use crate::adapter::{BackendFactory, TrackOf};
use crate::config::ClientConfig;
use crate::engine::ClientEvent;
use crate::media::{MediaProvider, MediaTrack, TrackId};
use crate::session::{NegotiationSession, SessionCommand, SessionContext, SessionHandle};
use crate::signaling::SignalingOutput;
use anyhow::Context;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::{Arc, OnceLock};
use tandem_core::{
    ClientMessage, ConnectionId, Error, IceServerConfig, NegotiationError, Result, ServerMessage,
};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

struct EngineInner<F: BackendFactory> {
    factory: F,
    signaling: Arc<dyn SignalingOutput>,
    media: Arc<dyn MediaProvider<TrackOf<F>>>,
    config: ClientConfig,
    local_id: OnceLock<ConnectionId>,
    ice_servers: OnceLock<Vec<IceServerConfig>>,
    sessions: DashMap<ConnectionId, SessionHandle<TrackOf<F>>>,
    camera: Mutex<Option<Vec<MediaTrack<TrackOf<F>>>>>,
    screen: Mutex<Option<MediaTrack<TrackOf<F>>>>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

/// Client side of a room: routes relay frames to per-peer sessions and
/// turns local intents (join, call, share screen) into signaling.
///
/// Every remote peer gets its own [`NegotiationSession`], so calls to several
/// members of a room run independently of each other.
pub struct CallEngine<F: BackendFactory> {
    inner: Arc<EngineInner<F>>,
}

impl<F: BackendFactory> Clone for CallEngine<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: BackendFactory> CallEngine<F> {
    pub fn new(
        factory: F,
        signaling: Arc<dyn SignalingOutput>,
        media: Arc<dyn MediaProvider<TrackOf<F>>>,
        config: ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let engine = Self {
            inner: Arc::new(EngineInner {
                factory,
                signaling,
                media,
                config,
                local_id: OnceLock::new(),
                ice_servers: OnceLock::new(),
                sessions: DashMap::new(),
                camera: Mutex::new(None),
                screen: Mutex::new(None),
                events,
            }),
        };
        (engine, events_rx)
    }

    /// Our connection id, known once the relay's `welcome` arrived.
    pub fn local_id(&self) -> Option<ConnectionId> {
        self.inner.local_id.get().copied()
    }

    pub fn session(&self, remote: &ConnectionId) -> Option<SessionHandle<TrackOf<F>>> {
        self.inner.sessions.get(remote).map(|s| s.value().clone())
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    pub async fn join_room(&self, room_id: &str, identity: &str) -> anyhow::Result<()> {
        self.signal(ClientMessage::JoinRoom {
            identity: identity.to_owned(),
            room_id: room_id.to_owned(),
        })
        .await
    }

    /// Leaves the room and tears down every session.
    pub async fn leave_room(&self) -> anyhow::Result<()> {
        self.close_sessions();
        self.signal(ClientMessage::LeaveRoom).await
    }

    /// Starts a call with camera media. Capture failures come back to the caller.
    pub async fn call(&self, remote: ConnectionId) -> Result<SessionHandle<TrackOf<F>>> {
        let tracks = self.outgoing_tracks().await?;
        let session = self.get_or_open(remote).await?;
        session.attach_tracks(tracks)?;
        session.call()?;
        Ok(session)
    }

    /// Sends the screen to every session. Returns the screen track id.
    pub async fn start_screen_share(&self) -> Result<TrackId> {
        let mut screen = self.inner.screen.lock().await;
        if let Some(track) = screen.as_ref() {
            return Ok(track.id.clone());
        }

        let track = self.inner.media.screen().await?;
        let id = track.id.clone();
        for session in self.sessions() {
            if let Err(e) = session.attach_tracks(vec![track.clone()]) {
                debug!("Session {} is gone: {}", session.remote().short(), e);
            }
        }
        *screen = Some(track);

        info!("Screen share {} started", id);
        Ok(id)
    }

    /// Stops sharing. Only the screen track is removed; camera video stays.
    pub async fn stop_screen_share(&self) -> bool {
        let Some(track) = self.inner.screen.lock().await.take() else {
            return false;
        };

        for session in self.sessions() {
            if let Err(e) = session.detach_track(track.id.clone()) {
                debug!("Session {} is gone: {}", session.remote().short(), e);
            }
        }

        info!("Screen share {} stopped", track.id);
        true
    }

    /// Drives the engine from the relay's inbound frames until the stream ends.
    pub async fn pump(&self, mut inbound: mpsc::UnboundedReceiver<ServerMessage>) {
        while let Some(msg) = inbound.recv().await {
            self.handle(msg).await;
        }
        info!("Relay stream ended, closing sessions");
        self.close_sessions();
    }

    pub async fn handle(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome {
                connection_id,
                ice_servers,
            } => {
                if self.inner.local_id.set(connection_id).is_err() {
                    warn!("Second welcome ignored");
                    return;
                }
                let _ = self.inner.ice_servers.set(ice_servers);
                info!("Relay assigned id {}", connection_id.short());
                self.emit(ClientEvent::Welcome { connection_id });
            }
            ServerMessage::JoinRoom { identity, room_id } => {
                info!("Joined room '{}' as '{}'", room_id, identity);
                self.emit(ClientEvent::Joined { identity, room_id });
            }
            ServerMessage::UserJoined {
                identity,
                connection_id,
            } => self.emit(ClientEvent::PeerJoined {
                identity,
                connection_id,
            }),
            ServerMessage::UserLeft {
                identity,
                connection_id,
            } => {
                if let Some((_, session)) = self.inner.sessions.remove(&connection_id) {
                    self.deliver(&session, SessionCommand::RemoteLost);
                }
                self.emit(ClientEvent::PeerLeft {
                    identity,
                    connection_id,
                });
            }
            ServerMessage::IncomingCall { offer, from } => self.on_incoming_call(offer, from).await,
            ServerMessage::PeerNegotiationNeeded { offer, from } => {
                match self.get_or_open(from).await {
                    Ok(session) => self.deliver(
                        &session,
                        SessionCommand::RemoteOffer {
                            sdp: offer,
                            renegotiation: true,
                        },
                    ),
                    Err(e) => warn!("No session for {}: {}", from.short(), e),
                }
            }
            ServerMessage::CallAccepted { answer, from }
            | ServerMessage::PeerNegotiationFinal { answer, from } => {
                self.deliver_existing(from, SessionCommand::RemoteAnswer { sdp: answer });
            }
            ServerMessage::IceCandidate { candidate, from } => {
                self.deliver_existing(from, SessionCommand::RemoteCandidate(candidate));
            }
            ServerMessage::Error { code, message } => {
                warn!("Relay refused a frame: {}", message);
                self.emit(ClientEvent::RelayError { code, message });
            }
        }
    }

    async fn on_incoming_call(&self, offer: String, from: ConnectionId) {
        let session = match self.get_or_open(from).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Cannot answer {}: {}", from.short(), e);
                return;
            }
        };

        self.deliver(
            &session,
            SessionCommand::RemoteOffer {
                sdp: offer,
                renegotiation: false,
            },
        );
        self.emit(ClientEvent::IncomingCall { from });

        // Our media follows the answer and goes out as a renegotiation.
        match self.outgoing_tracks().await {
            Ok(tracks) => self.deliver(&session, SessionCommand::AttachTracks(tracks)),
            Err(error) => {
                warn!("Answering {} without local media: {}", from.short(), error);
                self.emit(ClientEvent::MediaFailed { error });
            }
        }
    }

    /// Camera tracks, plus the screen while it is shared.
    async fn outgoing_tracks(&self) -> Result<Vec<MediaTrack<TrackOf<F>>>> {
        let mut tracks = {
            let mut camera = self.inner.camera.lock().await;
            match camera.as_ref() {
                Some(tracks) => tracks.clone(),
                None => {
                    let tracks = self.inner.media.camera().await?;
                    *camera = Some(tracks.clone());
                    tracks
                }
            }
        };

        if let Some(screen) = self.inner.screen.lock().await.as_ref() {
            tracks.push(screen.clone());
        }
        Ok(tracks)
    }

    async fn get_or_open(&self, remote: ConnectionId) -> Result<SessionHandle<TrackOf<F>>> {
        if let Some(session) = self.session(&remote).filter(|s| !s.is_closed()) {
            return Ok(session);
        }

        let local = self.local_id().ok_or_else(|| {
            Error::InvalidArgument("no connection id yet, wait for the relay's welcome".into())
        })?;
        if local == remote {
            return Err(Error::InvalidArgument("cannot call our own connection".into()));
        }

        let ctx = SessionContext {
            local,
            remote,
            signaling: Arc::clone(&self.inner.signaling),
            events: self.inner.events.clone(),
            offer_timeout: self.inner.config.offer_timeout,
        };
        let ice_servers = self
            .inner
            .ice_servers
            .get()
            .cloned()
            .unwrap_or_else(|| self.inner.config.ice_servers.clone());

        let session = NegotiationSession::open(&self.inner.factory, ice_servers, ctx)
            .await
            .map_err(|e| NegotiationError::Rejected(format!("{e:#}")))?;

        let session = match self.inner.sessions.entry(remote) {
            Entry::Occupied(mut entry) if entry.get().is_closed() => {
                entry.insert(session.clone());
                session
            }
            Entry::Occupied(entry) => {
                session.close();
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
                session
            }
        };
        Ok(session)
    }

    fn deliver(&self, session: &SessionHandle<TrackOf<F>>, command: SessionCommand<TrackOf<F>>) {
        if let Err(e) = session.send(command) {
            warn!("Session {} is gone: {}", session.remote().short(), e);
        }
    }

    fn deliver_existing(&self, remote: ConnectionId, command: SessionCommand<TrackOf<F>>) {
        match self.session(&remote) {
            Some(session) => self.deliver(&session, command),
            None => debug!("No session with {}, frame dropped", remote.short()),
        }
    }

    fn sessions(&self) -> Vec<SessionHandle<TrackOf<F>>> {
        self.inner
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn close_sessions(&self) {
        for session in self.sessions() {
            session.close();
        }
        self.inner.sessions.clear();
    }

    async fn signal(&self, msg: ClientMessage) -> anyhow::Result<()> {
        let kind = msg.kind();
        self.inner
            .signaling
            .send_signal(msg)
            .await
            .with_context(|| format!("Failed to send {kind}"))
    }

    fn emit(&self, event: ClientEvent) {
        if self.inner.events.send(event).is_err() {
            debug!("No listener for client events");
        }
    }
}
