use crate::adapter::{AdapterEvent, BackendFactory, MediaConnectionAdapter, PeerConnectionBackend};
use crate::engine::ClientEvent;
use crate::media::{MediaTrack, TrackId};
use crate::session::{NegotiationState, SessionCommand, SessionHandle, SessionSnapshot};
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use std::time::Duration;
use tandem_core::{ClientMessage, ConnectionId, IceServerConfig, NegotiationError};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Who a session talks to and through what.
#[derive(Clone)]
pub struct SessionContext {
    pub local: ConnectionId,
    pub remote: ConnectionId,
    pub signaling: Arc<dyn SignalingOutput>,
    pub events: mpsc::UnboundedSender<ClientEvent>,
    pub offer_timeout: Duration,
}

impl SessionContext {
    /// The side with the smaller connection id yields when offers collide.
    pub fn is_polite(&self) -> bool {
        self.local < self.remote
    }
}

/// Offer/answer state machine for one remote peer.
///
/// Runs as its own task. Commands and adapter events are handled one at a
/// time, so adapter operations for a pair never overlap. While a local offer
/// is in flight, new tracks are queued and renegotiation requests are held
/// until the session is `Stable` again.
pub struct NegotiationSession<B: PeerConnectionBackend> {
    ctx: SessionContext,
    adapter: MediaConnectionAdapter<B>,
    adapter_events: mpsc::UnboundedReceiver<AdapterEvent>,
    commands: mpsc::UnboundedReceiver<SessionCommand<B::Track>>,
    snapshot: watch::Sender<SessionSnapshot>,
    state: NegotiationState,
    queued: Vec<MediaTrack<B::Track>>,
    renegotiate_when_stable: bool,
    deadline: Option<Instant>,
    last_error: Option<NegotiationError>,
}

impl<B: PeerConnectionBackend> NegotiationSession<B> {
    /// Builds a backend from `factory` and starts the session task.
    pub async fn open<F>(
        factory: &F,
        ice_servers: Vec<IceServerConfig>,
        ctx: SessionContext,
    ) -> anyhow::Result<SessionHandle<B::Track>>
    where
        F: BackendFactory<Backend = B>,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let backend = factory.create(ice_servers, event_tx.clone()).await?;
        let adapter = MediaConnectionAdapter::new(backend, event_tx);
        Ok(Self::spawn(ctx, adapter, event_rx))
    }

    pub fn spawn(
        ctx: SessionContext,
        adapter: MediaConnectionAdapter<B>,
        adapter_events: mpsc::UnboundedReceiver<AdapterEvent>,
    ) -> SessionHandle<B::Track> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let handle = SessionHandle::new(ctx.remote, cmd_tx, snapshot_rx);

        let session = Self {
            ctx,
            adapter,
            adapter_events,
            commands: cmd_rx,
            snapshot: snapshot_tx,
            state: NegotiationState::Idle,
            queued: Vec::new(),
            renegotiate_when_stable: false,
            deadline: None,
            last_error: None,
        };
        tokio::spawn(session.run());

        handle
    }

    async fn run(mut self) {
        debug!("Session with {} started", self.ctx.remote.short());

        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;

                cmd = self.commands.recv() => match cmd {
                    Some(SessionCommand::Close) | None => break,
                    Some(SessionCommand::RemoteLost) => return self.on_remote_lost().await,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(event) = self.adapter_events.recv() => self.handle_adapter_event(event).await,
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deadline = None;
                    let error = NegotiationError::Timeout(self.ctx.offer_timeout);
                    self.fail(error).await;
                }
            }

            self.publish().await;
        }

        if let Err(e) = self.adapter.close().await {
            debug!("Closing connection to {}: {}", self.ctx.remote.short(), e);
        }
        info!("Session with {} closed", self.ctx.remote.short());
    }

    async fn handle_command(&mut self, cmd: SessionCommand<B::Track>) {
        match cmd {
            SessionCommand::Call => self.call().await,
            SessionCommand::RemoteOffer { sdp, renegotiation } => {
                self.on_remote_offer(sdp, renegotiation).await
            }
            SessionCommand::RemoteAnswer { sdp } => self.on_remote_answer(sdp).await,
            SessionCommand::RemoteCandidate(candidate) => {
                if let Err(e) = self.adapter.add_ice_candidate(candidate).await {
                    warn!("Remote candidate from {} rejected: {}", self.ctx.remote.short(), e);
                }
            }
            SessionCommand::AttachTracks(tracks) => self.attach_tracks(tracks).await,
            SessionCommand::DetachTrack(id) => self.detach_track(&id).await,
            SessionCommand::RemoteLost | SessionCommand::Close => {}
        }
    }

    async fn handle_adapter_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::LocalCandidate(candidate) => {
                self.send(ClientMessage::IceCandidate {
                    candidate,
                    to: self.ctx.remote,
                })
                .await;
            }
            AdapterEvent::NegotiationNeeded => match self.state {
                NegotiationState::Idle | NegotiationState::Stable => {
                    if self.adapter.needs_negotiation().await {
                        self.send_offer().await;
                    }
                }
                NegotiationState::OfferSent | NegotiationState::Renegotiating => {
                    self.renegotiate_when_stable = true;
                }
            },
        }
    }

    async fn call(&mut self) {
        match self.state {
            NegotiationState::Idle => self.send_offer().await,
            NegotiationState::Stable => {
                if self.adapter.needs_negotiation().await {
                    self.send_offer().await;
                }
            }
            state => debug!(
                "Call to {} ignored, already {}",
                self.ctx.remote.short(),
                state
            ),
        }
    }

    async fn send_offer(&mut self) {
        let renegotiation = self.state == NegotiationState::Stable;

        let offer = match self.adapter.create_offer().await {
            Ok(offer) => offer,
            Err(e) => return self.fail(e).await,
        };

        let to = self.ctx.remote;
        let msg = if renegotiation {
            ClientMessage::PeerNegotiationNeeded { offer, to }
        } else {
            ClientMessage::UserCall { offer, to }
        };
        self.send(msg).await;

        self.deadline = Some(Instant::now() + self.ctx.offer_timeout);
        self.set_state(if renegotiation {
            NegotiationState::Renegotiating
        } else {
            NegotiationState::OfferSent
        });
    }

    async fn on_remote_offer(&mut self, sdp: String, renegotiation: bool) {
        if self.state.is_offering() {
            if !self.ctx.is_polite() {
                info!(
                    "Offer collision with {}, keeping ours",
                    self.ctx.remote.short()
                );
                return;
            }

            info!(
                "Offer collision with {}, yielding",
                self.ctx.remote.short()
            );
            if let Err(e) = self.adapter.rollback().await {
                return self.fail(e).await;
            }
            self.deadline = None;
            self.renegotiate_when_stable = true;
        }

        let answer = match self.adapter.create_answer(&sdp).await {
            Ok(answer) => answer,
            Err(e) => return self.fail(e).await,
        };

        let to = self.ctx.remote;
        let msg = if renegotiation {
            ClientMessage::PeerNegotiationDone { answer, to }
        } else {
            ClientMessage::CallAccepted { answer, to }
        };
        self.send(msg).await;

        self.on_stable().await;
    }

    async fn on_remote_answer(&mut self, sdp: String) {
        if !self.state.is_offering() {
            warn!(
                "Stale answer from {} ignored in {}",
                self.ctx.remote.short(),
                self.state
            );
            return self.report(NegotiationError::NoOutstandingOffer);
        }

        if let Err(e) = self.adapter.apply_answer(&sdp).await {
            return self.fail(e).await;
        }
        self.deadline = None;
        self.on_stable().await;
    }

    async fn on_stable(&mut self) {
        self.last_error = None;
        self.set_state(NegotiationState::Stable);

        let queued = std::mem::take(&mut self.queued);
        self.attach_now(queued).await;

        if std::mem::take(&mut self.renegotiate_when_stable) && self.adapter.needs_negotiation().await
        {
            self.send_offer().await;
        }
    }

    async fn attach_tracks(&mut self, tracks: Vec<MediaTrack<B::Track>>) {
        if !self.state.is_offering() {
            return self.attach_now(tracks).await;
        }

        for track in tracks {
            if !self.queued.iter().any(|queued| queued.id == track.id) {
                debug!("Queued track {} until {} answers", track.id, self.ctx.remote.short());
                self.queued.push(track);
            }
        }
    }

    async fn attach_now(&mut self, tracks: Vec<MediaTrack<B::Track>>) {
        for track in tracks {
            if let Err(e) = self.adapter.attach_track(&track).await {
                warn!("Failed to attach track {}: {}", track.id, e);
                self.report(e);
            }
        }
    }

    async fn detach_track(&mut self, id: &TrackId) {
        self.queued.retain(|queued| &queued.id != id);
        if let Err(e) = self.adapter.detach_track(id).await {
            warn!("Failed to detach track {}: {}", id, e);
            self.report(e);
        }
    }

    /// Forced reset: back to `Idle` with no tracks, then the session ends.
    async fn on_remote_lost(mut self) {
        info!("Peer {} is gone, releasing session", self.ctx.remote.short());
        if let Err(e) = self.adapter.release().await {
            warn!("Releasing connection to {} failed: {}", self.ctx.remote.short(), e);
        }
        self.queued.clear();
        self.set_state(NegotiationState::Idle);
        self.publish().await;
    }

    /// Drops back to `Idle`, keeping the attached tracks for the next attempt.
    async fn fail(&mut self, error: NegotiationError) {
        warn!(
            "Negotiation with {} failed in {}: {}",
            self.ctx.remote.short(),
            self.state,
            error
        );

        if let Err(e) = self.adapter.rollback().await {
            debug!("Rollback after failure: {}", e);
        }
        self.deadline = None;
        self.renegotiate_when_stable = false;

        let queued = std::mem::take(&mut self.queued);
        self.attach_now(queued).await;

        self.set_state(NegotiationState::Idle);
        self.report(error);
    }

    fn report(&mut self, error: NegotiationError) {
        self.last_error = Some(error.clone());
        let _ = self.ctx.events.send(ClientEvent::NegotiationFailed {
            remote: self.ctx.remote,
            error,
        });
    }

    fn set_state(&mut self, state: NegotiationState) {
        if self.state == state {
            return;
        }
        info!(
            "Session {} -> {}: {} => {}",
            self.ctx.local.short(),
            self.ctx.remote.short(),
            self.state,
            state
        );
        self.state = state;
        let _ = self.ctx.events.send(ClientEvent::SessionState {
            remote: self.ctx.remote,
            state,
        });
    }

    async fn send(&self, msg: ClientMessage) {
        let kind = msg.kind();
        if let Err(e) = self.ctx.signaling.send_signal(msg).await {
            warn!("Failed to send {} to {}: {:#}", kind, self.ctx.remote.short(), e);
        }
    }

    async fn publish(&self) {
        let snapshot = SessionSnapshot {
            state: self.state,
            tracks: self.adapter.track_ids().await,
            last_error: self.last_error.clone(),
        };
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
