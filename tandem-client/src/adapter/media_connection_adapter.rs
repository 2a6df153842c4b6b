use crate::adapter::{AdapterEvent, PeerConnectionBackend};
use crate::media::{MediaTrack, TrackId};
use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_core::NegotiationError;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// Offer/answer position of the underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
}

impl SignalingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::HaveLocalOffer => "have-local-offer",
            Self::HaveRemoteOffer => "have-remote-offer",
        }
    }
}

struct AdapterState<S> {
    signaling: SignalingState,
    senders: BTreeMap<TrackId, S>,
    /// Track set the remote side accepted in our last answered offer.
    negotiated: BTreeSet<TrackId>,
    /// Track set carried by the outstanding local offer.
    offered: BTreeSet<TrackId>,
    has_remote_description: bool,
    pending_candidates: Vec<String>,
}

impl<S> AdapterState<S> {
    fn new() -> Self {
        Self {
            signaling: SignalingState::Stable,
            senders: BTreeMap::new(),
            negotiated: BTreeSet::new(),
            offered: BTreeSet::new(),
            has_remote_description: false,
            pending_candidates: Vec::new(),
        }
    }

    fn track_set(&self) -> BTreeSet<TrackId> {
        self.senders.keys().cloned().collect()
    }
}

struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One media connection to one remote peer.
///
/// Offer, answer, apply and rollback are mutually exclusive: a second call
/// while one is in flight fails with [`NegotiationError::OperationPending`].
/// Attaching or detaching a track that changes the set emits
/// [`AdapterEvent::NegotiationNeeded`].
pub struct MediaConnectionAdapter<B: PeerConnectionBackend> {
    backend: B,
    events: mpsc::UnboundedSender<AdapterEvent>,
    pending: AtomicBool,
    state: Mutex<AdapterState<B::Sender>>,
}

impl<B: PeerConnectionBackend> MediaConnectionAdapter<B> {
    pub fn new(backend: B, events: mpsc::UnboundedSender<AdapterEvent>) -> Self {
        Self {
            backend,
            events,
            pending: AtomicBool::new(false),
            state: Mutex::new(AdapterState::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn signaling_state(&self) -> SignalingState {
        self.state.lock().await.signaling
    }

    /// Attached track ids, sorted.
    pub async fn track_ids(&self) -> Vec<TrackId> {
        self.state.lock().await.senders.keys().cloned().collect()
    }

    pub async fn sender_track_ids(&self) -> Vec<String> {
        self.backend.sender_track_ids().await
    }

    /// `true` when the attached tracks differ from what the remote side last agreed to.
    pub async fn needs_negotiation(&self) -> bool {
        let state = self.state.lock().await;
        state.track_set() != state.negotiated
    }

    pub async fn create_offer(&self) -> Result<String, NegotiationError> {
        let _guard = self.begin()?;
        self.expect_state("create an offer", SignalingState::Stable)
            .await?;

        let sdp = self.backend.create_offer().await.map_err(rejected)?;

        let mut state = self.state.lock().await;
        state.signaling = SignalingState::HaveLocalOffer;
        state.offered = state.track_set();
        Ok(sdp)
    }

    pub async fn create_answer(&self, remote_offer: &str) -> Result<String, NegotiationError> {
        let _guard = self.begin()?;
        let current = self.signaling_state().await;
        if current == SignalingState::HaveLocalOffer {
            return Err(NegotiationError::WrongState {
                operation: "answer an offer",
                state: current.as_str(),
            });
        }

        self.backend
            .set_remote_offer(remote_offer)
            .await
            .map_err(rejected)?;
        {
            let mut state = self.state.lock().await;
            state.signaling = SignalingState::HaveRemoteOffer;
            state.has_remote_description = true;
        }
        self.flush_candidates().await;

        let answer = match self.backend.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                self.rollback_backend().await;
                return Err(rejected(e));
            }
        };

        // An answer never carries our own track changes; those need an offer.
        self.state.lock().await.signaling = SignalingState::Stable;
        Ok(answer)
    }

    pub async fn apply_answer(&self, remote_answer: &str) -> Result<(), NegotiationError> {
        let _guard = self.begin()?;
        if self.signaling_state().await != SignalingState::HaveLocalOffer {
            return Err(NegotiationError::NoOutstandingOffer);
        }

        self.backend
            .set_remote_answer(remote_answer)
            .await
            .map_err(rejected)?;

        {
            let mut state = self.state.lock().await;
            state.signaling = SignalingState::Stable;
            state.has_remote_description = true;
            let offered = mem::take(&mut state.offered);
            state.negotiated = offered;
        }
        self.flush_candidates().await;
        Ok(())
    }

    /// Abandons an outstanding offer, ours or theirs. No-op when already stable.
    pub async fn rollback(&self) -> Result<(), NegotiationError> {
        let _guard = self.begin()?;
        if self.signaling_state().await == SignalingState::Stable {
            return Ok(());
        }
        self.backend.rollback().await.map_err(rejected)?;
        self.mark_stable().await;
        Ok(())
    }

    /// Applies a remote candidate, holding it back until a remote description exists.
    pub async fn add_ice_candidate(&self, candidate: String) -> Result<(), NegotiationError> {
        {
            let mut state = self.state.lock().await;
            if !state.has_remote_description {
                state.pending_candidates.push(candidate);
                return Ok(());
            }
        }
        self.backend
            .add_ice_candidate(&candidate)
            .await
            .map_err(rejected)
    }

    /// Returns `false` if a track with the same id is already attached.
    pub async fn attach_track(&self, track: &MediaTrack<B::Track>) -> Result<bool, NegotiationError> {
        if self.state.lock().await.senders.contains_key(&track.id) {
            return Ok(false);
        }

        let sender = self.backend.add_track(&track.inner).await.map_err(rejected)?;
        {
            let mut state = self.state.lock().await;
            if state.senders.contains_key(&track.id) {
                drop(state);
                self.backend.remove_track(&sender).await.map_err(rejected)?;
                return Ok(false);
            }
            state.senders.insert(track.id.clone(), sender);
        }

        debug!("Attached {:?} track {}", track.source, track.id);
        self.notify_negotiation_needed();
        Ok(true)
    }

    /// Detaches exactly the track with `id`. Returns `false` if it was not attached.
    pub async fn detach_track(&self, id: &TrackId) -> Result<bool, NegotiationError> {
        let Some(sender) = self.state.lock().await.senders.remove(id) else {
            return Ok(false);
        };

        if let Err(e) = self.backend.remove_track(&sender).await {
            self.state.lock().await.senders.insert(id.clone(), sender);
            return Err(rejected(e));
        }

        debug!("Detached track {}", id);
        self.notify_negotiation_needed();
        Ok(true)
    }

    /// Closes the platform connection and forgets every track. Used when the
    /// remote peer is gone for good.
    pub async fn release(&self) -> Result<(), NegotiationError> {
        *self.state.lock().await = AdapterState::new();
        self.backend.close().await.map_err(rejected)
    }

    pub async fn close(&self) -> Result<(), NegotiationError> {
        self.backend.close().await.map_err(rejected)
    }

    fn begin(&self) -> Result<PendingGuard<'_>, NegotiationError> {
        if self.pending.swap(true, Ordering::AcqRel) {
            return Err(NegotiationError::OperationPending);
        }
        Ok(PendingGuard(&self.pending))
    }

    async fn expect_state(
        &self,
        operation: &'static str,
        expected: SignalingState,
    ) -> Result<(), NegotiationError> {
        let current = self.signaling_state().await;
        if current != expected {
            return Err(NegotiationError::WrongState {
                operation,
                state: current.as_str(),
            });
        }
        Ok(())
    }

    async fn rollback_backend(&self) {
        if let Err(e) = self.backend.rollback().await {
            warn!("Rollback failed: {:#}", e);
        }
        self.mark_stable().await;
    }

    async fn mark_stable(&self) {
        let mut state = self.state.lock().await;
        state.signaling = SignalingState::Stable;
        state.offered.clear();
    }

    async fn flush_candidates(&self) {
        let pending = mem::take(&mut self.state.lock().await.pending_candidates);
        for candidate in pending {
            if let Err(e) = self.backend.add_ice_candidate(&candidate).await {
                warn!("Dropped buffered ICE candidate: {:#}", e);
            }
        }
    }

    fn notify_negotiation_needed(&self) {
        if self.events.send(AdapterEvent::NegotiationNeeded).is_err() {
            debug!("Negotiation-needed dropped, session is gone");
        }
    }
}

fn rejected(e: anyhow::Error) -> NegotiationError {
    NegotiationError::Rejected(format!("{e:#}"))
}
