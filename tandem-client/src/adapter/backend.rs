use crate::adapter::AdapterEvent;
use anyhow::Result;
use async_trait::async_trait;
use tandem_core::IceServerConfig;
use tokio::sync::mpsc;

/// The platform peer connection under a [`MediaConnectionAdapter`].
///
/// Implementations only translate calls; ordering, state checks and the
/// track book live in the adapter.
///
/// [`MediaConnectionAdapter`]: crate::MediaConnectionAdapter
#[async_trait]
pub trait PeerConnectionBackend: Send + Sync + 'static {
    type Track: Clone + Send + Sync + 'static;
    type Sender: Send + Sync + 'static;

    /// Creates an offer and sets it as the local description.
    async fn create_offer(&self) -> Result<String>;

    /// Creates an answer to the current remote offer and sets it locally.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_offer(&self, sdp: &str) -> Result<()>;

    async fn set_remote_answer(&self, sdp: &str) -> Result<()>;

    /// Discards a half-finished offer/answer exchange.
    async fn rollback(&self) -> Result<()>;

    async fn add_track(&self, track: &Self::Track) -> Result<Self::Sender>;

    async fn remove_track(&self, sender: &Self::Sender) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: &str) -> Result<()>;

    /// Ids of the tracks currently bound to a sender.
    async fn sender_track_ids(&self) -> Vec<String>;

    async fn close(&self) -> Result<()>;
}

/// Builds one backend per negotiation session.
#[async_trait]
pub trait BackendFactory: Send + Sync + 'static {
    type Backend: PeerConnectionBackend;

    async fn create(
        &self,
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::UnboundedSender<AdapterEvent>,
    ) -> Result<Self::Backend>;
}

/// Track handle type produced by a factory's backend.
pub type TrackOf<F> = <<F as BackendFactory>::Backend as PeerConnectionBackend>::Track;
