use crate::adapter::{AdapterEvent, BackendFactory, PeerConnectionBackend};
use crate::media::{MediaTrack, TrackKind, TrackSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::IceServerConfig;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

pub type WebRtcTrack = Arc<dyn TrackLocal + Send + Sync>;

/// [`PeerConnectionBackend`] over the `webrtc` crate.
pub struct WebRtcBackend {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcBackend {
    pub async fn new(
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::UnboundedSender<AdapterEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(config)
                .await
                .context("Failed to create peer connection")?,
        );
        watch_peer_connection(&peer_connection, events);

        Ok(Self { peer_connection })
    }

    pub fn peer_connection(&self) -> Arc<RTCPeerConnection> {
        Arc::clone(&self.peer_connection)
    }
}

fn watch_peer_connection(
    peer_connection: &RTCPeerConnection,
    events: mpsc::UnboundedSender<AdapterEvent>,
) {
    peer_connection.on_peer_connection_state_change(Box::new(
        move |state: RTCPeerConnectionState| {
            Box::pin(async move {
                info!("Peer connection state: {:?}", state);
            })
        },
    ));

    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let tx = events.clone();

        Box::pin(async move {
            let Some(candidate) = c else { return };
            let Ok(init) = candidate.to_json() else {
                return;
            };
            let Ok(encoded) = serde_json::to_string(&init) else {
                return;
            };
            let _ = tx.send(AdapterEvent::LocalCandidate(encoded));
        })
    }));
}

#[async_trait]
impl PeerConnectionBackend for WebRtcBackend {
    type Track = WebRtcTrack;
    type Sender = Arc<RTCRtpSender>;

    async fn create_offer(&self) -> Result<String> {
        let pc = &self.peer_connection;
        let offer = pc.create_offer(None).await?;
        pc.set_local_description(offer.clone()).await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let pc = &self.peer_connection;
        let answer = pc.create_answer(None).await?;
        pc.set_local_description(answer.clone()).await?;
        Ok(answer.sdp)
    }

    async fn set_remote_offer(&self, sdp: &str) -> Result<()> {
        let desc = RTCSessionDescription::offer(sdp.to_owned())?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn set_remote_answer(&self, sdp: &str) -> Result<()> {
        let desc = RTCSessionDescription::answer(sdp.to_owned())?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let pc = &self.peer_connection;
        let mut desc = RTCSessionDescription::default();
        desc.sdp_type = RTCSdpType::Rollback;

        match pc.signaling_state() {
            RTCSignalingState::HaveLocalOffer => pc.set_local_description(desc).await?,
            RTCSignalingState::HaveRemoteOffer => pc.set_remote_description(desc).await?,
            other => debug!("Nothing to roll back in {:?}", other),
        }
        Ok(())
    }

    async fn add_track(&self, track: &Self::Track) -> Result<Self::Sender> {
        let sender = self.peer_connection.add_track(Arc::clone(track)).await?;
        Ok(sender)
    }

    async fn remove_track(&self, sender: &Self::Sender) -> Result<()> {
        self.peer_connection.remove_track(sender).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &str) -> Result<()> {
        let init: RTCIceCandidateInit =
            serde_json::from_str(candidate).context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn sender_track_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for sender in self.peer_connection.get_senders().await {
            if let Some(track) = sender.track().await {
                ids.push(track.id().to_owned());
            }
        }
        ids
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Builds [`WebRtcBackend`]s with the ICE servers the relay announced.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcFactory;

#[async_trait]
impl BackendFactory for WebRtcFactory {
    type Backend = WebRtcBackend;

    async fn create(
        &self,
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::UnboundedSender<AdapterEvent>,
    ) -> Result<WebRtcBackend> {
        WebRtcBackend::new(ice_servers, events).await
    }
}

/// A writable RTP track (VP8 for video, Opus for audio) ready to attach.
pub fn rtp_track(
    id: impl Into<String>,
    kind: TrackKind,
    source: TrackSource,
) -> MediaTrack<WebRtcTrack> {
    let id = id.into();
    let mime_type = match kind {
        TrackKind::Audio => MIME_TYPE_OPUS,
        TrackKind::Video => MIME_TYPE_VP8,
    };
    let stream_id = match source {
        TrackSource::Screen => "tandem-screen",
        TrackSource::Camera | TrackSource::Microphone => "tandem-camera",
    };

    let track: WebRtcTrack = Arc::new(TrackLocalStaticRTP::new(
        RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            ..Default::default()
        },
        id.clone(),
        stream_id.to_owned(),
    ));

    MediaTrack::new(id, kind, source, track)
}
