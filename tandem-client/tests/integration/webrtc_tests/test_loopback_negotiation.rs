use tandem_client::{
    AdapterEvent, MediaConnectionAdapter, SignalingState, TrackId, TrackKind, TrackSource,
    WebRtcBackend, rtp_track,
};
use tokio::sync::mpsc;

use crate::integration::init_tracing;

async fn adapter() -> (
    MediaConnectionAdapter<WebRtcBackend>,
    mpsc::UnboundedReceiver<AdapterEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let backend = WebRtcBackend::new(Vec::new(), tx.clone()).await.unwrap();
    (MediaConnectionAdapter::new(backend, tx), rx)
}

#[tokio::test]
async fn test_loopback_offer_answer() {
    init_tracing();

    let (a, mut a_events) = adapter().await;
    let (b, _b_events) = adapter().await;

    let camera = rtp_track("cam", TrackKind::Video, TrackSource::Camera);
    assert!(a.attach_track(&camera).await.unwrap());
    assert_eq!(a_events.recv().await, Some(AdapterEvent::NegotiationNeeded));

    let offer = a.create_offer().await.unwrap();
    assert!(offer.contains("m=video"));
    assert_eq!(a.signaling_state().await, SignalingState::HaveLocalOffer);

    let answer = b.create_answer(&offer).await.unwrap();
    assert_eq!(b.signaling_state().await, SignalingState::Stable);

    a.apply_answer(&answer).await.unwrap();
    assert_eq!(a.signaling_state().await, SignalingState::Stable);
    assert!(!a.needs_negotiation().await);

    b.close().await.unwrap();
    a.close().await.unwrap();
}

#[tokio::test]
async fn test_screen_detach_keeps_camera() {
    init_tracing();

    let (a, _events) = adapter().await;

    let camera = rtp_track("cam", TrackKind::Video, TrackSource::Camera);
    let screen = rtp_track("screen", TrackKind::Video, TrackSource::Screen);
    a.attach_track(&camera).await.unwrap();
    a.attach_track(&screen).await.unwrap();

    let mut senders = a.sender_track_ids().await;
    senders.sort();
    assert_eq!(senders, vec!["cam".to_owned(), "screen".to_owned()]);

    assert!(a.detach_track(&TrackId::new("screen")).await.unwrap());

    assert_eq!(a.track_ids().await, vec![TrackId::new("cam")]);
    assert!(a.sender_track_ids().await.contains(&"cam".to_owned()));

    a.close().await.unwrap();
}
