use tandem_client::{AdapterEvent, MediaConnectionAdapter, TrackId, TrackKind, TrackSource};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{MockBackend, track};

#[tokio::test]
async fn test_attach_is_idempotent() {
    init_tracing();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let adapter = MediaConnectionAdapter::new(MockBackend::new("a", tx.clone()), tx);
    let camera = track("cam", TrackKind::Video, TrackSource::Camera);

    assert!(adapter.attach_track(&camera).await.unwrap());
    assert!(!adapter.attach_track(&camera).await.unwrap());

    assert_eq!(adapter.sender_track_ids().await, vec!["cam"]);
    assert_eq!(rx.try_recv(), Ok(AdapterEvent::NegotiationNeeded));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_detach_matches_id_not_kind() {
    init_tracing();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let adapter = MediaConnectionAdapter::new(MockBackend::new("a", tx.clone()), tx);
    let camera = track("cam", TrackKind::Video, TrackSource::Camera);
    let screen = track("screen", TrackKind::Video, TrackSource::Screen);

    adapter.attach_track(&camera).await.unwrap();
    adapter.attach_track(&screen).await.unwrap();
    assert!(adapter.needs_negotiation().await);

    assert!(adapter.detach_track(&TrackId::new("screen")).await.unwrap());
    assert!(!adapter.detach_track(&TrackId::new("screen")).await.unwrap());

    assert_eq!(adapter.sender_track_ids().await, vec!["cam"]);
    assert_eq!(adapter.track_ids().await, vec![TrackId::new("cam")]);

    let mut notifications = 0;
    while rx.try_recv().is_ok() {
        notifications += 1;
    }
    assert_eq!(notifications, 3);
}

#[tokio::test]
async fn test_needs_negotiation_follows_answered_offer() {
    init_tracing();

    let (tx, _rx) = mpsc::unbounded_channel();
    let a = MediaConnectionAdapter::new(MockBackend::new("a", tx.clone()), tx.clone());
    let b = MediaConnectionAdapter::new(MockBackend::new("b", tx.clone()), tx);

    a.attach_track(&track("cam", TrackKind::Video, TrackSource::Camera))
        .await
        .unwrap();
    assert!(a.needs_negotiation().await);

    let offer = a.create_offer().await.unwrap();
    let answer = b.create_answer(&offer).await.unwrap();
    a.apply_answer(&answer).await.unwrap();
    assert!(!a.needs_negotiation().await);

    a.detach_track(&TrackId::new("cam")).await.unwrap();
    assert!(a.needs_negotiation().await);
}

#[tokio::test]
async fn test_release_forgets_tracks() {
    init_tracing();

    let (tx, _rx) = mpsc::unbounded_channel();
    let backend = MockBackend::new("a", tx.clone());
    let adapter = MediaConnectionAdapter::new(backend.clone(), tx);
    adapter
        .attach_track(&track("cam", TrackKind::Video, TrackSource::Camera))
        .await
        .unwrap();
    adapter.create_offer().await.unwrap();

    adapter.release().await.unwrap();

    assert!(adapter.track_ids().await.is_empty());
    assert!(adapter.sender_track_ids().await.is_empty());
    assert!(!adapter.needs_negotiation().await);
    assert_eq!(backend.closes(), 1);
}
