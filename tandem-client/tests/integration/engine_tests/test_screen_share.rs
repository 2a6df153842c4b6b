use tandem_client::{ClientEvent, NegotiationState, PeerConnectionBackend, TrackId};

use super::{SETTLE, establish_call};
use crate::integration::init_tracing;
use crate::utils::{MockMedia, TestPeer, create_test_relay};

fn renegotiating(event: &ClientEvent) -> bool {
    matches!(
        event,
        ClientEvent::SessionState {
            state: NegotiationState::Renegotiating,
            ..
        }
    )
}

#[tokio::test]
async fn test_screen_share() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestPeer::connect(&relay, MockMedia::new("a")).await.unwrap();
    let mut b = TestPeer::connect(&relay, MockMedia::new("b")).await.unwrap();
    a.join("lobby1", "a").await.unwrap();
    b.join("lobby1", "b").await.unwrap();
    establish_call(&a, &b).await.unwrap();

    let screen = a.engine.start_screen_share().await.unwrap();
    assert_eq!(screen, TrackId::new("a-screen"));
    assert_eq!(a.engine.start_screen_share().await.unwrap(), screen);

    a.wait_for_event(renegotiating).await.unwrap();
    let session = a.engine.session(&b.id).unwrap();
    let sharing = session
        .wait_until(SETTLE, |s| s.state == NegotiationState::Stable)
        .await
        .unwrap();
    assert!(sharing.tracks.contains(&screen));
    assert_eq!(sharing.tracks.len(), 3);

    assert!(a.engine.stop_screen_share().await);
    assert!(!a.engine.stop_screen_share().await);

    a.wait_for_event(renegotiating).await.unwrap();
    let stopped = session
        .wait_until(SETTLE, |s| s.state == NegotiationState::Stable)
        .await
        .unwrap();
    assert_eq!(
        stopped.tracks,
        vec![TrackId::new("a-camera-video"), TrackId::new("a-microphone")]
    );

    let backend = &a.factory.backends().await[0];
    assert_eq!(backend.offers_created(), 3);
    let senders = backend.sender_track_ids().await;
    assert!(senders.contains(&"a-camera-video".to_owned()));
    assert!(!senders.contains(&"a-screen".to_owned()));
}
