use tandem_client::{ClientEvent, NegotiationState};

use super::stable_with;
use crate::integration::init_tracing;
use crate::utils::{MockMedia, TestPeer, create_test_relay};

#[tokio::test]
async fn test_lobby_call() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestPeer::connect(&relay, MockMedia::new("a")).await.unwrap();
    let mut b = TestPeer::connect(&relay, MockMedia::new("b")).await.unwrap();

    a.join("lobby1", "a@x.io").await.unwrap();
    b.join("lobby1", "b@x.io").await.unwrap();

    let b_id = b.id;
    match a
        .wait_for_event(|e| matches!(e, ClientEvent::PeerJoined { .. }))
        .await
        .unwrap()
    {
        ClientEvent::PeerJoined {
            identity,
            connection_id,
        } => {
            assert_eq!(identity.as_str(), "b@x.io");
            assert_eq!(connection_id, b_id);
        }
        other => panic!("unexpected {other:?}"),
    }

    a.engine.call(b.id).await.unwrap();

    let a_id = a.id;
    b.wait_for_event(|e| matches!(e, ClientEvent::IncomingCall { from } if *from == a_id))
        .await
        .unwrap();

    let a_side = stable_with(&a, b.id, 2).await.unwrap();
    let b_side = stable_with(&b, a.id, 2).await.unwrap();
    assert_eq!(a_side.last_error, None);
    assert_eq!(b_side.last_error, None);

    a.wait_for_event(|e| {
        matches!(e, ClientEvent::SessionState { state: NegotiationState::Stable, remote } if *remote == b_id)
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_simultaneous_calls_settle() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestPeer::connect(&relay, MockMedia::new("a")).await.unwrap();
    let mut b = TestPeer::connect(&relay, MockMedia::new("b")).await.unwrap();
    a.join("lobby1", "a").await.unwrap();
    b.join("lobby1", "b").await.unwrap();

    let (from_a, from_b) = tokio::join!(a.engine.call(b.id), b.engine.call(a.id));
    from_a.unwrap();
    from_b.unwrap();

    let a_side = stable_with(&a, b.id, 2).await.unwrap();
    let b_side = stable_with(&b, a.id, 2).await.unwrap();
    assert_eq!(a_side.last_error, None);
    assert_eq!(b_side.last_error, None);
    assert_eq!(a.engine.session_count(), 1);
    assert_eq!(b.engine.session_count(), 1);
}
