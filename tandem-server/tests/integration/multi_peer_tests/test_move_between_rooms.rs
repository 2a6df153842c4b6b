use tandem_core::{ClientMessage, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{TestConnection, create_test_relay};

#[tokio::test]
async fn test_move_between_rooms() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestConnection::connect(&relay).await.unwrap();
    let mut b = TestConnection::connect(&relay).await.unwrap();
    let mut c = TestConnection::connect(&relay).await.unwrap();

    a.join("one", "a").await.unwrap();
    b.join("one", "b").await.unwrap();
    c.join("two", "c").await.unwrap();
    a.recv().await.unwrap();

    b.join("two", "b").await.unwrap();

    assert!(matches!(
        a.recv().await.unwrap(),
        ServerMessage::UserLeft { connection_id, .. } if connection_id == b.id
    ));
    assert!(matches!(
        c.recv().await.unwrap(),
        ServerMessage::UserJoined { connection_id, .. } if connection_id == b.id
    ));
}

#[tokio::test]
async fn test_leave_room_keeps_connection() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestConnection::connect(&relay).await.unwrap();
    let mut b = TestConnection::connect(&relay).await.unwrap();
    a.join("lobby1", "a").await.unwrap();
    b.join("lobby1", "b").await.unwrap();
    a.recv().await.unwrap();

    b.send(ClientMessage::LeaveRoom);
    assert!(matches!(
        a.recv().await.unwrap(),
        ServerMessage::UserLeft { connection_id, .. } if connection_id == b.id
    ));

    // Still reachable for direct frames.
    a.send(ClientMessage::IceCandidate {
        candidate: "c".to_owned(),
        to: b.id,
    });
    assert_eq!(b.recv().await.unwrap().kind(), "ice-candidate");

    b.send(ClientMessage::LeaveRoom);
    a.expect_silence().await.unwrap();
}
