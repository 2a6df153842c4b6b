use std::collections::HashSet;
use tandem_core::{RoomId, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{TestConnection, create_test_relay};

#[tokio::test]
async fn test_three_peers_join() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestConnection::connect(&relay).await.unwrap();
    let mut b = TestConnection::connect(&relay).await.unwrap();
    let mut c = TestConnection::connect(&relay).await.unwrap();

    a.join("lobby1", "a").await.unwrap();
    b.join("lobby1", "b").await.unwrap();
    c.join("lobby1", "c").await.unwrap();

    let joined = |msg: ServerMessage| match msg {
        ServerMessage::UserJoined { connection_id, .. } => connection_id,
        other => panic!("expected user-joined, got {other:?}"),
    };

    assert_eq!(joined(a.recv().await.unwrap()), b.id);
    assert_eq!(joined(a.recv().await.unwrap()), c.id);
    assert_eq!(joined(b.recv().await.unwrap()), c.id);

    a.expect_silence().await.unwrap();
    b.expect_silence().await.unwrap();
    c.expect_silence().await.unwrap();

    assert_eq!(
        relay.registry().members_of(&RoomId::parse("lobby1").unwrap()),
        HashSet::from([a.id, b.id, c.id])
    );
}
