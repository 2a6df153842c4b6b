use tandem_core::ServerMessage;

use crate::integration::init_tracing;
use crate::utils::{TestConnection, create_test_relay};

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestConnection::connect(&relay).await.unwrap();
    let mut b = TestConnection::connect(&relay).await.unwrap();
    a.join("lobby1", "a").await.unwrap();

    a.send_text("not json at all");
    a.send_text(r#"{"type":"hang-up","payload":{}}"#);
    a.send_text(&format!(
        r#"{{"type":"user-call","payload":{{"toConnectionId":"{}"}}}}"#,
        b.id
    ));
    a.send_text(r#"{"type":"user-call","payload":{"offer":"x","toConnectionId":"nope"}}"#);

    a.expect_silence().await.unwrap();
    b.expect_silence().await.unwrap();

    // The connection keeps working afterwards.
    b.join("lobby1", "b").await.unwrap();
    assert!(matches!(
        a.recv().await.unwrap(),
        ServerMessage::UserJoined { connection_id, .. } if connection_id == b.id
    ));
}
