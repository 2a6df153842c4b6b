use crate::integration::init_tracing;
use crate::utils::{TestConnection, create_test_relay};

#[tokio::test]
async fn test_rooms_are_isolated() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestConnection::connect(&relay).await.unwrap();
    let mut b = TestConnection::connect(&relay).await.unwrap();

    a.join("lobby1", "a").await.unwrap();
    b.join("lobby2", "b").await.unwrap();
    a.expect_silence().await.unwrap();

    b.disconnect();
    a.expect_silence().await.unwrap();
    assert_eq!(relay.registry().room_count(), 1);
}
