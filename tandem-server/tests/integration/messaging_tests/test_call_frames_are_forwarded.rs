use tandem_core::{ClientMessage, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{TestConnection, create_test_relay};

#[tokio::test]
async fn test_call_frames_are_forwarded() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestConnection::connect(&relay).await.unwrap();
    let mut b = TestConnection::connect(&relay).await.unwrap();
    a.join("lobby1", "a@x.io").await.unwrap();
    b.join("lobby1", "b@x.io").await.unwrap();
    a.recv().await.unwrap();

    a.send(ClientMessage::UserCall {
        offer: "offer-1".to_owned(),
        to: b.id,
    });
    assert_eq!(
        b.recv().await.unwrap(),
        ServerMessage::IncomingCall {
            offer: "offer-1".to_owned(),
            from: a.id,
        }
    );

    b.send(ClientMessage::CallAccepted {
        answer: "answer-1".to_owned(),
        to: a.id,
    });
    assert_eq!(
        a.recv().await.unwrap(),
        ServerMessage::CallAccepted {
            answer: "answer-1".to_owned(),
            from: b.id,
        }
    );

    b.send(ClientMessage::PeerNegotiationNeeded {
        offer: "offer-2".to_owned(),
        to: a.id,
    });
    assert_eq!(
        a.recv().await.unwrap(),
        ServerMessage::PeerNegotiationNeeded {
            offer: "offer-2".to_owned(),
            from: b.id,
        }
    );

    a.send(ClientMessage::PeerNegotiationDone {
        answer: "answer-2".to_owned(),
        to: b.id,
    });
    assert_eq!(
        b.recv().await.unwrap(),
        ServerMessage::PeerNegotiationFinal {
            answer: "answer-2".to_owned(),
            from: a.id,
        }
    );

    a.send(ClientMessage::IceCandidate {
        candidate: "candidate:1 1 udp 1 10.0.0.1 5000 typ host".to_owned(),
        to: b.id,
    });
    assert!(matches!(
        b.recv().await.unwrap(),
        ServerMessage::IceCandidate { from, .. } if from == a.id
    ));

    a.expect_silence().await.unwrap();
    b.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_forwarding_does_not_require_shared_room() {
    init_tracing();

    let relay = create_test_relay();
    let a = TestConnection::connect(&relay).await.unwrap();
    let mut b = TestConnection::connect(&relay).await.unwrap();

    a.send(ClientMessage::UserCall {
        offer: "sdp".to_owned(),
        to: b.id,
    });

    assert!(matches!(
        b.recv().await.unwrap(),
        ServerMessage::IncomingCall { from, .. } if from == a.id
    ));
}
