use tandem_client::MediaConnectionAdapter;
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::MockBackend;

#[tokio::test]
async fn test_candidates_wait_for_remote_description() {
    init_tracing();

    let (tx, _rx) = mpsc::unbounded_channel();
    let backend = MockBackend::new("b", tx.clone());
    let adapter = MediaConnectionAdapter::new(backend.clone(), tx);

    adapter.add_ice_candidate("c1".to_owned()).await.unwrap();
    adapter.add_ice_candidate("c2".to_owned()).await.unwrap();
    assert!(backend.candidates().await.is_empty());

    adapter.create_answer("offer:a:0:").await.unwrap();
    assert_eq!(backend.candidates().await, vec!["c1", "c2"]);

    adapter.add_ice_candidate("c3".to_owned()).await.unwrap();
    assert_eq!(backend.candidates().await.len(), 3);
}
