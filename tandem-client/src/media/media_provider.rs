use crate::media::MediaTrack;
use async_trait::async_trait;
use tandem_core::Result;

/// Source of local capture. Failures are `Error::MediaAcquisition` and go
/// straight back to whoever asked for the media.
#[async_trait]
pub trait MediaProvider<T>: Send + Sync {
    /// Camera and microphone tracks.
    async fn camera(&self) -> Result<Vec<MediaTrack<T>>>;

    async fn screen(&self) -> Result<MediaTrack<T>>;
}
