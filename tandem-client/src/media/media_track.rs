use std::fmt;

/// Identity of a local track. Attach and detach match on this, never on kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackSource {
    Camera,
    Microphone,
    Screen,
}

/// A local track plus the platform handle the backend attaches.
#[derive(Clone)]
pub struct MediaTrack<T> {
    pub id: TrackId,
    pub kind: TrackKind,
    pub source: TrackSource,
    pub inner: T,
}

impl<T> MediaTrack<T> {
    pub fn new(id: impl Into<String>, kind: TrackKind, source: TrackSource, inner: T) -> Self {
        Self {
            id: TrackId::new(id),
            kind,
            source,
            inner,
        }
    }
}

impl<T> fmt::Debug for MediaTrack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
