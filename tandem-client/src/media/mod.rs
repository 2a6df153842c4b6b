mod media_provider;
mod media_track;

pub use media_provider::*;
pub use media_track::*;
