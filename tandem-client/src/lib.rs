mod adapter;
mod config;
mod engine;
mod media;
mod session;
mod signaling;

pub use adapter::*;
pub use config::*;
pub use engine::*;
pub use media::*;
pub use session::*;
pub use signaling::*;
