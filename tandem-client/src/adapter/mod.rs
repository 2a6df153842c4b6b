mod adapter_event;
mod backend;
mod media_connection_adapter;
mod webrtc_backend;

pub use adapter_event::*;
pub use backend::*;
pub use media_connection_adapter::*;
pub use webrtc_backend::*;
