mod signaling_output;
mod ws_connector;

pub use signaling_output::*;
pub use ws_connector::*;
