mod negotiation_session;
mod negotiation_state;
mod session_command;
mod session_handle;

pub use negotiation_session::*;
pub use negotiation_state::*;
pub use session_command::*;
pub use session_handle::*;
