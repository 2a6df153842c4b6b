mod membership;
mod room_registry;

pub use membership::*;
pub use room_registry::*;
