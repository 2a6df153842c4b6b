mod call_engine;
mod client_event;

pub use call_engine::*;
pub use client_event::*;
