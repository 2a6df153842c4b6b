pub mod error;
pub mod model;
pub mod utils;

pub use error::{Error, NegotiationError, Result};
pub use model::*;
