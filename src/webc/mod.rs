//! Thin HTTP layer over `reqwest` used by the Bedrock adapter.

// region:    --- Modules

mod error;
mod web_client;

pub use error::{Error, Result};
pub use web_client::*;

// endregion: --- Modules
