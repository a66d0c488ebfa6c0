//! Credential resolution for signing Bedrock requests.

// region:    --- Modules

mod auth_data;
mod error;

pub use auth_data::*;
pub use error::{Error, Result};

// endregion: --- Modules
