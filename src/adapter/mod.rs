//! Model endpoint adapters.

// region:    --- Modules

mod adapters;

pub use adapters::bedrock;

// endregion: --- Modules
