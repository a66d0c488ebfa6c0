//! Prompt template and single-step chain: format variables into a prompt, call the model.

// region:    --- Modules

mod llm_chain;
mod prompt_template;

pub use llm_chain::*;
pub use prompt_template::*;

// endregion: --- Modules
