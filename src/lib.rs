//! AWS Bedrock text-generation endpoint adapter.
//!
//! Builds the per-model request payload (Titan, Claude), signs the request (AWS SigV4 or bearer token),
//! and decodes either the unary JSON body or the `application/vnd.amazon.eventstream` response
//! into generated text. A small prompt-template chain is provided to plug the endpoint into
//! a "format prompt, then call the model" flow.
//!
//! ```rust,ignore
//! use bedrock_endpoint::{BedrockConfig, BedrockEndpoint};
//!
//! let endpoint = BedrockEndpoint::new(BedrockConfig::new("us-east-1", "anthropic.claude-v1"))?;
//! let text = endpoint.generate("Human: Say hi\n\nAssistant:").await?;
//! ```

// region:    --- Modules

mod error;
mod headers;

pub mod adapter;
pub mod chain;
pub mod resolver;
pub mod webc;

pub use error::{Error, Result};
pub use headers::Headers;

pub use adapter::bedrock::{
	BedrockConfig, BedrockEndpoint, ContentHandler, GenerateResponse, GenerateStreamResponse, ModelFamily,
	ModelKwargs, PayloadSpec, RequestOptions, ResponseMode, StreamEvent,
};
pub use chain::{ChainOutput, Llm, LlmChain, PromptTemplate};
pub use resolver::AuthData;

// endregion: --- Modules
