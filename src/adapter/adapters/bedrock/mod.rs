//! AWS Bedrock Endpoint Adapter
//!
//! API Documentation: https://docs.aws.amazon.com/bedrock/latest/APIReference/
//! InvokeModel API: https://docs.aws.amazon.com/bedrock/latest/APIReference/API_runtime_InvokeModel.html
//! InvokeModelWithResponseStream API: https://docs.aws.amazon.com/bedrock/latest/APIReference/API_runtime_InvokeModelWithResponseStream.html
//!
//! Supported Models (text completion dialects):
//! - amazon.titan-tg1-large, amazon.titan-text-express-v1, amazon.titan-text-lite-v1
//! - anthropic.claude-v1, anthropic.claude-v2, anthropic.claude-v2:1
//! - anthropic.claude-instant-v1
//!
//! Environment Variables (with the default `AuthData::AwsEnv`):
//! - AWS_ACCESS_KEY_ID: AWS Access Key ID
//! - AWS_SECRET_ACCESS_KEY: AWS Secret Access Key
//! - AWS_SESSION_TOKEN: (Optional) AWS Session Token for temporary credentials

mod adapter_impl;
mod aws_auth;
mod config;
mod content_handler;
mod event_stream;
mod model_payload;
mod streamer;

pub use adapter_impl::*;
pub use aws_auth::*;
pub use config::*;
pub use content_handler::*;
pub use event_stream::*;
pub use model_payload::*;
pub use streamer::*;
