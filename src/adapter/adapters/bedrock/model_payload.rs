//! Per-model request dialects.
//!
//! A model id selects one `ModelFamily`, and that family alone decides the request body,
//! the request options, and how text and stop reason are read back from responses.

use crate::{Error, Headers, Result};
use serde_json::{Map, Value, json};
use value_ext::JsonValueExt;

/// Extra generation parameters merged over a family's defaults.
pub type ModelKwargs = Map<String, Value>;

pub const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";
pub const JSON_CONTENT_TYPE: &str = "application/json";

const TITAN_MAX_TOKEN_COUNT: u32 = 4000;
const CLAUDE_MAX_TOKENS_TO_SAMPLE: u32 = 200;

// region:    --- Types

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ModelFamily {
	Titan,
	Claude,
	ClaudeInstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResponseMode {
	#[default]
	Single,
	Stream,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestOptions {
	pub headers: Headers,
	pub response_mode: ResponseMode,
}

/// Request body plus options for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadSpec {
	pub body: Value,
	pub options: RequestOptions,
}

// endregion: --- Types

/// Build the body and options for `model`.
///
/// Fails with `Error::UnsupportedModel` for any identifier outside the known families.
pub fn build_payload(prompt: &str, model: &str, model_kwargs: &ModelKwargs) -> Result<PayloadSpec> {
	let family = ModelFamily::from_model(model)?;
	Ok(family.build_payload(prompt, model_kwargs))
}

impl ModelFamily {
	pub fn from_model(model: &str) -> Result<Self> {
		if model.starts_with("amazon.titan-tg1-") || model.starts_with("amazon.titan-text-") {
			Ok(ModelFamily::Titan)
		} else if model.starts_with("anthropic.claude-instant-v") {
			Ok(ModelFamily::ClaudeInstant)
		} else if model.starts_with("anthropic.claude-v") {
			Ok(ModelFamily::Claude)
		} else {
			Err(Error::UnsupportedModel {
				model: model.to_string(),
			})
		}
	}

	pub fn name(&self) -> &'static str {
		self.into()
	}

	pub fn build_payload(&self, prompt: &str, model_kwargs: &ModelKwargs) -> PayloadSpec {
		PayloadSpec {
			body: self.build_body(prompt, model_kwargs),
			options: self.request_options(),
		}
	}

	pub fn build_body(&self, prompt: &str, model_kwargs: &ModelKwargs) -> Value {
		match self {
			ModelFamily::Titan => {
				let mut config = json!({
					"maxTokenCount": TITAN_MAX_TOKEN_COUNT,
					"temperature": 0.0,
					"stopSequences": []
				});
				merge_kwargs(&mut config, model_kwargs);
				json!({
					"inputText": prompt,
					"textGenerationConfig": config
				})
			}
			ModelFamily::Claude | ModelFamily::ClaudeInstant => {
				let mut body = json!({
					"prompt": prompt,
					"max_tokens_to_sample": CLAUDE_MAX_TOKENS_TO_SAMPLE
				});
				merge_kwargs(&mut body, model_kwargs);
				body
			}
		}
	}

	/// The header profile the model declares. Claude (non instant) declares none and answers in one body.
	pub fn request_options(&self) -> RequestOptions {
		match self {
			ModelFamily::Titan => RequestOptions {
				headers: Headers::from([
					("accept", EVENT_STREAM_CONTENT_TYPE),
					("content-type", JSON_CONTENT_TYPE),
					("x-amzn-bedrock-accept", "*/*"),
					("x-amzn-bedrock-save", "true"),
				]),
				response_mode: ResponseMode::Stream,
			},
			ModelFamily::ClaudeInstant => RequestOptions {
				headers: Headers::from([("accept", EVENT_STREAM_CONTENT_TYPE), ("content-type", JSON_CONTENT_TYPE)]),
				response_mode: ResponseMode::Stream,
			},
			ModelFamily::Claude => RequestOptions::default(),
		}
	}

	/// Generated text of a unary body or of one decoded stream fragment.
	pub fn extract_text(&self, value: &Value) -> Result<String> {
		match self {
			ModelFamily::Titan => value
				.x_get::<String>("outputText")
				.or_else(|_| value.x_get::<String>("/results/0/outputText"))
				.map_err(|_| Error::ResponseTextNotFound {
					path: "results[0].outputText",
				}),
			ModelFamily::Claude | ModelFamily::ClaudeInstant => value
				.x_get::<String>("completion")
				.map_err(|_| Error::ResponseTextNotFound { path: "completion" }),
		}
	}

	/// Termination reason, when the model reported one. `null` counts as absent.
	pub fn stop_reason(&self, value: &Value) -> Option<String> {
		match self {
			ModelFamily::Titan => value
				.x_get::<String>("completionReason")
				.or_else(|_| value.x_get::<String>("/results/0/completionReason"))
				.ok(),
			ModelFamily::Claude | ModelFamily::ClaudeInstant => value.x_get::<String>("stop_reason").ok(),
		}
	}
}

fn merge_kwargs(target: &mut Value, model_kwargs: &ModelKwargs) {
	if let Value::Object(map) = target {
		for (key, value) in model_kwargs {
			map.insert(key.clone(), value.clone());
		}
	}
}

// region:    --- Tests


// endregion: --- Tests
