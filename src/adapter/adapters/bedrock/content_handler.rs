use crate::adapter::bedrock::{JSON_CONTENT_TYPE, ModelFamily, ModelKwargs};
use crate::{Error, Result};
use serde_json::{Map, Value};
use value_ext::JsonValueExt;

/// Encodes the prompt into the request body and decodes model output into text.
///
/// The endpoint routes every request body and every response (unary body or stream fragment)
/// through its handler, so swapping the handler changes both directions at once.
pub trait ContentHandler: Send + Sync {
	/// MIME type of the request body.
	fn content_type(&self) -> &str;

	/// MIME type expected back from a unary invocation.
	fn accepts(&self) -> &str;

	fn transform_input(&self, prompt: &str, model_kwargs: &ModelKwargs) -> Result<Vec<u8>>;

	fn transform_output(&self, output: &[u8]) -> Result<String>;
}

// region:    --- ModelContentHandler

/// Default handler: the model family's own body and text path.
#[derive(Debug, Clone, Copy)]
pub struct ModelContentHandler {
	family: ModelFamily,
}

impl ModelContentHandler {
	pub fn new(family: ModelFamily) -> Self {
		Self { family }
	}
}

impl ContentHandler for ModelContentHandler {
	fn content_type(&self) -> &str {
		JSON_CONTENT_TYPE
	}

	fn accepts(&self) -> &str {
		JSON_CONTENT_TYPE
	}

	fn transform_input(&self, prompt: &str, model_kwargs: &ModelKwargs) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(&self.family.build_body(prompt, model_kwargs))?)
	}

	fn transform_output(&self, output: &[u8]) -> Result<String> {
		let value: Value = serde_json::from_slice(output)?;
		self.family.extract_text(&value)
	}
}

// endregion: --- ModelContentHandler

// region:    --- JsonPromptContentHandler

/// Sends `{"prompt": .., ...model_kwargs}` and reads `completions[0].data.text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPromptContentHandler;

impl ContentHandler for JsonPromptContentHandler {
	fn content_type(&self) -> &str {
		JSON_CONTENT_TYPE
	}

	fn accepts(&self) -> &str {
		JSON_CONTENT_TYPE
	}

	fn transform_input(&self, prompt: &str, model_kwargs: &ModelKwargs) -> Result<Vec<u8>> {
		let mut body = Map::new();
		body.insert("prompt".to_string(), Value::String(prompt.to_string()));
		for (key, value) in model_kwargs {
			body.insert(key.clone(), value.clone());
		}
		Ok(serde_json::to_vec(&body)?)
	}

	fn transform_output(&self, output: &[u8]) -> Result<String> {
		let value: Value = serde_json::from_slice(output)?;
		value
			.x_get::<String>("/completions/0/data/text")
			.map_err(|_| Error::ResponseTextNotFound {
				path: "completions[0].data.text",
			})
	}
}

// endregion: --- JsonPromptContentHandler

// region:    --- Tests


// endregion: --- Tests
