use crate::adapter::bedrock::{ContentHandler, ModelKwargs};
use crate::resolver::AuthData;
use serde_json::Value;
use std::sync::Arc;

/// Everything a `BedrockEndpoint` needs, passed explicitly at construction.
#[derive(Clone)]
pub struct BedrockConfig {
	pub region: String,
	pub model: String,
	/// Identity the credentials are expected to belong to. Carried for tracing only;
	/// assuming the role is up to whoever supplies the credentials.
	pub role_arn: Option<String>,
	/// `None` follows the model's declared response mode.
	pub stream: Option<bool>,
	pub model_kwargs: ModelKwargs,
	/// Overrides `https://bedrock.<region>.amazonaws.com` (VPC endpoints, tests).
	pub endpoint_url: Option<String>,
	pub auth: AuthData,
	/// `None` uses the model family's handler.
	pub content_handler: Option<Arc<dyn ContentHandler>>,
}

impl BedrockConfig {
	pub fn new(region: impl Into<String>, model: impl Into<String>) -> Self {
		Self {
			region: region.into(),
			model: model.into(),
			role_arn: None,
			stream: None,
			model_kwargs: ModelKwargs::new(),
			endpoint_url: None,
			auth: AuthData::default(),
			content_handler: None,
		}
	}

	pub fn base_url(&self) -> String {
		match &self.endpoint_url {
			Some(url) => url.trim_end_matches('/').to_string(),
			None => format!("https://bedrock.{}.amazonaws.com", self.region),
		}
	}
}

/// Chainable setters
impl BedrockConfig {
	pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
		self.role_arn = Some(role_arn.into());
		self
	}

	pub fn with_stream(mut self, stream: bool) -> Self {
		self.stream = Some(stream);
		self
	}

	pub fn with_model_kwargs(mut self, model_kwargs: ModelKwargs) -> Self {
		self.model_kwargs = model_kwargs;
		self
	}

	pub fn with_model_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.model_kwargs.insert(key.into(), value.into());
		self
	}

	pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
		self.endpoint_url = Some(endpoint_url.into());
		self
	}

	pub fn with_auth(mut self, auth: AuthData) -> Self {
		self.auth = auth;
		self
	}

	pub fn with_content_handler(mut self, content_handler: impl ContentHandler + 'static) -> Self {
		self.content_handler = Some(Arc::new(content_handler));
		self
	}
}

impl std::fmt::Debug for BedrockConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BedrockConfig")
			.field("region", &self.region)
			.field("model", &self.model)
			.field("role_arn", &self.role_arn)
			.field("stream", &self.stream)
			.field("model_kwargs", &self.model_kwargs)
			.field("endpoint_url", &self.endpoint_url)
			.field("auth", &self.auth)
			.field("content_handler", &self.content_handler.as_ref().map(|_| "custom"))
			.finish()
	}
}

// region:    --- Tests


// endregion: --- Tests
