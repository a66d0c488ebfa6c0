use crate::adapter::bedrock::{
	BedrockConfig, BedrockStreamer, ContentHandler, EVENT_STREAM_CONTENT_TYPE, ModelContentHandler, ModelFamily,
	PayloadSpec, RequestOptions, RequestSigner, ResponseMode, StreamEvent, encode_path_segment, signer_for,
};
use crate::chain::Llm;
use crate::webc::{WebClient, WebResponse};
use crate::{Error, Headers, Result};
use futures::StreamExt;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{Instrument, debug, debug_span};
use uuid::Uuid;

/// Bedrock text-generation endpoint for one configured model.
///
/// Every call performs exactly one signed HTTPS request. Nothing is cached or retried,
/// and transport errors reach the caller as they are.
pub struct BedrockEndpoint {
	config: BedrockConfig,
	family: ModelFamily,
	content_handler: Arc<dyn ContentHandler>,
	web_client: WebClient,
}

/// The unary result of `exec_generate`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
	pub model: String,
	pub text: String,
	pub stop_reason: Option<String>,
	/// `x-amzn-requestid` of the response, when present.
	pub request_id: Option<String>,
}

/// The streaming result of `invoke_stream`.
pub struct GenerateStreamResponse {
	pub model: String,
	pub request_id: Option<String>,
	pub stream: BedrockStreamer,
}

impl BedrockEndpoint {
	/// Fails with `Error::UnsupportedModel` when the configured model has no known dialect.
	pub fn new(config: BedrockConfig) -> Result<Self> {
		let family = ModelFamily::from_model(&config.model)?;
		let content_handler = config
			.content_handler
			.clone()
			.unwrap_or_else(|| Arc::new(ModelContentHandler::new(family)));

		Ok(Self {
			config,
			family,
			content_handler,
			web_client: WebClient::default(),
		})
	}

	/// Use a preconfigured `reqwest::Client` (timeouts, proxies, TLS).
	pub fn with_reqwest_client(mut self, reqwest_client: reqwest::Client) -> Self {
		self.web_client = WebClient::from_reqwest_client(reqwest_client);
		self
	}
}

/// Getters
impl BedrockEndpoint {
	pub fn llm_type(&self) -> &'static str {
		"bedrock_endpoint"
	}

	pub fn config(&self) -> &BedrockConfig {
		&self.config
	}

	pub fn model(&self) -> &str {
		&self.config.model
	}

	pub fn family(&self) -> ModelFamily {
		self.family
	}

	pub fn invoke_url(&self) -> String {
		format!("{}/model/{}/invoke", self.config.base_url(), encode_path_segment(&self.config.model))
	}

	pub fn invoke_stream_url(&self) -> String {
		format!(
			"{}/model/{}/invoke-with-response-stream",
			self.config.base_url(),
			encode_path_segment(&self.config.model)
		)
	}

	/// Body and options the configured model expects for `prompt`.
	pub fn payload(&self, prompt: &str) -> Result<PayloadSpec> {
		super::build_payload(prompt, &self.config.model, &self.config.model_kwargs)
	}

	/// The configured `stream` flag, or the model's declared response mode when unset.
	pub fn is_streaming(&self) -> bool {
		self.config
			.stream
			.unwrap_or_else(|| self.family.request_options().response_mode == ResponseMode::Stream)
	}
}

/// Calls
impl BedrockEndpoint {
	/// Generate text for `prompt`, streaming or not per `is_streaming`.
	pub async fn generate(&self, prompt: &str) -> Result<String> {
		Ok(self.exec_generate(prompt).await?.text)
	}

	pub async fn exec_generate(&self, prompt: &str) -> Result<GenerateResponse> {
		if !self.is_streaming() {
			let response = self.invoke(prompt).await?;
			let text = self.content_handler.transform_output(&response.body)?;
			let stop_reason = serde_json::from_slice::<Value>(&response.body)
				.ok()
				.and_then(|value| self.family.stop_reason(&value));

			return Ok(GenerateResponse {
				model: self.config.model.clone(),
				text,
				stop_reason,
				request_id: response.request_id,
			});
		}

		let GenerateStreamResponse {
			model,
			request_id,
			mut stream,
		} = self.invoke_stream(prompt).await?;

		let mut text = String::new();
		let mut stop_reason = None;
		while let Some(event) = stream.next().await {
			match event? {
				StreamEvent::Start | StreamEvent::Chunk(_) => (),
				StreamEvent::End(end) => {
					text = end.captured_text;
					stop_reason = end.stop_reason;
				}
			}
		}

		Ok(GenerateResponse {
			model,
			text,
			stop_reason,
			request_id,
		})
	}

	/// One signed POST to `.../invoke`; returns the raw model body.
	pub async fn invoke(&self, prompt: &str) -> Result<WebResponse> {
		let options = self.family.request_options();
		let body = self.content_handler.transform_input(prompt, &self.config.model_kwargs)?;
		let headers = Headers::from([
			("content-type", self.content_handler.content_type()),
			("accept", self.content_handler.accepts()),
		]);
		let url = self.invoke_url();

		let span = self.call_span("invoke", options.response_mode);
		async {
			let headers = self.signer()?.sign_request("POST", &url, &headers, &body)?;
			debug!(%url, body_len = body.len(), "bedrock invoke");
			let response = self.web_client.do_post(&url, &headers, body).await?;
			Ok::<_, Error>(response)
		}
		.instrument(span)
		.await
	}

	/// One signed POST to `.../invoke-with-response-stream`; returns once response headers arrive.
	pub async fn invoke_stream(&self, prompt: &str) -> Result<GenerateStreamResponse> {
		let options = self.family.request_options();
		let body = self.content_handler.transform_input(prompt, &self.config.model_kwargs)?;
		let headers = stream_headers(&options, self.content_handler.content_type());
		let url = self.invoke_stream_url();

		let span = self.call_span("invoke_stream", options.response_mode);
		async {
			let headers = self.signer()?.sign_request("POST", &url, &headers, &body)?;
			debug!(%url, body_len = body.len(), "bedrock invoke stream");
			let response = self.web_client.do_post_stream(&url, &headers, body).await?;
			let request_id = crate::webc::request_id(&response);

			let stream = BedrockStreamer::new(
				response.bytes_stream().boxed(),
				self.family,
				self.content_handler.clone(),
			);

			Ok::<_, Error>(GenerateStreamResponse {
				model: self.config.model.clone(),
				request_id,
				stream,
			})
		}
		.instrument(span)
		.await
	}
}

// region:    --- Support

impl BedrockEndpoint {
	fn signer(&self) -> Result<Box<dyn RequestSigner>> {
		signer_for(&self.config.auth, &self.config.region)
	}

	fn call_span(&self, call: &'static str, declared_mode: ResponseMode) -> tracing::Span {
		let declared_mode: &'static str = declared_mode.into();
		debug_span!(
			"bedrock_call",
			call,
			invocation_id = %Uuid::new_v4(),
			model = %self.config.model,
			family = self.family.name(),
			declared_mode,
			region = %self.config.region,
			role_arn = ?self.config.role_arn,
		)
	}
}

/// The model's stream header profile, or the generic event-stream profile for models
/// that declare single mode but are streamed anyway.
fn stream_headers(options: &RequestOptions, content_type: &str) -> Headers {
	let defaults = Headers::from([("accept", EVENT_STREAM_CONTENT_TYPE), ("content-type", content_type)]);
	match options.response_mode {
		ResponseMode::Stream => defaults.merged(options.headers.clone()),
		ResponseMode::Single => defaults,
	}
}

// endregion: --- Support

// region:    --- Llm

impl Llm for BedrockEndpoint {
	fn llm_type(&self) -> &'static str {
		BedrockEndpoint::llm_type(self)
	}

	fn call(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send {
		self.generate(prompt)
	}
}

// endregion: --- Llm

// region:    --- Tests


// endregion: --- Tests
