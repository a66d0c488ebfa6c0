use crate::Headers;
use crate::webc::{Error, Result};
use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

/// Header carrying the AWS request id on Bedrock responses.
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// Minimal POST client. Headers are passed already signed; this layer never alters them.
#[derive(Debug, Clone, Default)]
pub struct WebClient {
	reqwest_client: reqwest::Client,
}

impl WebClient {
	pub fn from_reqwest_client(reqwest_client: reqwest::Client) -> Self {
		Self { reqwest_client }
	}
}

/// A unary response whose status was a success.
#[derive(Debug, Clone)]
pub struct WebResponse {
	pub status: StatusCode,
	pub request_id: Option<String>,
	pub body: Bytes,
}

impl WebClient {
	/// POST `body` and read the whole response.
	pub async fn do_post(&self, url: &str, headers: &Headers, body: Vec<u8>) -> Result<WebResponse> {
		let response = self.new_req_builder(url, headers, body).send().await?;
		let response = check_status(response).await?;

		let status = response.status();
		let request_id = request_id(&response);
		let body = response.bytes().await?;

		debug!(%status, ?request_id, body_len = body.len(), "web post done");

		Ok(WebResponse {
			status,
			request_id,
			body,
		})
	}

	/// POST `body` and hand back the response once headers arrive, for the caller to stream.
	pub async fn do_post_stream(&self, url: &str, headers: &Headers, body: Vec<u8>) -> Result<Response> {
		let response = self.new_req_builder(url, headers, body).send().await?;
		let response = check_status(response).await?;

		debug!(status = %response.status(), request_id = ?request_id(&response), "web post stream started");

		Ok(response)
	}

	fn new_req_builder(&self, url: &str, headers: &Headers, body: Vec<u8>) -> RequestBuilder {
		let mut reqwest_builder = self.reqwest_client.post(url);
		for (name, value) in headers.iter() {
			reqwest_builder = reqwest_builder.header(name, value);
		}
		reqwest_builder.body(body)
	}
}

// region:    --- Support

pub(crate) fn request_id(response: &Response) -> Option<String> {
	response
		.headers()
		.get(REQUEST_ID_HEADER)
		.and_then(|v| v.to_str().ok())
		.map(|v| v.to_string())
}

async fn check_status(response: Response) -> Result<Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}

	let request_id = request_id(&response);
	let body = match response.text().await {
		Ok(body) => body,
		Err(err) => {
			warn!(%status, ?request_id, %err, "cannot read error response body");
			String::new()
		}
	};
	Err(Error::ResponseFailedStatus {
		status,
		request_id,
		body,
	})
}

// endregion: --- Support
