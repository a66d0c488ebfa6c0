//! Shared helpers for integration tests.

#![allow(unused)] // Each test crate uses a different subset.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bedrock_endpoint::adapter::bedrock::{EventStreamHeader, EventStreamMessage, HeaderValue, event_message};
use bedrock_endpoint::{AuthData, BedrockConfig};
use serde_json::Value;

pub type TestResult<T> = core::result::Result<T, Box<dyn std::error::Error>>;

pub const TEST_REGION: &str = "us-east-1";

/// Config pointed at a mock server, with static keys so signing works offline.
pub fn mock_config(server_uri: &str, model: &str) -> BedrockConfig {
	BedrockConfig::new(TEST_REGION, model)
		.with_endpoint_url(server_uri)
		.with_auth(AuthData::from_keys("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"))
		.with_role_arn("arn:aws:iam::123456789012:role/BedrockInvoke")
}

/// One `chunk` event frame carrying `json` the way Bedrock does (base64 in `bytes`).
pub fn chunk_frame(json: &Value) -> Vec<u8> {
	let encoded = BASE64.encode(json.to_string());
	event_message("chunk", format!(r#"{{"bytes":"{encoded}","p":"abcdefghijklmnopqrstuvwxyzABCDEFGHIJ"}}"#))
		.encode()
		.expect("chunk frame should encode")
		.to_vec()
}

pub fn exception_frame(exception_type: &str, message: &str) -> Vec<u8> {
	EventStreamMessage {
		headers: vec![
			EventStreamHeader {
				name: ":exception-type".to_string(),
				value: HeaderValue::String(exception_type.to_string()),
			},
			EventStreamHeader {
				name: ":content-type".to_string(),
				value: HeaderValue::String("application/json".to_string()),
			},
			EventStreamHeader {
				name: ":message-type".to_string(),
				value: HeaderValue::String("exception".to_string()),
			},
		],
		payload: serde_json::json!({ "message": message }).to_string().into(),
	}
	.encode()
	.expect("exception frame should encode")
	.to_vec()
}

/// Concatenated frames, as one response body.
pub fn event_stream_body(frames: &[Vec<u8>]) -> Vec<u8> {
	frames.concat()
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}
