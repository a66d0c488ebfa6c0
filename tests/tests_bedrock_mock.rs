//! Bedrock endpoint tests against a local mock server.
//!
//! Requests are fully signed with static test keys; the mock server only checks shape.

mod support;

use crate::support::{TestResult, chunk_frame, event_stream_body, exception_frame, init_tracing, mock_config};
use bedrock_endpoint::adapter::bedrock::{EVENT_STREAM_CONTENT_TYPE, JsonPromptContentHandler, StreamChunk};
use bedrock_endpoint::webc;
use bedrock_endpoint::{AuthData, BedrockEndpoint, Error, LlmChain, PromptTemplate, StreamEvent};
use futures::StreamExt;
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TRANSLATION_TEMPLATE: &str = "
Your are a professional blog translator, translate an HTML AWS blog segment from {sourceLanguage} to {targetLanguage}.
{sourceLanguage} text: {content}
{targetLanguage} text:
";

// region:    --- Unary

#[tokio::test]
async fn test_claude_v1_invoke_end_to_end() -> TestResult<()> {
	init_tracing();
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-v1/invoke"))
		.and(body_json(json!({
			"prompt": "Lambda function are serverless",
			"max_tokens_to_sample": 200
		})))
		.and(header_exists("authorization"))
		.and(header_exists("x-amz-date"))
		.and(header_exists("x-amz-content-sha256"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!({
					"completion": " Les fonctions Lambda sont sans serveur",
					"stop_reason": "stop_sequence"
				}))
				.insert_header("x-amzn-requestid", "req-claude-1"),
		)
		.expect(1)
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "anthropic.claude-v1"))?;
	assert!(!endpoint.is_streaming());

	let res = endpoint.exec_generate("Lambda function are serverless").await?;

	assert_eq!(res.text, " Les fonctions Lambda sont sans serveur");
	assert_eq!(res.stop_reason.as_deref(), Some("stop_sequence"));
	assert_eq!(res.request_id.as_deref(), Some("req-claude-1"));

	// -- No stream-mode headers on the unary call.
	let requests = server.received_requests().await.ok_or("should record requests")?;
	assert_eq!(requests.len(), 1);
	let accept = requests[0].headers.get("accept").ok_or("should have accept")?.to_str()?;
	assert_ne!(accept, EVENT_STREAM_CONTENT_TYPE);
	let authorization = requests[0].headers.get("authorization").ok_or("should have authorization")?.to_str()?;
	assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
	assert!(authorization.contains("/us-east-1/bedrock/aws4_request"));

	Ok(())
}

#[tokio::test]
async fn test_invoke_returns_raw_body() -> TestResult<()> {
	let server = MockServer::start().await;
	let raw = json!({
		"inputTextTokenCount": 5,
		"results": [{"tokenCount": 3, "outputText": "Bonjour", "completionReason": "FINISH"}]
	});

	Mock::given(method("POST"))
		.and(path("/model/amazon.titan-tg1-large/invoke"))
		.respond_with(ResponseTemplate::new(200).set_body_json(raw.clone()))
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "amazon.titan-tg1-large").with_stream(false))?;

	let response = endpoint.invoke("Hello").await?;
	let body: serde_json::Value = serde_json::from_slice(&response.body)?;
	assert_eq!(body, raw);

	let res = endpoint.exec_generate("Hello").await?;
	assert_eq!(res.text, "Bonjour");
	assert_eq!(res.stop_reason.as_deref(), Some("FINISH"));

	Ok(())
}

#[tokio::test]
async fn test_custom_content_handler_both_directions() -> TestResult<()> {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-v1/invoke"))
		.and(body_json(json!({"prompt": "Hi", "maxTokens": 10})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"completions": [{"data": {"text": "X"}}]})))
		.expect(1)
		.mount(&server)
		.await;

	let config = mock_config(&server.uri(), "anthropic.claude-v1")
		.with_content_handler(JsonPromptContentHandler)
		.with_model_kwarg("maxTokens", 10);
	let endpoint = BedrockEndpoint::new(config)?;

	assert_eq!(endpoint.generate("Hi").await?, "X");

	Ok(())
}

#[tokio::test]
async fn test_bearer_token_auth() -> TestResult<()> {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-v2/invoke"))
		.and(header("authorization", "Bearer bedrock-api-key"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"completion": "ok", "stop_reason": null})))
		.expect(1)
		.mount(&server)
		.await;

	let config = mock_config(&server.uri(), "anthropic.claude-v2")
		.with_auth(AuthData::BearerToken("bedrock-api-key".to_string()));
	let res = BedrockEndpoint::new(config)?.exec_generate("Hi").await?;

	assert_eq!(res.text, "ok");
	assert_eq!(res.stop_reason, None);

	Ok(())
}

// endregion: --- Unary

// region:    --- Streaming

#[tokio::test]
async fn test_titan_stream_accumulates_text() -> TestResult<()> {
	init_tracing();
	let server = MockServer::start().await;
	let body = event_stream_body(&[
		chunk_frame(&json!({"outputText": "Les fonctions", "index": 0, "completionReason": null})),
		chunk_frame(&json!({"outputText": " Lambda", "index": 0, "completionReason": null})),
		chunk_frame(&json!({"outputText": " sont sans serveur", "index": 0, "completionReason": "FINISH"})),
	]);

	Mock::given(method("POST"))
		.and(path("/model/amazon.titan-tg1-large/invoke-with-response-stream"))
		.and(header("accept", EVENT_STREAM_CONTENT_TYPE))
		.and(header("x-amzn-bedrock-save", "true"))
		.and(body_json(json!({
			"inputText": "Translate",
			"textGenerationConfig": {"maxTokenCount": 4000, "temperature": 0.0, "stopSequences": []}
		})))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_raw(body, EVENT_STREAM_CONTENT_TYPE)
				.insert_header("x-amzn-requestid", "req-titan-1"),
		)
		.expect(1)
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "amazon.titan-tg1-large"))?;
	assert!(endpoint.is_streaming());

	let res = endpoint.exec_generate("Translate").await?;

	assert_eq!(res.text, "Les fonctions Lambda sont sans serveur");
	assert_eq!(res.stop_reason.as_deref(), Some("FINISH"));
	assert_eq!(res.request_id.as_deref(), Some("req-titan-1"));

	Ok(())
}

#[tokio::test]
async fn test_claude_instant_stream_events() -> TestResult<()> {
	let server = MockServer::start().await;
	let body = event_stream_body(&[
		chunk_frame(&json!({"completion": " Bon", "stop_reason": null})),
		chunk_frame(&json!({"completion": "jour", "stop_reason": "stop_sequence"})),
	]);

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-instant-v1/invoke-with-response-stream"))
		.and(header("content-type", "application/json"))
		.respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENT_STREAM_CONTENT_TYPE))
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "anthropic.claude-instant-v1"))?;
	let mut stream = endpoint.invoke_stream("Hello").await?.stream;

	let mut chunks = Vec::new();
	let mut end = None;
	while let Some(event) = stream.next().await {
		match event? {
			StreamEvent::Start => assert!(chunks.is_empty()),
			StreamEvent::Chunk(chunk) => chunks.push(chunk),
			StreamEvent::End(stream_end) => end = Some(stream_end),
		}
	}

	assert_eq!(
		chunks,
		vec![
			StreamChunk {
				text: " Bon".to_string(),
				stop_reason: None
			},
			StreamChunk {
				text: "jour".to_string(),
				stop_reason: Some("stop_sequence".to_string())
			},
		]
	);
	let end = end.ok_or("should have an end event")?;
	assert_eq!(end.captured_text, " Bonjour");

	Ok(())
}

#[tokio::test]
async fn test_single_mode_model_forced_to_stream() -> TestResult<()> {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-v1/invoke-with-response-stream"))
		.and(header("accept", EVENT_STREAM_CONTENT_TYPE))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_raw(event_stream_body(&[chunk_frame(&json!({"completion": "hi"}))]), EVENT_STREAM_CONTENT_TYPE),
		)
		.expect(1)
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "anthropic.claude-v1").with_stream(true))?;

	assert_eq!(endpoint.generate("Hello").await?, "hi");

	Ok(())
}

#[tokio::test]
async fn test_stream_exception_propagates() -> TestResult<()> {
	let server = MockServer::start().await;
	let body = event_stream_body(&[
		chunk_frame(&json!({"completion": "partial", "stop_reason": null})),
		exception_frame("modelStreamErrorException", "Model stream failed"),
	]);

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-instant-v1/invoke-with-response-stream"))
		.respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENT_STREAM_CONTENT_TYPE))
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "anthropic.claude-instant-v1"))?;

	let Err(err) = endpoint.generate("Hello").await else {
		return Err("generate should fail on a stream exception".into());
	};

	assert!(err.is_decode_failure());
	match err {
		Error::StreamException {
			exception_type,
			message,
		} => {
			assert_eq!(exception_type, "modelStreamErrorException");
			assert_eq!(message, "Model stream failed");
		}
		other => return Err(format!("unexpected error {other}").into()),
	}

	Ok(())
}

// endregion: --- Streaming

// region:    --- Failures

#[tokio::test]
async fn test_http_error_status_propagates() -> TestResult<()> {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-v1/invoke"))
		.respond_with(
			ResponseTemplate::new(403)
				.set_body_json(json!({"message": "The security token included in the request is invalid."})),
		)
		.expect(1)
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "anthropic.claude-v1"))?;

	let Err(err) = endpoint.generate("Hello").await else {
		return Err("generate should fail on 403".into());
	};

	assert!(err.is_transport_failure());
	match err {
		Error::Webc(webc::Error::ResponseFailedStatus { status, body, .. }) => {
			assert_eq!(status.as_u16(), 403);
			assert!(body.contains("security token"));
		}
		other => return Err(format!("unexpected error {other}").into()),
	}

	Ok(())
}

#[tokio::test]
async fn test_unsupported_model_sends_nothing() -> TestResult<()> {
	let server = MockServer::start().await;

	let result = BedrockEndpoint::new(mock_config(&server.uri(), "cohere.command-text-v14"));

	assert!(matches!(result, Err(Error::UnsupportedModel { ref model }) if model == "cohere.command-text-v14"));
	let requests = server.received_requests().await.ok_or("should record requests")?;
	assert!(requests.is_empty());

	Ok(())
}

// endregion: --- Failures

// region:    --- Chain

#[tokio::test]
async fn test_translation_chain() -> TestResult<()> {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/model/anthropic.claude-v1/invoke"))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(json!({
				"completion": " Les fonctions Lambda sont sans serveur",
				"stop_reason": "stop_sequence"
			})),
		)
		.expect(1)
		.mount(&server)
		.await;

	let endpoint = BedrockEndpoint::new(mock_config(&server.uri(), "anthropic.claude-v1"))?;
	let prompt = PromptTemplate::new(
		TRANSLATION_TEMPLATE,
		["content", "sourceLanguage", "targetLanguage", "guidelines"],
	);
	let chain = LlmChain::new(endpoint, prompt);

	let variables = HashMap::from([
		("content".to_string(), "Lambda function are serverless".to_string()),
		("sourceLanguage".to_string(), "en-US".to_string()),
		("targetLanguage".to_string(), "fr-FR".to_string()),
	]);
	let output = chain.call(&variables).await?;

	assert_eq!(output.text, " Les fonctions Lambda sont sans serveur");

	let requests = server.received_requests().await.ok_or("should record requests")?;
	let sent: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
	let sent_prompt = sent["prompt"].as_str().ok_or("should have prompt")?;
	assert!(sent_prompt.contains("from en-US to fr-FR"));
	assert!(sent_prompt.contains("en-US text: Lambda function are serverless"));

	Ok(())
}

// endregion: --- Chain
