//! Translate a blog segment through a prompt-template chain backed by a Bedrock model.
//!
//! Credentials come from `AWS_BEARER_TOKEN_BEDROCK` when set, otherwise from the standard
//! `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` variables.
//!
//! cargo run --example c00-translate

use bedrock_endpoint::{AuthData, BedrockConfig, BedrockEndpoint, LlmChain, PromptTemplate};
use std::collections::HashMap;

const TEMPLATE: &str = "
Your are a professional blog translator, translate an HTML AWS blog segment from {sourceLanguage} to {targetLanguage}.
{sourceLanguage} text: {content}
{targetLanguage} text:
";

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_MODEL: &str = "anthropic.claude-v1"; // or amazon.titan-tg1-large

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let region = std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
	let model = std::env::var("BEDROCK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
	let auth = if std::env::var("AWS_BEARER_TOKEN_BEDROCK").is_ok() {
		AuthData::bearer_from_env()
	} else {
		AuthData::AwsEnv
	};

	let mut config = BedrockConfig::new(region, model).with_auth(auth);
	if let Ok(role_arn) = std::env::var("BEDROCK_ROLE_ARN") {
		config = config.with_role_arn(role_arn);
	}

	let prompt = PromptTemplate::new(TEMPLATE, ["content", "sourceLanguage", "targetLanguage", "guidelines"]);
	let chain = LlmChain::new(BedrockEndpoint::new(config)?, prompt);

	let variables = HashMap::from([
		("content".to_string(), "Lambda function are serverless".to_string()),
		("sourceLanguage".to_string(), "en-US".to_string()),
		("targetLanguage".to_string(), "fr-FR".to_string()),
	]);

	println!("\n--- Translating with {}\n", chain.llm().model());
	let output = chain.call(&variables).await?;
	println!("{}", output.text.trim());

	Ok(())
}
