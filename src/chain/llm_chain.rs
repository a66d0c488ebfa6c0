use crate::Result;
use crate::chain::PromptTemplate;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// A text-in, text-out model the chain can call.
pub trait Llm: Send + Sync {
	fn llm_type(&self) -> &'static str;

	fn call(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
	pub text: String,
}

/// Formats a `PromptTemplate` and sends the result to one `Llm`.
#[derive(Debug, Clone)]
pub struct LlmChain<L: Llm> {
	llm: L,
	prompt: PromptTemplate,
}

impl<L: Llm> LlmChain<L> {
	pub fn new(llm: L, prompt: PromptTemplate) -> Self {
		Self { llm, prompt }
	}

	pub fn llm(&self) -> &L {
		&self.llm
	}

	pub fn prompt(&self) -> &PromptTemplate {
		&self.prompt
	}

	pub async fn call(&self, variables: &HashMap<String, String>) -> Result<ChainOutput> {
		let prompt = self.prompt.format(variables)?;
		debug!(llm_type = self.llm.llm_type(), prompt_len = prompt.len(), "chain call");
		let text = self.llm.call(&prompt).await?;
		Ok(ChainOutput { text })
	}
}

// region:    --- Tests


// endregion: --- Tests
