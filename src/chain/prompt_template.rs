use crate::{Error, Result};
use std::collections::HashMap;

/// A prompt with `{name}` placeholders. `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
	template: String,
	input_variables: Vec<String>,
}

impl PromptTemplate {
	pub fn new<I, S>(template: impl Into<String>, input_variables: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			template: template.into(),
			input_variables: input_variables.into_iter().map(Into::into).collect(),
		}
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	/// Variables callers are expected to provide. Not every one has to appear in the template.
	pub fn input_variables(&self) -> &[String] {
		&self.input_variables
	}

	/// Render with `variables`. Extra variables are ignored; a placeholder without a value is an error.
	pub fn format(&self, variables: &HashMap<String, String>) -> Result<String> {
		let mut out = String::with_capacity(self.template.len());
		let mut chars = self.template.char_indices().peekable();

		while let Some((idx, c)) = chars.next() {
			match c {
				'{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
					chars.next();
					out.push('{');
				}
				'}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
					chars.next();
					out.push('}');
				}
				'{' => {
					let mut name = String::new();
					let mut closed = false;
					for (_, c) in chars.by_ref() {
						if c == '}' {
							closed = true;
							break;
						}
						name.push(c);
					}
					if !closed {
						return Err(Error::TemplateUnclosedPlaceholder { position: idx });
					}
					let name = name.trim();
					let value = variables
						.get(name)
						.ok_or_else(|| Error::TemplateVariableMissing { name: name.to_string() })?;
					out.push_str(value);
				}
				c => out.push(c),
			}
		}

		Ok(out)
	}
}

// region:    --- Tests


// endregion: --- Tests
