use crate::{resolver, webc};
use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	// -- Model
	UnsupportedModel {
		model: String,
	},

	// -- Response
	ResponseTextNotFound {
		path: &'static str,
	},

	// -- Event stream
	StreamChunkMarkerNotFound,
	StreamChunkBase64 {
		cause: base64::DecodeError,
	},
	StreamFrameLength {
		total_length: u32,
		headers_length: u32,
	},
	StreamPreludeChecksum {
		expected: u32,
		actual: u32,
	},
	StreamMessageChecksum {
		expected: u32,
		actual: u32,
	},
	StreamHeaderMalformed {
		detail: String,
	},
	StreamTruncated {
		remaining: usize,
	},
	StreamException {
		exception_type: String,
		message: String,
	},

	// -- Template
	TemplateVariableMissing {
		name: String,
	},
	TemplateUnclosedPlaceholder {
		position: usize,
	},

	// -- Internal
	Internal(String),

	// -- Modules
	#[from]
	Resolver(resolver::Error),
	#[from]
	Webc(webc::Error),

	// -- Externals
	#[from]
	SerdeJson(serde_json::Error),
}

/// Classification
impl Error {
	/// True for malformed or unexpected response content (unary body or event-stream frame).
	pub fn is_decode_failure(&self) -> bool {
		matches!(
			self,
			Error::ResponseTextNotFound { .. }
				| Error::StreamChunkMarkerNotFound
				| Error::StreamChunkBase64 { .. }
				| Error::StreamFrameLength { .. }
				| Error::StreamPreludeChecksum { .. }
				| Error::StreamMessageChecksum { .. }
				| Error::StreamHeaderMalformed { .. }
				| Error::StreamTruncated { .. }
				| Error::StreamException { .. }
				| Error::SerdeJson(_)
		)
	}

	/// True for network errors and non-success HTTP statuses from the web client.
	pub fn is_transport_failure(&self) -> bool {
		matches!(self, Error::Webc(_))
	}
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
