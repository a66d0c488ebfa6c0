use derive_more::{Display, From};
use reqwest::StatusCode;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	ResponseFailedStatus {
		status: StatusCode,
		request_id: Option<String>,
		body: String,
	},

	// -- Externals
	#[from]
	Reqwest(reqwest::Error),
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
