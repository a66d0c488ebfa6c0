use derive_more::Display;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display)]
#[display("{self:?}")]
pub enum Error {
	CredentialEnvNotFound { env_name: String },
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
