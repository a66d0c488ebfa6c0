use crate::resolver::{Error, Result};

pub const AWS_ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";
pub const AWS_BEARER_TOKEN_BEDROCK_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// `AuthData` specifies where the credentials used to sign a Bedrock request come from.
#[derive(Clone, Default)]
pub enum AuthData {
	/// SigV4 keys from the standard `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
	/// and optional `AWS_SESSION_TOKEN` environment variables.
	#[default]
	AwsEnv,

	/// SigV4 keys given directly.
	AwsKeys {
		access_key_id: String,
		secret_access_key: String,
		session_token: Option<String>,
	},

	/// Bedrock API key read from the named environment variable, sent as `Authorization: Bearer`.
	BearerTokenFromEnv(String),

	/// Bedrock API key value, sent as `Authorization: Bearer`.
	BearerToken(String),
}

/// Constructors
impl AuthData {
	/// Create a new `AuthData` from an access key pair.
	pub fn from_keys(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
		AuthData::AwsKeys {
			access_key_id: access_key_id.into(),
			secret_access_key: secret_access_key.into(),
			session_token: None,
		}
	}

	/// Create a new `AuthData` for a Bedrock API key in `AWS_BEARER_TOKEN_BEDROCK`.
	pub fn bearer_from_env() -> Self {
		AuthData::BearerTokenFromEnv(AWS_BEARER_TOKEN_BEDROCK_ENV.to_string())
	}
}

/// Resolved credential material.
#[derive(Clone)]
pub enum ResolvedAuth {
	SigV4 {
		access_key_id: String,
		secret_access_key: String,
		session_token: Option<String>,
	},
	Bearer(String),
}

/// Getters
impl AuthData {
	/// Resolve the credential material, reading the environment when needed.
	pub fn resolve(&self) -> Result<ResolvedAuth> {
		match self {
			AuthData::AwsEnv => Ok(ResolvedAuth::SigV4 {
				access_key_id: env_value(AWS_ACCESS_KEY_ID_ENV)?,
				secret_access_key: env_value(AWS_SECRET_ACCESS_KEY_ENV)?,
				session_token: std::env::var(AWS_SESSION_TOKEN_ENV).ok(),
			}),
			AuthData::AwsKeys {
				access_key_id,
				secret_access_key,
				session_token,
			} => Ok(ResolvedAuth::SigV4 {
				access_key_id: access_key_id.clone(),
				secret_access_key: secret_access_key.clone(),
				session_token: session_token.clone(),
			}),
			AuthData::BearerTokenFromEnv(env_name) => Ok(ResolvedAuth::Bearer(env_value(env_name)?)),
			AuthData::BearerToken(token) => Ok(ResolvedAuth::Bearer(token.clone())),
		}
	}
}

fn env_value(env_name: &str) -> Result<String> {
	std::env::var(env_name).map_err(|_| Error::CredentialEnvNotFound {
		env_name: env_name.to_string(),
	})
}

// region:    --- AuthData Std Impls

// Implement Debug to redact sensitive information.
impl std::fmt::Debug for AuthData {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AuthData::AwsEnv => write!(f, "AuthData::AwsEnv"),
			// NOTE: The access key id is redacted as well since it identifies the account.
			AuthData::AwsKeys { .. } => write!(f, "AuthData::AwsKeys(REDACTED)"),
			AuthData::BearerTokenFromEnv(env_name) => write!(f, "AuthData::BearerTokenFromEnv({env_name})"),
			AuthData::BearerToken(_) => write!(f, "AuthData::BearerToken(REDACTED)"),
		}
	}
}

impl std::fmt::Debug for ResolvedAuth {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ResolvedAuth::SigV4 { .. } => write!(f, "ResolvedAuth::SigV4(REDACTED)"),
			ResolvedAuth::Bearer(_) => write!(f, "ResolvedAuth::Bearer(REDACTED)"),
		}
	}
}

// endregion: --- AuthData Std Impls

// region:    --- Tests


// endregion: --- Tests
