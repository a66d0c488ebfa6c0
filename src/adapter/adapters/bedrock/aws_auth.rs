//! AWS Signature Version 4 authentication for Bedrock API
//!
//! This implements the AWS SigV4 signing process for HTTP requests.
//! See: https://docs.aws.amazon.com/general/latest/gr/sigv4_signing.html

use crate::resolver::{AuthData, ResolvedAuth};
use crate::{Error, Headers, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const BEDROCK_SERVICE_NAME: &str = "bedrock";

/// Adds authentication headers to an outgoing request.
pub trait RequestSigner: Send + Sync {
	/// Sign a request and return the full header set to send (input headers included).
	fn sign_request(&self, method: &str, url: &str, headers: &Headers, payload: &[u8]) -> Result<Headers>;
}

/// Build the signer matching `auth` for `region`.
pub fn signer_for(auth: &AuthData, region: &str) -> Result<Box<dyn RequestSigner>> {
	let signer: Box<dyn RequestSigner> = match auth.resolve()? {
		ResolvedAuth::SigV4 {
			access_key_id,
			secret_access_key,
			session_token,
		} => Box::new(AwsSigV4Signer::new(AwsCredentials {
			access_key_id,
			secret_access_key,
			session_token,
			region: region.to_string(),
		})),
		ResolvedAuth::Bearer(token) => Box::new(BearerTokenSigner::new(token)),
	};
	Ok(signer)
}

// region:    --- Credentials

/// AWS Credentials scoped to one region
#[derive(Clone)]
pub struct AwsCredentials {
	pub access_key_id: String,
	pub secret_access_key: String,
	pub session_token: Option<String>,
	pub region: String,
}

impl AwsCredentials {
	pub fn new(
		access_key_id: impl Into<String>,
		secret_access_key: impl Into<String>,
		region: impl Into<String>,
	) -> Self {
		Self {
			access_key_id: access_key_id.into(),
			secret_access_key: secret_access_key.into(),
			session_token: None,
			region: region.into(),
		}
	}

	pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
		self.session_token = Some(session_token.into());
		self
	}
}

impl std::fmt::Debug for AwsCredentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AwsCredentials")
			.field("access_key_id", &"REDACTED")
			.field("secret_access_key", &"REDACTED")
			.field("session_token", &self.session_token.as_ref().map(|_| "REDACTED"))
			.field("region", &self.region)
			.finish()
	}
}

// endregion: --- Credentials

// region:    --- Bearer Signer

/// Bedrock API key authentication (`Authorization: Bearer`).
pub struct BearerTokenSigner {
	token: String,
}

impl BearerTokenSigner {
	pub fn new(token: impl Into<String>) -> Self {
		Self { token: token.into() }
	}
}

impl RequestSigner for BearerTokenSigner {
	fn sign_request(&self, _method: &str, _url: &str, headers: &Headers, _payload: &[u8]) -> Result<Headers> {
		let mut result_headers = headers.clone();
		result_headers.insert("authorization", format!("Bearer {}", self.token));
		Ok(result_headers)
	}
}

// endregion: --- Bearer Signer

// region:    --- SigV4 Signer

/// AWS SigV4 signer for Bedrock requests
pub struct AwsSigV4Signer {
	credentials: AwsCredentials,
	service: String,
}

impl AwsSigV4Signer {
	/// Create a new signer for Bedrock
	pub fn new(credentials: AwsCredentials) -> Self {
		Self {
			credentials,
			service: BEDROCK_SERVICE_NAME.to_string(),
		}
	}

	/// Sign as of `now`. `sign_request` uses the current time.
	pub fn sign_request_at(
		&self,
		method: &str,
		url: &str,
		headers: &Headers,
		payload: &[u8],
		now: DateTime<Utc>,
	) -> Result<Headers> {
		let timestamp = format_timestamp(now);
		let date = &timestamp[..8];

		let parsed_url = parse_url(url)?;

		// -- Headers covered by the signature
		let mut signed_headers = headers.clone();
		signed_headers.insert("host", parsed_url.host.clone());
		signed_headers.insert("x-amz-date", timestamp.clone());

		if let Some(ref token) = self.credentials.session_token {
			signed_headers.insert("x-amz-security-token", token.clone());
		}

		let payload_hash = sha256_hex(payload);
		signed_headers.insert("x-amz-content-sha256", payload_hash.clone());

		let canonical_request = create_canonical_request(method, &parsed_url, &signed_headers, &payload_hash);

		let credential_scope = format!("{}/{}/{}/aws4_request", date, self.credentials.region, self.service);
		let string_to_sign = format!(
			"AWS4-HMAC-SHA256\n{}\n{}\n{}",
			timestamp,
			credential_scope,
			sha256_hex(canonical_request.as_bytes())
		);

		let signing_key = self.derive_signing_key(date)?;
		let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

		let signed_header_names: Vec<&str> = signed_headers.names().collect();
		let authorization = format!(
			"AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
			self.credentials.access_key_id,
			credential_scope,
			signed_header_names.join(";"),
			signature
		);

		let mut result_headers = signed_headers;
		result_headers.insert("authorization", authorization);

		Ok(result_headers)
	}

	fn derive_signing_key(&self, date: &str) -> Result<[u8; 32]> {
		let k_secret = format!("AWS4{}", self.credentials.secret_access_key);
		let k_date = hmac_sha256(k_secret.as_bytes(), date.as_bytes())?;
		let k_region = hmac_sha256(&k_date, self.credentials.region.as_bytes())?;
		let k_service = hmac_sha256(&k_region, self.service.as_bytes())?;
		hmac_sha256(&k_service, b"aws4_request")
	}
}

impl RequestSigner for AwsSigV4Signer {
	fn sign_request(&self, method: &str, url: &str, headers: &Headers, payload: &[u8]) -> Result<Headers> {
		self.sign_request_at(method, url, headers, payload, Utc::now())
	}
}

fn create_canonical_request(method: &str, parsed_url: &ParsedUrl, headers: &Headers, payload_hash: &str) -> String {
	// NOTE: The path is already percent-encoded once in the URL; encoding it again here is the
	//       double encoding SigV4 expects for every service but S3.
	let canonical_uri = if parsed_url.path.is_empty() {
		"/".to_string()
	} else {
		uri_encode(&parsed_url.path, false)
	};

	let canonical_query = parsed_url
		.query
		.as_ref()
		.map(|q| {
			let mut params: Vec<(String, String)> = q
				.split('&')
				.filter_map(|p| {
					let mut parts = p.splitn(2, '=');
					let key = parts.next()?;
					let value = parts.next().unwrap_or("");
					Some((uri_encode(key, true), uri_encode(value, true)))
				})
				.collect();
			params.sort();
			params
				.into_iter()
				.map(|(k, v)| format!("{}={}", k, v))
				.collect::<Vec<_>>()
				.join("&")
		})
		.unwrap_or_default();

	let canonical_headers: String = headers.iter().map(|(k, v)| format!("{}:{}\n", k, v.trim())).collect();

	let signed_headers = headers.names().collect::<Vec<_>>().join(";");

	format!(
		"{}\n{}\n{}\n{}\n{}\n{}",
		method, canonical_uri, canonical_query, canonical_headers, signed_headers, payload_hash
	)
}

// endregion: --- SigV4 Signer

// region:    --- URL Parsing

struct ParsedUrl {
	host: String,
	path: String,
	query: Option<String>,
}

fn parse_url(url: &str) -> Result<ParsedUrl> {
	let url = url
		.strip_prefix("https://")
		.or_else(|| url.strip_prefix("http://"))
		.unwrap_or(url);

	let (host_and_path, query) = match url.split_once('?') {
		Some((host_and_path, query)) => (host_and_path, Some(query.to_string())),
		None => (url, None),
	};

	let (host, path) = match host_and_path.find('/') {
		Some(idx) => (&host_and_path[..idx], host_and_path[idx..].to_string()),
		None => (host_and_path, "/".to_string()),
	};

	if host.is_empty() {
		return Err(Error::Internal(format!("Cannot sign request, no host in url '{url}'")));
	}

	Ok(ParsedUrl {
		host: host.to_string(),
		path,
		query,
	})
}

// endregion: --- URL Parsing

// region:    --- Crypto Helpers

fn sha256_hex(data: &[u8]) -> String {
	hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32]> {
	let mut mac = HmacSha256::new_from_slice(key)
		.map_err(|err| Error::Internal(format!("Cannot create HMAC key. Cause: {err}")))?;
	mac.update(data);
	Ok(mac.finalize().into_bytes().into())
}

// endregion: --- Crypto Helpers

// region:    --- Encoding Helpers

/// ISO8601 basic format: YYYYMMDD'T'HHMMSS'Z'
fn format_timestamp(now: DateTime<Utc>) -> String {
	now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Percent-encode a path segment for use in a request URL.
pub fn encode_path_segment(segment: &str) -> String {
	uri_encode(segment, true)
}

fn uri_encode(s: &str, encode_slash: bool) -> String {
	let mut result = String::new();
	for byte in s.bytes() {
		match byte {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
				result.push(byte as char);
			}
			b'/' if !encode_slash => {
				result.push('/');
			}
			_ => {
				result.push_str(&format!("%{:02X}", byte));
			}
		}
	}
	result
}

// endregion: --- Encoding Helpers
