//! AWS event-stream framing (`application/vnd.amazon.eventstream`).
//!
//! Wire layout of one message, all integers big-endian:
//!
//! ```text
//! | total_len u32 | headers_len u32 | prelude_crc u32 | headers .. | payload .. | message_crc u32 |
//! ```
//!
//! `prelude_crc` covers the first 8 bytes, `message_crc` everything before it. Both are CRC-32 (IEEE).
//! See: https://docs.aws.amazon.com/transcribe/latest/dg/event-stream.html

use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Deserialize;
use serde_json::Value;

const PRELUDE_LEN: usize = 12;
const MESSAGE_CRC_LEN: usize = 4;
const MIN_MESSAGE_LEN: usize = PRELUDE_LEN + MESSAGE_CRC_LEN;
/// Service-side limit for one event-stream message.
const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

const CHUNK_MARKER: &[u8] = br#"{"bytes":""#;

// region:    --- Message

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
	Bool(bool),
	Byte(i8),
	Int16(i16),
	Int32(i32),
	Int64(i64),
	ByteArray(Bytes),
	String(String),
	/// Milliseconds since the Unix epoch.
	Timestamp(i64),
	Uuid([u8; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventStreamHeader {
	pub name: String,
	pub value: HeaderValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventStreamMessage {
	pub headers: Vec<EventStreamHeader>,
	pub payload: Bytes,
}

impl EventStreamMessage {
	pub fn header(&self, name: &str) -> Option<&HeaderValue> {
		self.headers.iter().find(|h| h.name == name).map(|h| &h.value)
	}

	pub fn header_str(&self, name: &str) -> Option<&str> {
		match self.header(name)? {
			HeaderValue::String(value) => Some(value.as_str()),
			_ => None,
		}
	}

	/// `:message-type`, normally `event`, `exception` or `error`.
	pub fn message_type(&self) -> Option<&str> {
		self.header_str(":message-type")
	}

	pub fn event_type(&self) -> Option<&str> {
		self.header_str(":event-type")
	}

	pub fn exception_type(&self) -> Option<&str> {
		self.header_str(":exception-type").or_else(|| self.header_str(":error-code"))
	}

	/// Serialize into one wire frame.
	///
	/// Fails when a header name exceeds 255 bytes or a string/bytes value exceeds 65535 bytes.
	pub fn encode(&self) -> Result<Bytes> {
		let mut headers = BytesMut::new();
		for header in &self.headers {
			let name_len = u8::try_from(header.name.len()).map_err(|_| Error::StreamHeaderMalformed {
				detail: format!("header name too long ({} bytes)", header.name.len()),
			})?;
			headers.put_u8(name_len);
			headers.put_slice(header.name.as_bytes());
			match &header.value {
				HeaderValue::Bool(true) => headers.put_u8(0),
				HeaderValue::Bool(false) => headers.put_u8(1),
				HeaderValue::Byte(v) => {
					headers.put_u8(2);
					headers.put_i8(*v);
				}
				HeaderValue::Int16(v) => {
					headers.put_u8(3);
					headers.put_i16(*v);
				}
				HeaderValue::Int32(v) => {
					headers.put_u8(4);
					headers.put_i32(*v);
				}
				HeaderValue::Int64(v) => {
					headers.put_u8(5);
					headers.put_i64(*v);
				}
				HeaderValue::ByteArray(v) => {
					headers.put_u8(6);
					headers.put_u16(value_len(&header.name, v.len())?);
					headers.put_slice(v);
				}
				HeaderValue::String(v) => {
					headers.put_u8(7);
					headers.put_u16(value_len(&header.name, v.len())?);
					headers.put_slice(v.as_bytes());
				}
				HeaderValue::Timestamp(v) => {
					headers.put_u8(8);
					headers.put_i64(*v);
				}
				HeaderValue::Uuid(v) => {
					headers.put_u8(9);
					headers.put_slice(v);
				}
			}
		}

		let total_len = MIN_MESSAGE_LEN + headers.len() + self.payload.len();
		if total_len > MAX_MESSAGE_LEN {
			return Err(Error::StreamFrameLength {
				total_length: u32::try_from(total_len).unwrap_or(u32::MAX),
				headers_length: headers.len() as u32,
			});
		}
		let mut frame = BytesMut::with_capacity(total_len);
		frame.put_u32(total_len as u32);
		frame.put_u32(headers.len() as u32);
		let prelude_crc = crc32(&frame[..8]);
		frame.put_u32(prelude_crc);
		frame.put_slice(&headers);
		frame.put_slice(&self.payload);
		let message_crc = crc32(&frame);
		frame.put_u32(message_crc);
		Ok(frame.freeze())
	}
}

fn value_len(name: &str, len: usize) -> Result<u16> {
	u16::try_from(len).map_err(|_| Error::StreamHeaderMalformed {
		detail: format!("header '{name}' value too long ({len} bytes)"),
	})
}

/// Build a `:message-type = event` message, the shape Bedrock uses for stream chunks.
pub fn event_message(event_type: &str, payload: impl Into<Bytes>) -> EventStreamMessage {
	EventStreamMessage {
		headers: vec![
			string_header(":event-type", event_type),
			string_header(":content-type", "application/json"),
			string_header(":message-type", "event"),
		],
		payload: payload.into(),
	}
}

fn string_header(name: &str, value: &str) -> EventStreamHeader {
	EventStreamHeader {
		name: name.to_string(),
		value: HeaderValue::String(value.to_string()),
	}
}

// endregion: --- Message

// region:    --- Decoder

/// Incremental frame reader. Bytes are pushed as they arrive; whole messages are pulled out.
/// A message may span any number of pushes, and one push may complete several messages.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
	buf: BytesMut,
}

impl EventStreamDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, chunk: &[u8]) {
		self.buf.extend_from_slice(chunk);
	}

	/// Bytes buffered that do not yet form a whole message.
	pub fn remaining(&self) -> usize {
		self.buf.len()
	}

	/// Next whole message, or `None` when more bytes are needed.
	pub fn next_message(&mut self) -> Result<Option<EventStreamMessage>> {
		if self.buf.len() < PRELUDE_LEN {
			return Ok(None);
		}

		let total_length = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
		let headers_length = u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]);
		let prelude_crc = u32::from_be_bytes([self.buf[8], self.buf[9], self.buf[10], self.buf[11]]);

		let actual = crc32(&self.buf[..8]);
		if actual != prelude_crc {
			return Err(Error::StreamPreludeChecksum {
				expected: prelude_crc,
				actual,
			});
		}

		let total_len = total_length as usize;
		let headers_len = headers_length as usize;
		if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&total_len) || headers_len > total_len - MIN_MESSAGE_LEN {
			return Err(Error::StreamFrameLength {
				total_length,
				headers_length,
			});
		}

		if self.buf.len() < total_len {
			return Ok(None);
		}

		let mut frame = self.buf.split_to(total_len).freeze();

		let crc_offset = total_len - MESSAGE_CRC_LEN;
		let message_crc = u32::from_be_bytes([
			frame[crc_offset],
			frame[crc_offset + 1],
			frame[crc_offset + 2],
			frame[crc_offset + 3],
		]);
		let actual = crc32(&frame[..crc_offset]);
		if actual != message_crc {
			return Err(Error::StreamMessageChecksum {
				expected: message_crc,
				actual,
			});
		}

		frame.advance(PRELUDE_LEN);
		let headers_bytes = frame.split_to(headers_len);
		let payload = frame.split_to(crc_offset - PRELUDE_LEN - headers_len);
		let headers = parse_headers(headers_bytes)?;

		Ok(Some(EventStreamMessage { headers, payload }))
	}
}

fn parse_headers(mut bytes: Bytes) -> Result<Vec<EventStreamHeader>> {
	let mut headers = Vec::new();

	while bytes.has_remaining() {
		let name_len = bytes.get_u8() as usize;
		ensure_remaining(&bytes, name_len, "header name")?;
		let name = String::from_utf8(bytes.split_to(name_len).to_vec()).map_err(|_| Error::StreamHeaderMalformed {
			detail: "header name is not utf-8".to_string(),
		})?;

		ensure_remaining(&bytes, 1, "header value type")?;
		let value = match bytes.get_u8() {
			0 => HeaderValue::Bool(true),
			1 => HeaderValue::Bool(false),
			2 => {
				ensure_remaining(&bytes, 1, &name)?;
				HeaderValue::Byte(bytes.get_i8())
			}
			3 => {
				ensure_remaining(&bytes, 2, &name)?;
				HeaderValue::Int16(bytes.get_i16())
			}
			4 => {
				ensure_remaining(&bytes, 4, &name)?;
				HeaderValue::Int32(bytes.get_i32())
			}
			5 => {
				ensure_remaining(&bytes, 8, &name)?;
				HeaderValue::Int64(bytes.get_i64())
			}
			6 => {
				ensure_remaining(&bytes, 2, &name)?;
				let len = bytes.get_u16() as usize;
				ensure_remaining(&bytes, len, &name)?;
				HeaderValue::ByteArray(bytes.split_to(len))
			}
			7 => {
				ensure_remaining(&bytes, 2, &name)?;
				let len = bytes.get_u16() as usize;
				ensure_remaining(&bytes, len, &name)?;
				let value = String::from_utf8(bytes.split_to(len).to_vec()).map_err(|_| Error::StreamHeaderMalformed {
					detail: format!("header '{name}' value is not utf-8"),
				})?;
				HeaderValue::String(value)
			}
			8 => {
				ensure_remaining(&bytes, 8, &name)?;
				HeaderValue::Timestamp(bytes.get_i64())
			}
			9 => {
				ensure_remaining(&bytes, 16, &name)?;
				let mut uuid = [0u8; 16];
				bytes.copy_to_slice(&mut uuid);
				HeaderValue::Uuid(uuid)
			}
			other => {
				return Err(Error::StreamHeaderMalformed {
					detail: format!("header '{name}' has unknown value type {other}"),
				});
			}
		};

		headers.push(EventStreamHeader { name, value });
	}

	Ok(headers)
}

fn ensure_remaining(bytes: &Bytes, needed: usize, what: &str) -> Result<()> {
	if bytes.remaining() < needed {
		return Err(Error::StreamHeaderMalformed {
			detail: format!("{what}: needs {needed} bytes, {} left", bytes.remaining()),
		});
	}
	Ok(())
}

// endregion: --- Decoder

// region:    --- Chunk Payload

#[derive(Deserialize)]
struct ChunkPayload {
	bytes: String,
}

/// Decode the JSON fragment carried by a `chunk` event payload.
///
/// The payload is `{"bytes":"<base64 json>"}`, possibly with extra fields (such as `"p"` padding).
/// Anything before the `{"bytes":"` marker and after the closing brace is ignored.
pub fn decode_chunk_payload(payload: &[u8]) -> Result<Value> {
	let start = payload
		.windows(CHUNK_MARKER.len())
		.position(|window| window == CHUNK_MARKER)
		.ok_or(Error::StreamChunkMarkerNotFound)?;

	let mut objects = serde_json::Deserializer::from_slice(&payload[start..]).into_iter::<ChunkPayload>();
	let chunk = match objects.next() {
		Some(chunk) => chunk?,
		None => return Err(Error::StreamChunkMarkerNotFound),
	};

	let json_bytes = BASE64
		.decode(chunk.bytes.as_bytes())
		.map_err(|cause| Error::StreamChunkBase64 { cause })?;

	Ok(serde_json::from_slice(&json_bytes)?)
}

// endregion: --- Chunk Payload

// region:    --- CRC-32

const CRC32_TABLE: [u32; 256] = crc32_table();

const fn crc32_table() -> [u32; 256] {
	let mut table = [0u32; 256];
	let mut i = 0;
	while i < 256 {
		let mut crc = i as u32;
		let mut bit = 0;
		while bit < 8 {
			crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
			bit += 1;
		}
		table[i] = crc;
		i += 1;
	}
	table
}

/// CRC-32 (IEEE 802.3, reflected), as used by event-stream prelude and message checksums.
pub fn crc32(data: &[u8]) -> u32 {
	let mut crc = 0xFFFF_FFFFu32;
	for &byte in data {
		crc = CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
	}
	!crc
}

// endregion: --- CRC-32

// region:    --- Tests


// endregion: --- Tests
