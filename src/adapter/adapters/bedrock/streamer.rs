use crate::adapter::bedrock::{ContentHandler, EventStreamDecoder, EventStreamMessage, ModelFamily, decode_chunk_payload};
use crate::{Error, Result, webc};
use bytes::Bytes;
use futures::Stream;
use futures::stream::BoxStream;
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{trace, warn};

// region:    --- Events

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
	Start,
	Chunk(StreamChunk),
	End(StreamEnd),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
	pub text: String,
	pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamEnd {
	/// Concatenation of every chunk text, in arrival order.
	pub captured_text: String,
	/// Last stop reason reported by a chunk.
	pub stop_reason: Option<String>,
}

// endregion: --- Events

/// Turns the raw `invoke-with-response-stream` body into `StreamEvent`s.
///
/// Emits `Start`, one `Chunk` per `chunk` event, then `End` with the accumulated text.
/// After the first error the stream is finished.
pub struct BedrockStreamer {
	inner: BoxStream<'static, reqwest::Result<Bytes>>,
	decoder: EventStreamDecoder,
	family: ModelFamily,
	content_handler: Arc<dyn ContentHandler>,

	// -- Set by the poll_next
	started: bool,
	done: bool,
	captured_text: String,
	stop_reason: Option<String>,
}

impl BedrockStreamer {
	pub fn new(
		inner: BoxStream<'static, reqwest::Result<Bytes>>,
		family: ModelFamily,
		content_handler: Arc<dyn ContentHandler>,
	) -> Self {
		Self {
			inner,
			decoder: EventStreamDecoder::new(),
			family,
			content_handler,
			started: false,
			done: false,
			captured_text: String::new(),
			stop_reason: None,
		}
	}

	/// `Ok(Some(chunk))` for a chunk event, `Ok(None)` for events that carry no text.
	fn handle_message(&mut self, message: EventStreamMessage) -> Result<Option<StreamChunk>> {
		match message.message_type() {
			Some("exception") | Some("error") => {
				let exception_type = message.exception_type().unwrap_or("unknown").to_string();
				let message = exception_message(&message.payload);
				warn!(%exception_type, %message, "bedrock stream exception");
				Err(Error::StreamException {
					exception_type,
					message,
				})
			}
			_ if message.event_type() == Some("chunk") => {
				let fragment = decode_chunk_payload(&message.payload)?;
				let fragment_bytes = serde_json::to_vec(&fragment)?;
				let text = self.content_handler.transform_output(&fragment_bytes)?;
				let stop_reason = self.family.stop_reason(&fragment);

				self.captured_text.push_str(&text);
				if stop_reason.is_some() {
					self.stop_reason.clone_from(&stop_reason);
				}
				trace!(text_len = text.len(), ?stop_reason, "bedrock stream chunk");

				Ok(Some(StreamChunk { text, stop_reason }))
			}
			_ => {
				trace!(event_type = ?message.event_type(), "bedrock stream event skipped");
				Ok(None)
			}
		}
	}

	fn fail(&mut self, err: Error) -> Poll<Option<Result<StreamEvent>>> {
		self.done = true;
		Poll::Ready(Some(Err(err)))
	}
}

impl Stream for BedrockStreamer {
	type Item = Result<StreamEvent>;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		if self.done {
			return Poll::Ready(None);
		}

		if !self.started {
			self.started = true;
			return Poll::Ready(Some(Ok(StreamEvent::Start)));
		}

		loop {
			// -- Drain whole messages already buffered.
			match self.decoder.next_message() {
				Ok(Some(message)) => match self.handle_message(message) {
					Ok(Some(chunk)) => return Poll::Ready(Some(Ok(StreamEvent::Chunk(chunk)))),
					Ok(None) => continue,
					Err(err) => return self.fail(err),
				},
				Ok(None) => (),
				Err(err) => return self.fail(err),
			}

			// -- Need more bytes.
			match Pin::new(&mut self.inner).poll_next(cx) {
				Poll::Ready(Some(Ok(bytes))) => {
					self.decoder.push(&bytes);
				}
				Poll::Ready(Some(Err(err))) => return self.fail(Error::Webc(webc::Error::Reqwest(err))),
				Poll::Ready(None) => {
					let remaining = self.decoder.remaining();
					if remaining > 0 {
						return self.fail(Error::StreamTruncated { remaining });
					}
					self.done = true;
					let end = StreamEnd {
						captured_text: std::mem::take(&mut self.captured_text),
						stop_reason: self.stop_reason.take(),
					};
					return Poll::Ready(Some(Ok(StreamEvent::End(end))));
				}
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

fn exception_message(payload: &[u8]) -> String {
	match serde_json::from_slice::<Value>(payload) {
		Ok(value) => value
			.get("message")
			.or_else(|| value.get("Message"))
			.and_then(Value::as_str)
			.map(str::to_string)
			.unwrap_or_else(|| value.to_string()),
		Err(_) => String::from_utf8_lossy(payload).to_string(),
	}
}

// region:    --- Tests


// endregion: --- Tests
