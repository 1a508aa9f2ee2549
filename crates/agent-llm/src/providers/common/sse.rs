//! Shared SSE -> [`LLMStream`] adapter.

use std::fmt::Display;
use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::future;
use futures::Stream;
use futures_util::StreamExt;
use reqwest::Response;

use crate::protocol::{interpret_stream_record, WireFormat};
use crate::provider::{LLMError, LLMStream, Result};

/// End-of-stream sentinel sent as a record's data.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded server-sent-event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Explicit `event:` name; `None` for unnamed (default `message`) records.
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    pub fn is_done(&self) -> bool {
        self.data.trim() == DONE_SENTINEL
    }
}

pub type FrameStream = Pin<Box<dyn Stream<Item = Result<SseFrame>> + Send>>;

/// Decode a byte stream into [`SseFrame`]s.
///
/// Records are framed by `eventsource-stream`, so chunks may split lines anywhere.
/// A `[DONE]` record ends the sequence; transport and UTF-8 failures are yielded as
/// [`LLMError::Stream`].
pub fn decode_frames<S, B, E>(bytes: S) -> FrameStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let frames = bytes
        .eventsource()
        .map(|event| {
            let event = event.map_err(|e| LLMError::Stream(e.to_string()))?;
            let name = match event.event.as_str() {
                "" | "message" => None,
                other => Some(other.to_string()),
            };
            Ok(SseFrame {
                event: name,
                data: event.data,
            })
        })
        .take_while(|frame| future::ready(!matches!(frame, Ok(frame) if frame.is_done())));

    Box::pin(frames)
}

/// Interpret decoded frames with the adapter for `format`.
///
/// The first decode or provider error is yielded as an `Err` item; consumers treat it
/// as fatal for the turn.
pub fn stream_from_frames(frames: FrameStream, format: WireFormat) -> LLMStream {
    let stream = frames.flat_map(move |frame| {
        let items: Vec<Result<_>> = match frame {
            Ok(frame) => match interpret_stream_record(format, &frame) {
                Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                Err(err) => vec![Err(LLMError::from(err))],
            },
            Err(err) => vec![Err(err)],
        };
        futures::stream::iter(items)
    });

    Box::pin(stream)
}

/// Convert an SSE HTTP [`Response`] into an [`LLMStream`].
pub fn llm_stream_from_sse(response: Response, format: WireFormat) -> LLMStream {
    stream_from_frames(decode_frames(response.bytes_stream()), format)
}
