//! Newline-delimited JSON event framing
//!
//! One event per line. The codec buffers raw bytes and yields complete
//! events regardless of how reads split the stream. A line that exceeds
//! the configured cap, or that is not valid JSON for the expected event
//! type, is a protocol error.

use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Default cap on a single encoded event line
pub const DEFAULT_MAX_EVENT_SIZE: usize = 16 * 1024;

/// Streaming encoder/decoder for line-framed JSON events
#[derive(Debug)]
pub struct EventCodec {
    buffer: BytesMut,
    max_event_size: usize,
}

impl EventCodec {
    /// Create a codec with the default line cap
    pub fn new() -> Self {
        Self::with_max_event_size(DEFAULT_MAX_EVENT_SIZE)
    }

    /// Create a codec with a custom line cap
    pub fn with_max_event_size(max_event_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            max_event_size,
        }
    }

    /// Feed raw bytes into the codec
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next complete event
    ///
    /// Returns `Ok(None)` when no full line is buffered yet. Blank lines
    /// are skipped.
    pub fn decode_next<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            let pos = match self.buffer.iter().position(|&b| b == b'\n') {
                Some(pos) => pos,
                None => {
                    if self.buffer.len() > self.max_event_size {
                        return Err(self.oversize_error());
                    }
                    return Ok(None);
                }
            };

            if pos > self.max_event_size {
                return Err(self.oversize_error());
            }

            let mut line = self.buffer.split_to(pos + 1);
            line.truncate(line.len() - 1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            if line.is_empty() {
                continue;
            }

            return Ok(Some(serde_json::from_slice(&line)?));
        }
    }

    /// Encode one event as a line
    pub fn encode<T: Serialize>(&self, event: &T) -> Result<Bytes> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        Ok(Bytes::from(line))
    }

    /// Number of bytes buffered but not yet decoded
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn oversize_error(&self) -> Error {
        Error::Protocol(format!(
            "event line exceeds {} bytes",
            self.max_event_size
        ))
    }
}

impl Default for EventCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::event::{ChatMessage, ClientEvent};

    fn message_line() -> Bytes {
        EventCodec::new()
            .encode(&ClientEvent::Message(ChatMessage::new(
                "Alice",
                "hi",
                "2026-05-01T10:00:00Z",
            )))
            .unwrap()
    }

    #[test]
    fn test_encode_appends_newline() {
        let line = message_line();
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn test_decode_across_feed_boundaries() {
        let line = message_line();
        let mut codec = EventCodec::new();

        codec.feed(&line[..5]);
        assert!(codec.decode_next::<ClientEvent>().unwrap().is_none());

        codec.feed(&line[5..line.len() - 1]);
        assert!(codec.decode_next::<ClientEvent>().unwrap().is_none());

        codec.feed(&line[line.len() - 1..]);
        let event = codec.decode_next::<ClientEvent>().unwrap().unwrap();
        assert_eq!(event.name(), "message");
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_decode_multiple_events_in_one_feed() {
        let mut data = Vec::new();
        data.extend_from_slice(&message_line());
        data.extend_from_slice(&message_line());

        let mut codec = EventCodec::new();
        codec.feed(&data);

        assert!(codec.decode_next::<ClientEvent>().unwrap().is_some());
        assert!(codec.decode_next::<ClientEvent>().unwrap().is_some());
        assert!(codec.decode_next::<ClientEvent>().unwrap().is_none());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut codec = EventCodec::new();
        codec.feed(b"\n\r\n");
        codec.feed(&message_line());

        let event = codec.decode_next::<ClientEvent>().unwrap().unwrap();
        assert_eq!(event.name(), "message");
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut codec = EventCodec::new();
        codec.feed(b"{\"event\":\"feedback\",\"feedback\":\"typing\"}\r\n");

        let event = codec.decode_next::<ClientEvent>().unwrap().unwrap();
        match event {
            ClientEvent::Feedback { feedback } => assert_eq!(feedback, "typing"),
            other => panic!("expected feedback, got {}", other.name()),
        }
    }

    #[test]
    fn test_malformed_json_is_protocol_error() {
        let mut codec = EventCodec::new();
        codec.feed(b"not json at all\n");

        let result = codec.decode_next::<ClientEvent>();
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_oversize_partial_line_rejected() {
        let mut codec = EventCodec::with_max_event_size(32);
        codec.feed(&[b'x'; 64]);

        let result = codec.decode_next::<ClientEvent>();
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_oversize_complete_line_rejected() {
        let mut codec = EventCodec::with_max_event_size(32);
        let mut data = vec![b'x'; 64];
        data.push(b'\n');
        codec.feed(&data);

        let result = codec.decode_next::<ClientEvent>();
        assert!(matches!(result, Err(Error::Protocol(_))));
    }
}
