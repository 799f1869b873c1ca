// src/core/protocol/line_codec.rs

//! Newline-delimited framing for the command protocol.
//!
//! Each request is one line of ASCII text terminated by `\n` (a preceding `\r`
//! is tolerated). Lines may arrive split across several reads or several lines
//! may arrive in one read; the codec buffers until a full line is available.

use crate::core::BridgeError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Default upper bound for a single request line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// A `tokio_util::codec` implementation for request and response lines.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    /// Where to resume the newline search on the next call, so a slowly
    /// arriving line is not rescanned from the start each time.
    next_index: usize,
}

impl LineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    fn take_line(&mut self, src: &mut BytesMut, len: usize, skip: usize) -> String {
        let raw = src.split_to(len);
        src.advance(skip);
        self.next_index = 0;
        String::from_utf8_lossy(&raw).trim().to_string()
    }
}

/// Length of a line without the `\r` of a `\r\n` terminator.
fn content_len(line: &[u8]) -> usize {
    match line.last() {
        Some(b'\r') => line.len() - 1,
        _ => line.len(),
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = BridgeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let search_from = self.next_index.min(src.len());
        match src[search_from..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let newline = search_from + offset;
                if content_len(&src[..newline]) > self.max_length {
                    return Err(BridgeError::LineTooLong(self.max_length));
                }
                Ok(Some(self.take_line(src, newline, 1)))
            }
            None if content_len(&src[..]) > self.max_length => {
                Err(BridgeError::LineTooLong(self.max_length))
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    /// A final line without a terminator is still a request.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let len = src.len();
        Ok(Some(self.take_line(src, len, 0)))
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = BridgeError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.as_ref();
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
