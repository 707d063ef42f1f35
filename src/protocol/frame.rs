//! Terminator-delimited framing.
//!
//! # Responsibilities
//! - Reassemble complete messages from arbitrary read chunks
//! - Retain the trailing partial fragment between reads
//! - Encode outbound responses into the same framing
//!
//! # Design Decisions
//! - Single-byte terminator, so a terminator can never straddle two reads
//! - No length limit: unterminated input is bounded only by the idle timeout
//! - Frames are trimmed here; validation belongs to the request parser

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::response::Response;

/// Byte that ends every frame on the wire.
pub const TERMINATOR: u8 = b'#';

/// Codec for `#`-terminated text frames.
///
/// Decoding yields one trimmed frame body per call; callers loop until
/// `Ok(None)` to drain every frame buffered by a single read.
#[derive(Debug, Default, Clone)]
pub struct FrameCodec {
    /// Offset up to which the buffer is known to hold no terminator.
    scanned: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        let start = self.scanned.min(src.len());
        let Some(offset) = src[start..].iter().position(|b| *b == TERMINATOR) else {
            self.scanned = src.len();
            return Ok(None);
        };

        let frame = src.split_to(start + offset);
        src.advance(1);
        self.scanned = 0;

        Ok(Some(String::from_utf8_lossy(&frame).trim().to_string()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    tracing::trace!(discarded = src.len(), "Dropping unterminated fragment at EOF");
                    src.clear();
                }
                self.scanned = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<Response> for FrameCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst);
        Ok(())
    }
}
