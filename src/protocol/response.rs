//! Outbound responses and the builder handed to route handlers.

use bytes::{BufMut, BytesMut};

use crate::protocol::frame::TERMINATOR;

/// A single outbound message.
///
/// Content is written verbatim; a `#` inside it ends the frame early on
/// the receiving side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub verb: String,
    pub path: String,
    pub content: String,
}

impl Response {
    pub fn new(verb: impl Into<String>, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            content: content.into(),
        }
    }

    /// Serialize as `VERB PATH\nCONTENT\n#`.
    pub fn encode(&self, dst: &mut BytesMut) {
        let verb = self.verb.to_uppercase();
        dst.reserve(verb.len() + self.path.len() + self.content.len() + 4);
        dst.put_slice(verb.as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.path.as_bytes());
        dst.put_u8(b'\n');
        dst.put_slice(self.content.as_bytes());
        dst.put_u8(b'\n');
        dst.put_u8(TERMINATOR);
    }

    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf
    }
}

/// Collects at most one pending response from a handler.
#[derive(Debug, Default)]
pub struct Responder {
    pending: Option<Response>,
}

impl Responder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response. A later call replaces the earlier one.
    pub fn send(&mut self, verb: impl Into<String>, path: impl Into<String>, content: impl Into<String>) {
        self.pending = Some(Response::new(verb, path, content));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn into_response(self) -> Option<Response> {
        self.pending
    }
}
