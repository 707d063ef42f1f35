//! Request parsing.
//!
//! # Responsibilities
//! - Split a frame body into verb, path and payload
//! - Normalize case (verb upper, path lower)
//! - Reject frames whose verb or path is not a single token
//! - Decode JSON payloads lazily, on demand

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Parameters captured by a route pattern, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// Reasons a frame body cannot be turned into a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No space separating verb from path.
    #[error("missing space between verb and path")]
    MissingSeparator,

    /// Nothing before the first space.
    #[error("empty verb")]
    EmptyVerb,

    #[error("verb contains whitespace")]
    WhitespaceInVerb,

    #[error("path contains whitespace")]
    WhitespaceInPath,
}

impl ParseError {
    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::MissingSeparator => "missing_separator",
            ParseError::EmptyVerb => "empty_verb",
            ParseError::WhitespaceInVerb => "whitespace_in_verb",
            ParseError::WhitespaceInPath => "whitespace_in_path",
        }
    }
}

/// One parsed inbound message.
#[derive(Debug)]
pub struct Request {
    verb: String,
    path: String,
    raw: String,
    peer: SocketAddr,
    params: Params,
    json: OnceLock<serde_json::Value>,
}

impl Request {
    /// Parse a decoded frame body received from `peer`.
    pub fn parse(frame: &str, peer: SocketAddr) -> Result<Self, ParseError> {
        let frame = frame.replace('\r', "");

        let space = frame.find(' ').ok_or(ParseError::MissingSeparator)?;
        let (verb, rest) = frame.split_at(space);
        let rest = &rest[1..];

        let (path, raw) = match rest.find('\n') {
            Some(newline) => (&rest[..newline], &rest[newline + 1..]),
            None => (rest, ""),
        };

        let verb = verb.trim().to_uppercase();
        let path = path.trim().to_lowercase();

        if verb.is_empty() {
            return Err(ParseError::EmptyVerb);
        }
        if verb.chars().any(char::is_whitespace) {
            return Err(ParseError::WhitespaceInVerb);
        }
        if path.chars().any(char::is_whitespace) {
            return Err(ParseError::WhitespaceInPath);
        }

        Ok(Self {
            verb,
            path,
            raw: raw.trim().to_string(),
            peer,
            params: Params::new(),
            json: OnceLock::new(),
        })
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Payload text exactly as received, trimmed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn bind_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Decode the payload as JSON.
    ///
    /// The decoded value is cached, so later calls return the same value
    /// without re-parsing. A failed decode is not cached.
    pub fn json(&self) -> Result<&serde_json::Value, serde_json::Error> {
        if let Some(value) = self.json.get() {
            return Ok(value);
        }
        let value = serde_json::from_str(&self.raw)?;
        Ok(self.json.get_or_init(|| value))
    }

    /// Deserialize the payload into `T`, going through the cached JSON value.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn peer() -> SocketAddr {
        "127.0.0.1:4000".parse().unwrap()
    }

    #[test]
    fn parses_verb_path_and_body() {
        let req = Request::parse("p /Report/42\n{\"temp\": 21}", peer()).unwrap();

        assert_eq!(req.verb(), "P");
        assert_eq!(req.path(), "/report/42");
        assert_eq!(req.raw(), "{\"temp\": 21}");
        assert_eq!(req.peer(), peer());
        assert!(req.params().is_empty());
    }

    #[test]
    fn body_is_optional() {
        let req = Request::parse("GET /status", peer()).unwrap();
        assert_eq!(req.path(), "/status");
        assert_eq!(req.raw(), "");
    }

    #[test]
    fn body_keeps_inner_newlines() {
        let req = Request::parse("P /log\nline one\nline two\n", peer()).unwrap();
        assert_eq!(req.raw(), "line one\nline two");
    }

    #[test]
    fn carriage_returns_are_stripped() {
        let req = Request::parse("P /a\r\nbody\r\nmore\r", peer()).unwrap();
        assert_eq!(req.path(), "/a");
        assert_eq!(req.raw(), "body\nmore");
    }

    #[test]
    fn extra_spaces_around_path_are_trimmed() {
        let req = Request::parse("P    /a   \nx", peer()).unwrap();
        assert_eq!(req.path(), "/a");
    }

    #[test]
    fn empty_path_is_accepted() {
        let req = Request::parse("P \nbody", peer()).unwrap();
        assert_eq!(req.path(), "");
        assert_eq!(req.raw(), "body");
    }

    #[test]
    fn rejects_missing_space() {
        assert_eq!(Request::parse("P", peer()).unwrap_err(), ParseError::MissingSeparator);
        assert_eq!(Request::parse("", peer()).unwrap_err(), ParseError::MissingSeparator);
        assert_eq!(Request::parse("P\n/a", peer()).unwrap_err(), ParseError::MissingSeparator);
    }

    #[test]
    fn rejects_empty_verb() {
        assert_eq!(Request::parse(" /a", peer()).unwrap_err(), ParseError::EmptyVerb);
    }

    #[test]
    fn rejects_whitespace_inside_path() {
        let err = Request::parse("P /a b\nbody", peer()).unwrap_err();
        assert_eq!(err, ParseError::WhitespaceInPath);
    }

    #[test]
    fn rejects_whitespace_inside_verb() {
        let err = Request::parse("P\tX /a", peer()).unwrap_err();
        assert_eq!(err, ParseError::WhitespaceInVerb);
    }

    #[test]
    fn json_is_decoded_once_and_cached() {
        let req = Request::parse("P /t\n{\"temp\": 21}", peer()).unwrap();

        let first = req.json().unwrap() as *const serde_json::Value;
        let second = req.json().unwrap() as *const serde_json::Value;
        assert_eq!(first, second);
        assert_eq!(req.json().unwrap()["temp"], 21);
    }

    #[test]
    fn json_as_deserializes_typed_payload() {
        #[derive(Deserialize)]
        struct Reading {
            temp: i64,
        }

        let req = Request::parse("P /t\n{\"temp\": -3}", peer()).unwrap();
        let reading: Reading = req.json_as().unwrap();
        assert_eq!(reading.temp, -3);
    }

    #[test]
    fn malformed_json_is_reported_to_caller() {
        let req = Request::parse("P /t\nnot json", peer()).unwrap();
        assert!(req.json().is_err());
        assert!(req.json().is_err());
    }
}
