//! Core data types: decoded records, the envelopes that carry them, and the
//! request a stream is opened for.

use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::protocol::constants::JSON_CONTENT_TYPE;

/// Value attached to a tag on a record.
///
/// `true` marks bare presence; any other JSON value is the tag's value.
pub type TagValue = serde_json::Value;

/// One segment of a record body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Text segment, encoded as a JSON string.
    Text(String),
    /// Binary segment, encoded as a JSON array of byte values.
    Bytes(Vec<u8>),
}

/// One decoded unit of the stream.
///
/// Records are produced only by the frame decoder and are immutable once
/// built; consumers read them through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: String,
    #[serde(default)]
    body: Vec<Segment>,
    #[serde(default)]
    tags: BTreeMap<String, TagValue>,
}

impl Record {
    /// Build a record with the given identifier, no body and no tags.
    pub fn new(id: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            body: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Append a body segment.
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.body.push(segment);
        self
    }

    /// Attach a tag.
    pub fn with_tag(mut self, name: impl Into<String>, value: TagValue) -> Self {
        self.tags.insert(name.into(), value);
        self
    }

    /// Opaque record identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ordered body segments.
    pub fn body(&self) -> &[Segment] {
        &self.body
    }

    /// Tag name to value mapping.
    pub fn tags(&self) -> &BTreeMap<String, TagValue> {
        &self.tags
    }

    /// Whether the record carries the named tag.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }
}

/// The unit placed on the output channel: the raw line text paired with the
/// record decoded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    header: String,
    record: Record,
}

impl Envelope {
    pub(crate) fn new(header: impl Into<String>, record: Record) -> Self {
        Envelope {
            header: header.into(),
            record,
        }
    }

    /// Raw, trimmed line the record was decoded from.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The decoded record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Take ownership of the decoded record.
    pub fn into_record(self) -> Record {
        self.record
    }
}

/// What a stream is opened for: method, path relative to the base address,
/// and an optional request body.
///
/// The same request is replayed verbatim on every reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// HTTP method.
    pub method: Method,
    /// Path appended to the configured base address.
    pub path: String,
    /// Request body for write methods.
    pub body: Option<Bytes>,
    /// Content type sent alongside `body`.
    pub content_type: String,
}

impl StreamRequest {
    /// Build a request for an arbitrary method.
    pub fn new(method: Method, path: impl Into<String>, body: Option<Bytes>) -> Self {
        StreamRequest {
            method,
            path: path.into(),
            body,
            content_type: JSON_CONTENT_TYPE.to_string(),
        }
    }

    /// A `GET` stream request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, None)
    }

    /// A `POST` stream request with a JSON body.
    pub fn post(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::POST, path, Some(body.into()))
    }

    /// A `PUT` stream request with a JSON body.
    pub fn put(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::PUT, path, Some(body.into()))
    }

    /// Override the body content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_builder() {
        let record = Record::new("42")
            .with_segment(Segment::Text("hello".into()))
            .with_tag("important", json!(true));
        assert_eq!(record.id(), "42");
        assert_eq!(record.body().len(), 1);
        assert!(record.has_tag("important"));
        assert!(!record.has_tag("other"));
    }

    #[test]
    fn test_segments_decode_untagged() {
        let record: Record =
            serde_json::from_str(r#"{"id":"1","body":["text",[1,2,3]]}"#).unwrap();
        assert_eq!(
            record.body(),
            &[Segment::Text("text".into()), Segment::Bytes(vec![1, 2, 3])]
        );
        assert!(record.tags().is_empty());
    }

    #[test]
    fn test_stream_request_constructors() {
        let get = StreamRequest::get("/records/feed");
        assert_eq!(get.method, Method::GET);
        assert!(get.body.is_none());

        let post = StreamRequest::post("/values", r#"{"q":"x"}"#)
            .with_content_type("application/vnd.fluidinfo.value+json");
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.body.as_deref(), Some(&br#"{"q":"x"}"#[..]));
        assert_eq!(post.content_type, "application/vnd.fluidinfo.value+json");
    }
}
