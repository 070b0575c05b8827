//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe requests and responses as plain data. The engine
//! serializes a [`Request`] and deserializes a [`RawResponse`] without ever
//! touching the network; the host executes the actual I/O in between.
//!
//! Headers keep insertion order and duplicates, since the response wrapper
//! must hand them back exactly as received.

use bytes::Bytes;
use uuid::Uuid;

use crate::media::{MediaType, APPLICATION_JSON};
use crate::payload::Payload;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Ordered multimap of header names to values.
///
/// Lookups are case-insensitive on the name. Nothing is merged or
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, String)>> for Headers {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An outbound request described as plain data.
///
/// The declared content type defaults to `application/json` and is kept as
/// written; codec lookup uses its normalized [`MediaType`]. Each request
/// gets a random id used to correlate diagnostics.
#[derive(Debug)]
pub struct Request {
    id: Uuid,
    method: HttpMethod,
    url: String,
    headers: Headers,
    content_type: String,
    media_type: MediaType,
    payload: Option<Payload>,
}

impl Request {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            url: url.to_string(),
            headers: Headers::new(),
            content_type: APPLICATION_JSON.to_string(),
            media_type: MediaType::json(),
            payload: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: &str) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let declared = content_type.into();
        self.media_type = MediaType::new(&declared);
        self.content_type = declared;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Content type exactly as declared, parameters included.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Normalized form of [`Request::content_type`] used for codec lookup.
    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }
}

/// Raw response payload, as text or as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Text(String),
    Binary(Bytes),
}

impl ResponseBody {
    pub fn is_text(&self) -> bool {
        matches!(self, ResponseBody::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text.as_str()),
            ResponseBody::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ResponseBody::Text(text) => text.as_bytes(),
            ResponseBody::Binary(bytes) => &bytes[..],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// How the transport classified the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Default,
    Text,
    Json,
    Binary,
    Document,
}

/// A response as received by the host, before deserialization.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub content_type: Option<String>,
    pub response_type: ResponseType,
    pub body: ResponseBody,
}

impl RawResponse {
    /// Build a text response, taking `content_type` from the
    /// `Content-Type` header when present.
    pub fn from_parts(status: u16, status_text: &str, headers: Headers, body: String) -> Self {
        let content_type = headers.get("content-type").map(str::to_string);
        Self {
            status,
            status_text: status_text.to_string(),
            headers,
            content_type,
            response_type: ResponseType::Text,
            body: ResponseBody::Text(body),
        }
    }
}
