//! Outcomes of the two engine operations.

use crate::http::{Headers, RawResponse, Request, ResponseType};

/// A request paired with its wire body, ready for the transport.
#[derive(Debug)]
pub struct SerializedRequest {
    request: Request,
    body: Option<String>,
}

impl SerializedRequest {
    pub(crate) fn new(request: Request, body: Option<String>) -> Self {
        Self { request, body }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn content_type(&self) -> &str {
        self.request.content_type()
    }

    /// Request headers as they should go on the wire: `Content-Type` is
    /// appended when a body is present and the caller did not set it.
    pub fn wire_headers(&self) -> Headers {
        let mut headers = self.request.headers().clone();
        if self.body.is_some() && !headers.contains("content-type") {
            headers.append("content-type", self.request.content_type());
        }
        headers
    }

    pub fn into_parts(self) -> (Request, Option<String>) {
        (self.request, self.body)
    }
}

/// A typed value together with the metadata of the response it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializedResponse<T> {
    headers: Headers,
    status: u16,
    status_text: String,
    response_type: ResponseType,
    content_type: Option<String>,
    payload: T,
}

impl<T> DeserializedResponse<T> {
    /// Moves the metadata out of `response`; the body is dropped.
    pub(crate) fn new(response: RawResponse, payload: T) -> Self {
        Self {
            headers: response.headers,
            status: response.status,
            status_text: response.status_text,
            response_type: response.response_type,
            content_type: response.content_type,
            payload,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// The `Content-Type` exactly as the response declared it.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}
