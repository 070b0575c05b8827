//! Per-call contexts handed to codecs.
//!
//! # Design
//! Contexts only borrow: the request, the response and the registries all
//! outlive a single codec invocation, so nothing is cloned per call.

use std::sync::Arc;

use crate::codec::Deserializer;
use crate::http::{Headers, RawResponse, Request};
use crate::media::MediaType;
use crate::payload::TypeDescriptor;
use crate::provider::ProviderManager;
use crate::registry::CodecRegistry;

/// What a serializer can see about the request being written.
#[derive(Debug, Clone, Copy)]
pub struct SerializationContext<'a> {
    request: &'a Request,
}

impl<'a> SerializationContext<'a> {
    pub fn new(request: &'a Request) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// Declared content type, parameters included.
    pub fn content_type(&self) -> &'a str {
        self.request.content_type()
    }

    pub fn media_type(&self) -> &'a MediaType {
        self.request.media_type()
    }

    pub fn headers(&self) -> &'a Headers {
        self.request.headers()
    }

    pub fn url(&self) -> &'a str {
        self.request.url()
    }
}

/// What a deserializer can see about the exchange being read.
pub struct DeserializationContext<'a> {
    request: &'a Request,
    response: &'a RawResponse,
    media_type: &'a MediaType,
    result_type: TypeDescriptor,
    providers: &'a ProviderManager,
    registry: &'a CodecRegistry,
}

impl<'a> DeserializationContext<'a> {
    pub fn new(
        request: &'a Request,
        response: &'a RawResponse,
        media_type: &'a MediaType,
        result_type: TypeDescriptor,
        providers: &'a ProviderManager,
        registry: &'a CodecRegistry,
    ) -> Self {
        Self {
            request,
            response,
            media_type,
            result_type,
            providers,
            registry,
        }
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn status_text(&self) -> &'a str {
        &self.response.status_text
    }

    pub fn headers(&self) -> &'a Headers {
        &self.response.headers
    }

    /// The `Content-Type` the response declared, if any.
    pub fn content_type(&self) -> Option<&'a str> {
        self.response.content_type.as_deref()
    }

    /// The media type the deserializer was selected with. `*/*` when the
    /// response declared none.
    pub fn media_type(&self) -> &'a MediaType {
        self.media_type
    }

    /// The type the caller asked for, with the container shape if any.
    pub fn result_type(&self) -> TypeDescriptor {
        self.result_type
    }

    /// An instance of `T` from the provider manager.
    pub fn instance<T: 'static>(&self) -> Option<T> {
        self.providers.get::<T>()
    }

    /// The deserializer for a nested type `U` under the same media type.
    pub fn deserializer<U: 'static>(&self) -> Option<Arc<dyn Deserializer<U>>> {
        self.registry.find_deserializer::<U>(self.media_type)
    }

    pub fn deserializer_for<U: 'static>(&self, media_type: &MediaType) -> Option<Arc<dyn Deserializer<U>>> {
        self.registry.find_deserializer::<U>(media_type)
    }
}
