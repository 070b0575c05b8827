//! Codec traits and the built-in JSON and plain-text codecs.
//!
//! A serializer turns a typed value (or a slice of them) into wire text; a
//! deserializer turns a [`ResponseBody`] back into typed values. Codecs are
//! registered per value type and media type in the
//! [`CodecRegistry`](crate::CodecRegistry) and shared behind `Arc`, so they
//! must be stateless or internally synchronized.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::context::{DeserializationContext, SerializationContext};
use crate::http::ResponseBody;
use crate::payload::ContainerKind;

/// Errors raised inside a codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The erased value handed to a codec was not of its registered type.
    #[error("expected a value of type '{expected}'")]
    TypeMismatch { expected: &'static str },

    #[error("codec for '{type_name}' does not handle collections")]
    CollectionUnsupported { type_name: &'static str },

    #[error("invalid payload: {0}")]
    Invalid(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Converts values of `T` into wire text.
pub trait Serializer<T>: Send + Sync + 'static {
    fn serialize(&self, value: &T, ctx: &SerializationContext<'_>) -> Result<String, CodecError>;

    /// Serialize a whole collection of `T`.
    fn serialize_collection(
        &self,
        values: &[T],
        ctx: &SerializationContext<'_>,
    ) -> Result<String, CodecError> {
        let _ = (values, ctx);
        Err(CodecError::CollectionUnsupported {
            type_name: type_name::<T>(),
        })
    }
}

/// Converts a response body into values of `T`.
pub trait Deserializer<T>: Send + Sync + 'static {
    fn deserialize(
        &self,
        body: &ResponseBody,
        ctx: &DeserializationContext<'_>,
    ) -> Result<T, CodecError>;

    /// Produce the elements of a collection shaped as `container`. The
    /// engine collects them into the caller's concrete container type.
    fn deserialize_collection(
        &self,
        body: &ResponseBody,
        container: ContainerKind,
        ctx: &DeserializationContext<'_>,
    ) -> Result<Vec<T>, CodecError> {
        let _ = (body, container, ctx);
        Err(CodecError::CollectionUnsupported {
            type_name: type_name::<T>(),
        })
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// JSON codec for any serde type. Collections map to JSON arrays, for both
/// list and set containers.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonCodec<T> {}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonCodec<{}>", type_name::<T>())
    }
}

fn from_json<V: DeserializeOwned>(body: &ResponseBody) -> Result<V, CodecError> {
    match body {
        ResponseBody::Text(text) => serde_json::from_str(text),
        ResponseBody::Binary(bytes) => serde_json::from_slice(bytes),
    }
    .map_err(CodecError::Decode)
}

impl<T: Serialize + 'static> Serializer<T> for JsonCodec<T> {
    fn serialize(&self, value: &T, _ctx: &SerializationContext<'_>) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(CodecError::Encode)
    }

    fn serialize_collection(
        &self,
        values: &[T],
        _ctx: &SerializationContext<'_>,
    ) -> Result<String, CodecError> {
        serde_json::to_string(values).map_err(CodecError::Encode)
    }
}

impl<T: DeserializeOwned + 'static> Deserializer<T> for JsonCodec<T> {
    fn deserialize(
        &self,
        body: &ResponseBody,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<T, CodecError> {
        from_json(body)
    }

    fn deserialize_collection(
        &self,
        body: &ResponseBody,
        _container: ContainerKind,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<Vec<T>, CodecError> {
        from_json(body)
    }
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// Plain-text codec for `String`. A collection is one element per line.
///
/// Elements must be non-empty and free of line breaks (`\n` or `\r`);
/// anything else could not be read back unchanged and is rejected as
/// [`CodecError::Invalid`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

fn text_of(body: &ResponseBody) -> Result<&str, CodecError> {
    match body {
        ResponseBody::Text(text) => Ok(text.as_str()),
        ResponseBody::Binary(bytes) => Ok(std::str::from_utf8(bytes)?),
    }
}

impl Serializer<String> for TextCodec {
    fn serialize(&self, value: &String, _ctx: &SerializationContext<'_>) -> Result<String, CodecError> {
        Ok(value.clone())
    }

    fn serialize_collection(
        &self,
        values: &[String],
        _ctx: &SerializationContext<'_>,
    ) -> Result<String, CodecError> {
        for value in values {
            if value.is_empty() {
                return Err(CodecError::Invalid("line-separated element is empty".to_string()));
            }
            if value.contains(['\n', '\r']) {
                return Err(CodecError::Invalid(format!(
                    "line-separated element contains a line break: {value:?}"
                )));
            }
        }
        Ok(values.join("\n"))
    }
}

impl Deserializer<String> for TextCodec {
    fn deserialize(
        &self,
        body: &ResponseBody,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<String, CodecError> {
        text_of(body).map(str::to_string)
    }

    fn deserialize_collection(
        &self,
        body: &ResponseBody,
        _container: ContainerKind,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<Vec<String>, CodecError> {
        Ok(text_of(body)?.lines().map(str::to_string).collect())
    }
}
