//! Errors raised by the serialization engine.
//!
//! # Design
//! A missing codec is a registration defect, so the two "not found"
//! variants are terminal and carry the type and media type needed to fix
//! the registry. Failures inside a codec are wrapped transparently: their
//! message and source chain reach the caller unchanged.

use crate::codec::CodecError;

pub type Result<T, E = SerializationError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// No serializer for (payload type, declared content type).
    #[error("could not find serializer for type '{type_name}' and media type '{media_type}'")]
    SerializerNotFound {
        type_name: String,
        media_type: String,
    },

    /// No deserializer for (result type, response content type). The media
    /// type is the one the response declared, before wildcard defaulting.
    #[error("could not find deserializer for type '{type_name}' and media type '{media_type}'")]
    DeserializerNotFound {
        type_name: String,
        media_type: String,
    },

    /// The selected codec failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
