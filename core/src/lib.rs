//! Content-negotiated serialization dispatch for HTTP-style exchanges.
//!
//! # Overview
//! Turns typed request payloads into wire text and raw responses back into
//! typed values, picking the codec from a registry keyed by value type and
//! media type. The core never touches the network (host-does-IO pattern):
//! the caller executes the round-trip between
//! [`SerializationEngine::serialize_request`] and
//! [`SerializationEngine::deserialize_response`].
//!
//! # Design
//! - Payloads carry an explicit [`TypeDescriptor`] (element type plus an
//!   optional container shape), so collections dispatch to the codec of
//!   their element type without sampling elements at runtime.
//! - Codecs are stored type-erased in [`CodecRegistry`] and recovered
//!   through typed adapters; lookups fall back to wildcard media types.
//! - A response without `Content-Type` is matched against `*/*`. The
//!   substitution is reported through the injectable [`Diagnostics`] sink,
//!   never as an error.
//! - Missing codecs fail with [`SerializationError`]; codec failures pass
//!   through untouched as [`CodecError`].

pub mod codec;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod http;
pub mod media;
pub mod payload;
pub mod provider;
pub mod registry;
pub mod result;

pub use codec::{CodecError, Deserializer, JsonCodec, Serializer, TextCodec};
pub use context::{DeserializationContext, SerializationContext};
pub use diagnostics::{CollectingDiagnostics, Diagnostics, DiagnosticEvent, TracingDiagnostics};
pub use engine::{EngineBuilder, SerializationEngine};
pub use error::{Result, SerializationError};
pub use http::{Headers, HttpMethod, RawResponse, Request, ResponseBody, ResponseType};
pub use media::MediaType;
pub use payload::{Container, ContainerKind, Payload, TypeDescriptor};
pub use provider::ProviderManager;
pub use registry::CodecRegistry;
pub use result::{DeserializedResponse, SerializedRequest};
