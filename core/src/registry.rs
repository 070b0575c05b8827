//! Codec registry keyed by value type and media type.
//!
//! # Design
//! Registrations are grouped per `TypeId`, each entry holding one media
//! type. Lookup is nearest match and deterministic:
//!
//! 1. an entry whose media type equals the requested one;
//! 2. otherwise the first entry, in registration order, whose media type
//!    wildcard-matches the requested one (`*/*`, `type/*`, either side).
//!
//! Value types never coerce: a miss is `None`, not a runtime type error.
//! Serializers are stored behind an erased adapter so the engine can call
//! them for payloads whose type is only known as a `TypeId`; deserializers
//! are always looked up with a static type and are stored as plain
//! `Arc<dyn Deserializer<T>>` inside `dyn Any`.
//!
//! The registry also owns the empty-container rules: the body written for
//! an empty collection, per media type, with `[]` as the baseline.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::{CodecError, Deserializer, JsonCodec, Serializer, TextCodec};
use crate::context::SerializationContext;
use crate::media::{MediaType, APPLICATION_JSON, TEXT_PLAIN};
use crate::payload::Payload;

/// Body written for an empty collection when no rule matches.
pub const BASELINE_EMPTY_CONTAINER: &str = "[]";

/// Serializer whose value type has been erased.
pub(crate) trait ErasedSerializer: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Serialize `payload`, which must hold a `T` or a collection of `T`.
    fn serialize_payload(
        &self,
        payload: &Payload,
        ctx: &SerializationContext<'_>,
    ) -> Result<String, CodecError>;

    fn as_any(&self) -> &dyn Any;
}

struct TypedSerializer<T: 'static> {
    inner: Arc<dyn Serializer<T>>,
}

impl<T: 'static> ErasedSerializer for TypedSerializer<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn serialize_payload(
        &self,
        payload: &Payload,
        ctx: &SerializationContext<'_>,
    ) -> Result<String, CodecError> {
        let mismatch = || CodecError::TypeMismatch {
            expected: type_name::<T>(),
        };
        if payload.descriptor().is_collection() {
            let items = payload.items::<T>().ok_or_else(mismatch)?;
            self.inner.serialize_collection(items, ctx)
        } else {
            let value = payload.downcast_ref::<T>().ok_or_else(mismatch)?;
            self.inner.serialize(value, ctx)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Entry<C: ?Sized> {
    media_type: MediaType,
    codec: Arc<C>,
}

impl<C: ?Sized> Clone for Entry<C> {
    fn clone(&self) -> Self {
        Self {
            media_type: self.media_type.clone(),
            codec: Arc::clone(&self.codec),
        }
    }
}

fn nearest<'a, C: ?Sized>(entries: &'a [Entry<C>], media_type: &MediaType) -> Option<&'a Entry<C>> {
    entries
        .iter()
        .find(|entry| entry.media_type == *media_type)
        .or_else(|| entries.iter().find(|entry| entry.media_type.matches(media_type)))
}

/// Insert or replace the entry for `media_type`, keeping registration order.
fn upsert<C: ?Sized>(entries: &mut Vec<Entry<C>>, media_type: MediaType, codec: Arc<C>) {
    match entries.iter_mut().find(|entry| entry.media_type == media_type) {
        Some(entry) => entry.codec = codec,
        None => entries.push(Entry { media_type, codec }),
    }
}

type SerializerEntries = HashMap<TypeId, Vec<Entry<dyn ErasedSerializer>>>;
type DeserializerEntries = HashMap<TypeId, Vec<Entry<dyn Any + Send + Sync>>>;

/// Maps (value type, media type) to serializers and deserializers.
///
/// Safe to share: lookups take a read lock and clone the codec's `Arc` out
/// before it runs, so runtime registration never blocks a codec call.
#[derive(Default)]
pub struct CodecRegistry {
    serializers: RwLock<SerializerEntries>,
    deserializers: RwLock<DeserializerEntries>,
    empty_containers: RwLock<Vec<(MediaType, String)>>,
}

impl CodecRegistry {
    /// An empty registry. Empty collections serialize as `[]`.
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON for `serde_json::Value`, plain text for `String`, and an empty
    /// body for empty collections sent as `text/plain`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_codec::<serde_json::Value, _>(&[APPLICATION_JSON], JsonCodec::new());
        registry.register_codec::<String, _>(&[TEXT_PLAIN], TextCodec);
        registry.register_empty_container(APPLICATION_JSON, BASELINE_EMPTY_CONTAINER);
        registry.register_empty_container(TEXT_PLAIN, "");
        registry
    }

    pub fn register_serializer<T, S>(&self, media_types: &[&str], serializer: S)
    where
        T: 'static,
        S: Serializer<T>,
    {
        self.register_serializer_arc::<T>(media_types, Arc::new(serializer));
    }

    pub fn register_serializer_arc<T: 'static>(
        &self,
        media_types: &[&str],
        serializer: Arc<dyn Serializer<T>>,
    ) {
        let erased: Arc<dyn ErasedSerializer> = Arc::new(TypedSerializer { inner: serializer });
        let mut serializers = self.serializers.write();
        let entries = serializers.entry(TypeId::of::<T>()).or_default();
        for media_type in media_types {
            upsert(entries, MediaType::new(media_type), Arc::clone(&erased));
        }
        tracing::debug!(value_type = type_name::<T>(), ?media_types, "serializer registered");
    }

    pub fn register_deserializer<T, D>(&self, media_types: &[&str], deserializer: D)
    where
        T: 'static,
        D: Deserializer<T>,
    {
        self.register_deserializer_arc::<T>(media_types, Arc::new(deserializer));
    }

    pub fn register_deserializer_arc<T: 'static>(
        &self,
        media_types: &[&str],
        deserializer: Arc<dyn Deserializer<T>>,
    ) {
        let stored: Arc<dyn Any + Send + Sync> = Arc::new(deserializer);
        let mut deserializers = self.deserializers.write();
        let entries = deserializers.entry(TypeId::of::<T>()).or_default();
        for media_type in media_types {
            upsert(entries, MediaType::new(media_type), Arc::clone(&stored));
        }
        tracing::debug!(value_type = type_name::<T>(), ?media_types, "deserializer registered");
    }

    /// Register one value as both serializer and deserializer.
    pub fn register_codec<T, C>(&self, media_types: &[&str], codec: C)
    where
        T: 'static,
        C: Serializer<T> + Deserializer<T>,
    {
        let codec = Arc::new(codec);
        let serializer: Arc<dyn Serializer<T>> = Arc::clone(&codec) as Arc<dyn Serializer<T>>;
        let deserializer: Arc<dyn Deserializer<T>> = codec;
        self.register_serializer_arc::<T>(media_types, serializer);
        self.register_deserializer_arc::<T>(media_types, deserializer);
    }

    /// Body to write for an empty collection sent as `media_type`.
    pub fn register_empty_container(&self, media_type: &str, body: &str) {
        let mut rules = self.empty_containers.write();
        let media_type = MediaType::new(media_type);
        match rules.iter_mut().find(|(media, _)| *media == media_type) {
            Some((_, existing)) => *existing = body.to_string(),
            None => rules.push((media_type, body.to_string())),
        }
    }

    pub fn find_serializer<T: 'static>(&self, media_type: &MediaType) -> Option<Arc<dyn Serializer<T>>> {
        let erased = self.find_erased_serializer(TypeId::of::<T>(), media_type)?;
        erased
            .as_any()
            .downcast_ref::<TypedSerializer<T>>()
            .map(|typed| Arc::clone(&typed.inner))
    }

    pub(crate) fn find_erased_serializer(
        &self,
        type_id: TypeId,
        media_type: &MediaType,
    ) -> Option<Arc<dyn ErasedSerializer>> {
        let serializers = self.serializers.read();
        let entries = serializers.get(&type_id)?;
        nearest(entries, media_type).map(|entry| Arc::clone(&entry.codec))
    }

    pub fn find_deserializer<T: 'static>(&self, media_type: &MediaType) -> Option<Arc<dyn Deserializer<T>>> {
        let deserializers = self.deserializers.read();
        let entries = deserializers.get(&TypeId::of::<T>())?;
        nearest(entries, media_type)?
            .codec
            .downcast_ref::<Arc<dyn Deserializer<T>>>()
            .cloned()
    }

    /// Empty-collection body for `media_type`, `[]` when no rule matches.
    pub fn empty_container(&self, media_type: &MediaType) -> String {
        let rules = self.empty_containers.read();
        rules
            .iter()
            .find(|(media, _)| media == media_type)
            .or_else(|| rules.iter().find(|(media, _)| media.matches(media_type)))
            .map(|(_, body)| body.clone())
            .unwrap_or_else(|| BASELINE_EMPTY_CONTAINER.to_string())
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let serializers: Vec<(&'static str, String)> = self
            .serializers
            .read()
            .values()
            .flatten()
            .map(|entry| (entry.codec.type_name(), entry.media_type.to_string()))
            .collect();
        f.debug_struct("CodecRegistry")
            .field("serializers", &serializers)
            .field("deserializer_types", &self.deserializers.read().len())
            .field("empty_containers", &self.empty_containers.read().len())
            .finish()
    }
}
