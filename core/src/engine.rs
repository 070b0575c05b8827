//! Request serialization and response deserialization.
//!
//! # Design
//! `SerializationEngine` holds only shared, read-mostly collaborators (the
//! codec registry, the provider manager and a diagnostics sink) and no
//! per-call state, so one instance serves any number of concurrent
//! exchanges. Every call is synchronous and fails fast: a missing codec is
//! a registration defect and is reported immediately, never retried.

use std::any::type_name;
use std::sync::Arc;

use crate::codec::{CodecError, Deserializer};
use crate::context::{DeserializationContext, SerializationContext};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Result, SerializationError};
use crate::http::{RawResponse, Request, ResponseBody};
use crate::media::resolve_content_type;
use crate::payload::{Container, Payload, TypeDescriptor};
use crate::provider::ProviderManager;
use crate::registry::CodecRegistry;
use crate::result::{DeserializedResponse, SerializedRequest};

#[derive(Clone)]
pub struct SerializationEngine {
    registry: Arc<CodecRegistry>,
    providers: Arc<ProviderManager>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl SerializationEngine {
    pub fn new(registry: Arc<CodecRegistry>, providers: Arc<ProviderManager>) -> Self {
        Self {
            registry,
            providers,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn providers(&self) -> &ProviderManager {
        &self.providers
    }

    /// Compute the wire body for `request`.
    ///
    /// No payload means no body. A single value is written by the
    /// serializer registered for its type; a collection by the serializer
    /// registered for its element type, or by the empty-container rule of
    /// the declared content type when it has no elements.
    pub fn serialize_request(&self, request: Request) -> Result<SerializedRequest> {
        let body = match request.payload() {
            Some(payload) => Some(self.serialize_payload(&request, payload)?),
            None => None,
        };
        Ok(SerializedRequest::new(request, body))
    }

    fn serialize_payload(&self, request: &Request, payload: &Payload) -> Result<String> {
        let descriptor = payload.descriptor();
        let media_type = request.media_type();

        if payload.is_empty_collection() {
            let body = self.registry.empty_container(media_type);
            tracing::debug!(
                request_id = %request.id(),
                element_type = descriptor.type_name(),
                %media_type,
                "empty collection written from container rule"
            );
            return Ok(body);
        }

        let serializer = self
            .registry
            .find_erased_serializer(descriptor.type_id(), media_type)
            .ok_or_else(|| SerializationError::SerializerNotFound {
                type_name: descriptor.type_name().to_string(),
                media_type: request.content_type().to_string(),
            })?;
        tracing::debug!(
            request_id = %request.id(),
            value_type = serializer.type_name(),
            %media_type,
            collection = descriptor.is_collection(),
            "serializer selected"
        );

        let ctx = SerializationContext::new(request);
        Ok(serializer.serialize_payload(payload, &ctx)?)
    }

    /// Deserialize `response` as a single `T`.
    pub fn deserialize_response<T: 'static>(
        &self,
        request: &Request,
        response: RawResponse,
    ) -> Result<DeserializedResponse<T>> {
        self.deserialize_with(request, response, TypeDescriptor::of::<T>(), |deserializer, body, ctx| {
            deserializer.deserialize(body, ctx)
        })
    }

    /// Deserialize `response` as a collection of `T` held in `C`.
    ///
    /// The deserializer is the one registered for the element type `T`.
    pub fn deserialize_response_as<T: 'static, C: Container<T>>(
        &self,
        request: &Request,
        response: RawResponse,
    ) -> Result<DeserializedResponse<C>> {
        let result_type = TypeDescriptor::collection_of::<T>(C::KIND);
        self.deserialize_with(request, response, result_type, |deserializer, body, ctx| {
            let items = deserializer.deserialize_collection(body, C::KIND, ctx)?;
            Ok(items.into_iter().collect::<C>())
        })
    }

    fn deserialize_with<T: 'static, R>(
        &self,
        request: &Request,
        response: RawResponse,
        result_type: TypeDescriptor,
        invoke: impl FnOnce(
            &dyn Deserializer<T>,
            &ResponseBody,
            &DeserializationContext<'_>,
        ) -> std::result::Result<R, CodecError>,
    ) -> Result<DeserializedResponse<R>> {
        let media_type = resolve_content_type(request, &response, self.diagnostics.as_ref());

        let deserializer = self
            .registry
            .find_deserializer::<T>(&media_type)
            .ok_or_else(|| SerializationError::DeserializerNotFound {
                type_name: type_name::<T>().to_string(),
                media_type: response.content_type.clone().unwrap_or_default(),
            })?;
        tracing::debug!(
            request_id = %request.id(),
            value_type = type_name::<T>(),
            %media_type,
            container = ?result_type.container(),
            "deserializer selected"
        );

        let value = {
            let ctx = DeserializationContext::new(
                request,
                &response,
                &media_type,
                result_type,
                &self.providers,
                &self.registry,
            );
            invoke(deserializer.as_ref(), &response.body, &ctx)?
        };
        Ok(DeserializedResponse::new(response, value))
    }
}

impl std::fmt::Debug for SerializationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationEngine")
            .field("registry", &self.registry)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`SerializationEngine`]. Unset parts default to an empty
/// registry, no providers and [`TracingDiagnostics`].
#[derive(Default)]
pub struct EngineBuilder {
    registry: Option<Arc<CodecRegistry>>,
    providers: Option<Arc<ProviderManager>>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl EngineBuilder {
    pub fn registry(mut self, registry: Arc<CodecRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn providers(mut self, providers: Arc<ProviderManager>) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn build(self) -> SerializationEngine {
        SerializationEngine {
            registry: self.registry.unwrap_or_default(),
            providers: self.providers.unwrap_or_default(),
            diagnostics: self.diagnostics.unwrap_or_else(|| Arc::new(TracingDiagnostics)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Serialize};
    use tracing_test::traced_test;

    use super::*;
    use crate::codec::{JsonCodec, Serializer, TextCodec};
    use crate::diagnostics::CollectingDiagnostics;
    use crate::http::{Headers, ResponseType};
    use crate::media::MediaType;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: u64,
    }

    /// Reads the `id` and fills the rest from a provider.
    #[derive(Debug, PartialEq)]
    struct Account {
        id: u64,
        region: String,
    }

    struct AccountDeserializer;

    impl Deserializer<Account> for AccountDeserializer {
        fn deserialize(
            &self,
            body: &ResponseBody,
            ctx: &DeserializationContext<'_>,
        ) -> std::result::Result<Account, CodecError> {
            let person = ctx
                .deserializer::<Person>()
                .ok_or_else(|| CodecError::Invalid("no nested deserializer".to_string()))?
                .deserialize(body, ctx)?;
            let region = ctx
                .instance::<String>()
                .ok_or_else(|| CodecError::Invalid("no region provider".to_string()))?;
            Ok(Account { id: person.id, region })
        }
    }

    fn engine() -> SerializationEngine {
        let registry = CodecRegistry::new();
        registry.register_codec::<Person, _>(&["application/json"], JsonCodec::<Person>::new());
        registry.register_codec::<String, _>(&["text/plain"], TextCodec);
        SerializationEngine::builder().registry(Arc::new(registry)).build()
    }

    fn response(content_type: Option<&str>, body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: Headers::new(),
            content_type: content_type.map(str::to_string),
            response_type: ResponseType::Text,
            body: ResponseBody::Text(body.to_string()),
        }
    }

    #[test]
    fn absent_payload_has_no_body() {
        let serialized = engine()
            .serialize_request(Request::get("http://localhost:3000/people").with_content_type("application/xml"))
            .unwrap();
        assert!(serialized.body().is_none());
    }

    #[test]
    fn single_value_uses_its_type() {
        let request = Request::post("http://localhost:3000/people").with_payload(Payload::value(Person { id: 1 }));
        let serialized = engine().serialize_request(request).unwrap();
        assert_eq!(serialized.body(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn collection_dispatches_on_element_type() {
        let request = Request::post("http://localhost:3000/people")
            .with_payload(Payload::list(vec![Person { id: 1 }, Person { id: 2 }]));
        let serialized = engine().serialize_request(request).unwrap();
        assert_eq!(serialized.body(), Some(r#"[{"id":1},{"id":2}]"#));
    }

    #[test]
    fn empty_collection_uses_baseline_for_any_media_type() {
        for media in ["application/json", "text/plain", "application/xml"] {
            let request = Request::post("http://localhost:3000/people")
                .with_content_type(media)
                .with_payload(Payload::list(Vec::<Person>::new()));
            let serialized = engine().serialize_request(request).unwrap();
            assert_eq!(serialized.body(), Some("[]"), "{media}");
        }
    }

    #[test]
    fn empty_collection_honors_registered_rule() {
        let engine = engine();
        engine.registry().register_empty_container("text/plain", "");
        let request = Request::post("http://localhost:3000/names")
            .with_content_type("text/plain")
            .with_payload(Payload::list(Vec::<String>::new()));
        assert_eq!(engine.serialize_request(request).unwrap().body(), Some(""));
    }

    #[test]
    fn missing_serializer_names_type_and_content_type() {
        let request = Request::post("http://localhost:3000/people")
            .with_content_type("application/xml")
            .with_payload(Payload::value(Person { id: 1 }));
        let err = engine().serialize_request(request).unwrap_err();
        assert!(matches!(err, SerializationError::SerializerNotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains(type_name::<Person>()), "{msg}");
        assert!(msg.contains("application/xml"), "{msg}");
    }

    #[test]
    fn missing_serializer_reports_declared_content_type() {
        let request = Request::post("http://localhost:3000/people")
            .with_content_type("Application/XML; charset=utf-8")
            .with_payload(Payload::value(Person { id: 1 }));
        match engine().serialize_request(request).unwrap_err() {
            SerializationError::SerializerNotFound { media_type, .. } => {
                assert_eq!(media_type, "Application/XML; charset=utf-8");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parameters_do_not_affect_serializer_lookup() {
        let request = Request::post("http://localhost:3000/people")
            .with_content_type("application/json; charset=utf-8")
            .with_payload(Payload::value(Person { id: 4 }));
        let serialized = engine().serialize_request(request).unwrap();
        assert_eq!(serialized.body(), Some(r#"{"id":4}"#));
        assert_eq!(
            serialized.wire_headers().get("content-type"),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn collection_of_unregistered_element_fails() {
        let request = Request::post("http://localhost:3000/numbers").with_payload(Payload::list(vec![1u8]));
        let err = engine().serialize_request(request).unwrap_err();
        assert!(err.to_string().contains("u8"));
    }

    #[test]
    fn codec_failure_passes_through() {
        let request = Request::post("http://localhost:3000/names")
            .with_content_type("text/plain")
            .with_payload(Payload::list(vec!["a\nb".to_string()]));
        let err = engine().serialize_request(request).unwrap_err();
        assert!(matches!(err, SerializationError::Codec(CodecError::Invalid(_))));
    }

    #[test]
    fn typed_lookup_agrees_with_dispatch() {
        let engine = engine();
        let serializer = engine.registry().find_serializer::<Person>(&MediaType::json()).unwrap();
        let request = Request::post("http://localhost:3000/people");
        let direct = serializer.serialize(&Person { id: 9 }, &SerializationContext::new(&request)).unwrap();
        assert_eq!(direct, r#"{"id":9}"#);
    }

    #[test]
    fn response_without_content_type_uses_wildcard() {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let registry = CodecRegistry::new();
        registry.register_codec::<Person, _>(&["application/json"], JsonCodec::<Person>::new());
        let engine = SerializationEngine::builder()
            .registry(Arc::new(registry))
            .diagnostics(diagnostics.clone())
            .build();

        let request = Request::get("http://localhost:3000/people/1");
        let result = engine
            .deserialize_response::<Person>(&request, response(None, r#"{"id":1}"#))
            .unwrap();

        assert_eq!(result.payload(), &Person { id: 1 });
        assert_eq!(result.status(), 200);
        assert_eq!(result.content_type(), None);
        assert_eq!(diagnostics.events().len(), 1);
    }

    #[traced_test]
    #[test]
    fn wildcard_default_is_logged_not_raised() {
        let request = Request::get("http://localhost:3000/people/7");
        let result = engine().deserialize_response::<Person>(&request, response(Some(""), r#"{"id":7}"#));
        assert!(result.is_ok());
        assert!(logs_contain("no Content-Type"));
        assert!(logs_contain("http://localhost:3000/people/7"));
    }

    #[test]
    fn missing_deserializer_reports_original_content_type() {
        let request = Request::get("http://localhost:3000/people/1");
        let err = engine()
            .deserialize_response::<Person>(&request, response(Some("application/xml; charset=utf-8"), "<p/>"))
            .unwrap_err();
        assert!(matches!(err, SerializationError::DeserializerNotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains(type_name::<Person>()), "{msg}");
        assert!(msg.contains("application/xml; charset=utf-8"), "{msg}");
    }

    #[test]
    fn collection_lands_in_requested_container() {
        let request = Request::get("http://localhost:3000/names");
        let result = engine()
            .deserialize_response_as::<String, BTreeSet<String>>(&request, response(Some("text/plain"), "bob\nalice\nbob"))
            .unwrap();
        let expected: BTreeSet<String> = ["alice", "bob"].into_iter().map(String::from).collect();
        assert_eq!(result.payload(), &expected);
    }

    #[test]
    fn decode_failure_passes_through() {
        let request = Request::get("http://localhost:3000/people/1");
        let err = engine()
            .deserialize_response::<Person>(&request, response(Some("application/json"), "{"))
            .unwrap_err();
        assert!(matches!(err, SerializationError::Codec(CodecError::Decode(_))));
    }

    #[test]
    fn nested_deserializers_and_providers_are_reachable() {
        let registry = CodecRegistry::new();
        registry.register_codec::<Person, _>(&["application/json"], JsonCodec::<Person>::new());
        registry.register_deserializer::<Account, _>(&["application/json"], AccountDeserializer);
        let providers = ProviderManager::new();
        providers.register(|| "eu-west".to_string());
        let engine = SerializationEngine::new(Arc::new(registry), Arc::new(providers));

        let request = Request::get("http://localhost:3000/accounts/3");
        let result = engine
            .deserialize_response::<Account>(&request, response(Some("application/json"), r#"{"id":3}"#))
            .unwrap();
        assert_eq!(
            result.into_payload(),
            Account {
                id: 3,
                region: "eu-west".to_string()
            }
        );
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        let engine = engine();
        let handles: Vec<_> = (0..4u64)
            .map(|id| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    let request =
                        Request::post("http://localhost:3000/people").with_payload(Payload::value(Person { id }));
                    engine.serialize_request(request).unwrap().body().map(str::to_string)
                })
            })
            .collect();
        for (id, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Some(format!(r#"{{"id":{id}}}"#)));
        }
    }
}
