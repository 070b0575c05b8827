//! End-to-end dispatch against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every kind of
//! exchange the engine negotiates over real HTTP using ureq: JSON
//! collections both ways, a response without `Content-Type`, a charset
//! parameterized `text/plain` listing, and an echo round-trip.

use std::sync::Arc;

use conneg_core::{
    CodecError, CodecRegistry, CollectingDiagnostics, DiagnosticEvent, Headers, HttpMethod,
    JsonCodec, MediaType, Payload, RawResponse, Request, SerializationEngine, SerializationError,
    SerializedRequest, TextCodec,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    id: u64,
    name: String,
}

/// Execute a `SerializedRequest` using ureq and return a `RawResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`.
fn execute(serialized: &SerializedRequest) -> RawResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let request = serialized.request();
    let url = request.url();
    let headers = serialized.wire_headers();

    let mut response = match (request.method(), serialized.body()) {
        (HttpMethod::Get, _) => {
            let mut builder = agent.get(url);
            for (name, value) in headers.iter() {
                builder = builder.header(name, value);
            }
            builder.call()
        }
        (HttpMethod::Post, Some(body)) => {
            let mut builder = agent.post(url);
            for (name, value) in headers.iter() {
                builder = builder.header(name, value);
            }
            builder.send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(url).send_empty(),
        (method, _) => panic!("unsupported method in test: {}", method.as_str()),
    }
    .expect("HTTP transport error");

    let status = response.status();
    let headers: Headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    RawResponse::from_parts(status.as_u16(), status.canonical_reason().unwrap_or(""), headers, body)
}

fn people() -> Vec<Person> {
    ["Ada", "Grace", "Linus"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| Person {
            id: i as u64 + 1,
            name: name.to_string(),
        })
        .collect()
}

#[test]
fn negotiated_exchanges() {
    // Step 1: start mock server on a random port.
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    let base = format!("http://{addr}");
    let registry = CodecRegistry::new();
    registry.register_codec::<Person, _>(&["application/json"], JsonCodec::<Person>::new());
    registry.register_codec::<String, _>(&["text/plain"], TextCodec);
    registry.register_empty_container("text/plain", "");
    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let engine = SerializationEngine::builder()
        .registry(Arc::new(registry))
        .diagnostics(diagnostics.clone())
        .build();

    // Step 2: list — should be empty.
    let req = engine.serialize_request(Request::get(&format!("{base}/people"))).unwrap();
    let listed = engine
        .deserialize_response_as::<Person, Vec<Person>>(req.request(), execute(&req))
        .unwrap();
    assert_eq!(listed.status(), 200);
    assert!(listed.payload().is_empty(), "expected empty list");

    // Step 3: create three people; the body is a JSON array of three.
    let req = engine
        .serialize_request(Request::post(&format!("{base}/people")).with_payload(Payload::list(people())))
        .unwrap();
    let sent: serde_json::Value = serde_json::from_str(req.body().unwrap()).unwrap();
    assert_eq!(sent.as_array().map(Vec::len), Some(3));
    let created = engine
        .deserialize_response_as::<Person, Vec<Person>>(req.request(), execute(&req))
        .unwrap();
    assert_eq!(created.status(), 201);
    assert_eq!(created.payload(), &people());

    // Step 4: fetch one person without a Content-Type header.
    let req = engine.serialize_request(Request::get(&format!("{base}/people/1/untyped"))).unwrap();
    let fetched = engine.deserialize_response::<Person>(req.request(), execute(&req)).unwrap();
    assert_eq!(fetched.payload(), &people()[0]);
    assert_eq!(fetched.status(), 200);
    assert_eq!(fetched.content_type(), None);
    assert_eq!(
        diagnostics.events(),
        vec![DiagnosticEvent::ContentTypeDefaulted {
            request_id: req.request().id(),
            url: format!("{base}/people/1/untyped"),
            fallback: MediaType::wildcard(),
        }]
    );

    // Step 5: names as text/plain; charset=utf-8, one per line.
    let req = engine.serialize_request(Request::get(&format!("{base}/names"))).unwrap();
    let names = engine
        .deserialize_response_as::<String, Vec<String>>(req.request(), execute(&req))
        .unwrap();
    assert!(names.content_type().unwrap().starts_with("text/plain"));
    assert_eq!(names.payload(), &vec!["Ada", "Grace", "Linus"]);

    // Step 6: an empty text list follows the text/plain rule, not `[]`.
    let req = engine
        .serialize_request(
            Request::post(&format!("{base}/echo"))
                .with_content_type("text/plain")
                .with_payload(Payload::list(Vec::<String>::new())),
        )
        .unwrap();
    assert_eq!(req.body(), Some(""));
    let echoed = engine
        .deserialize_response_as::<String, Vec<String>>(req.request(), execute(&req))
        .unwrap();
    assert!(echoed.payload().is_empty());

    // Step 7: a single person echoed back as JSON.
    let ada = people()[0].clone();
    let req = engine
        .serialize_request(Request::post(&format!("{base}/echo")).with_payload(Payload::value(ada.clone())))
        .unwrap();
    let echoed = engine.deserialize_response::<Person>(req.request(), execute(&req)).unwrap();
    assert_eq!(echoed.into_payload(), ada);

    // Step 8: a 404 has an empty body; the codec error comes through as-is.
    let req = engine.serialize_request(Request::get(&format!("{base}/people/99"))).unwrap();
    let err = engine.deserialize_response::<Person>(req.request(), execute(&req)).unwrap_err();
    assert!(matches!(err, SerializationError::Codec(CodecError::Decode(_))));
}
