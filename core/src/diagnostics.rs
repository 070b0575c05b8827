//! Diagnostics sink for non-fatal observations made during dispatch.
//!
//! # Design
//! The engine receives its sink by injection instead of writing to a global
//! logger. [`TracingDiagnostics`] forwards to `tracing`; tests swap in
//! [`CollectingDiagnostics`] to assert on what was reported.

use parking_lot::Mutex;
use uuid::Uuid;

use crate::media::MediaType;

/// Receives informational events from the engine. Never used for errors.
pub trait Diagnostics: Send + Sync {
    /// A response arrived without `Content-Type`; lookup used `fallback`.
    fn content_type_defaulted(&self, request_id: Uuid, url: &str, fallback: &MediaType);
}

/// Default sink: emits structured `tracing` events at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn content_type_defaulted(&self, request_id: Uuid, url: &str, fallback: &MediaType) {
        tracing::info!(
            %request_id,
            url,
            media_type = %fallback,
            "response has no Content-Type header; matching deserializers against {fallback}"
        );
    }
}

/// A recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    ContentTypeDefaulted {
        request_id: Uuid,
        url: String,
        fallback: MediaType,
    },
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn content_type_defaulted(&self, request_id: Uuid, url: &str, fallback: &MediaType) {
        self.events.lock().push(DiagnosticEvent::ContentTypeDefaulted {
            request_id,
            url: url.to_string(),
            fallback: fallback.clone(),
        });
    }
}
