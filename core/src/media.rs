//! Media-type tokens and response content-type resolution.
//!
//! # Design
//! Media types are opaque registry keys. Normalization only drops
//! parameters (`; charset=utf-8`), trims whitespace and lowercases, so
//! `Application/JSON; charset=utf-8` and `application/json` select the same
//! codec. There is no quality-value negotiation.

use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::http::{RawResponse, Request};

pub const WILDCARD: &str = "*/*";
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

/// A normalized media type such as `application/json`, `text/*` or `*/*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(raw: &str) -> Self {
        let essence = raw.split(';').next().unwrap_or_default();
        Self(essence.trim().to_ascii_lowercase())
    }

    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    pub fn json() -> Self {
        Self(APPLICATION_JSON.to_string())
    }

    pub fn text() -> Self {
        Self(TEXT_PLAIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// Wildcard-aware comparison. Symmetric: `text/*` matches `text/plain`
    /// and the other way round; `*/*` matches everything.
    pub fn matches(&self, other: &MediaType) -> bool {
        let (own_type, own_subtype) = self.parts();
        let (other_type, other_subtype) = other.parts();
        let type_matches = own_type == "*" || other_type == "*" || own_type == other_type;
        let subtype_matches =
            own_subtype == "*" || other_subtype == "*" || own_subtype == other_subtype;
        type_matches && subtype_matches
    }

    fn parts(&self) -> (&str, &str) {
        self.0.split_once('/').unwrap_or((self.0.as_str(), ""))
    }
}

impl From<&str> for MediaType {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for MediaType {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&MediaType> for MediaType {
    fn from(media: &MediaType) -> Self {
        media.clone()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pick the media type used for deserializer lookup.
///
/// A missing or blank `Content-Type` becomes `*/*`, and the substitution is
/// reported to `diagnostics` with the request URL. The response itself is
/// left untouched, so callers still see the original header.
pub fn resolve_content_type(
    request: &Request,
    response: &RawResponse,
    diagnostics: &dyn Diagnostics,
) -> MediaType {
    let declared = response
        .content_type
        .as_deref()
        .map(MediaType::new)
        .filter(|media| !media.is_empty());

    match declared {
        Some(media) => media,
        None => {
            let fallback = MediaType::wildcard();
            diagnostics.content_type_defaulted(request.id(), request.url(), &fallback);
            fallback
        }
    }
}
