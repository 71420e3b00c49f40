//! Cache Key Module
//!
//! Derives the store key for a request from its path, query and Accept header.

use std::fmt;

/// Accept segment used when the request carries no Accept header.
pub const DEFAULT_ACCEPT: &str = "Default";

/// Delimiter between the path/query and accept segments.
pub const KEY_DELIMITER: char = ':';

// == Cache Key ==
/// Identifies one cached response.
///
/// Requests with the same path, query and first Accept media range share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path_and_query: String,
    accept: String,
}

impl CacheKey {
    /// Builds a key from the request target and its raw Accept header values.
    ///
    /// Only the first media range of the first header value is used.
    pub fn from_parts<'a, I>(path_and_query: impl Into<String>, accept_values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let accept = accept_values
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(normalize_media_range)
            .find(|range| !range.is_empty())
            .unwrap_or_else(|| DEFAULT_ACCEPT.to_string());

        Self {
            path_and_query: path_and_query.into(),
            accept,
        }
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    // == Content Type Hint ==
    /// Best-effort content type taken from the accept segment.
    ///
    /// Returns `None` for the default sentinel and for wildcard ranges.
    pub fn content_type_hint(&self) -> Option<String> {
        if self.accept == DEFAULT_ACCEPT {
            return None;
        }

        let media_type = self.accept.split(';').next().unwrap_or_default().trim();
        let (kind, subtype) = media_type.split_once('/')?;
        if kind.is_empty() || subtype.is_empty() || kind == "*" || subtype == "*" {
            return None;
        }

        Some(media_type.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.path_and_query, KEY_DELIMITER, self.accept)
    }
}

/// Lower-cases a media range and collapses whitespace around its parameters.
fn normalize_media_range(range: &str) -> String {
    range
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
        .to_ascii_lowercase()
}
