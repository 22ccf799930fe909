//! Path normalization.
//!
//! # Responsibilities
//! - Accept the path suffix in any of the forms a front end may deliver it:
//!   an ordered segment list, a single joined string, or the raw request URL
//! - Produce one ordered list of non-empty segments after the mount prefix
//!
//! # Design Decisions
//! - Representations are tried in order (segments, joined, url); the first
//!   one yielding at least one segment wins
//! - A query string leaking into the captured path is cut at the first `?`
//! - Segments are not percent-decoded; they travel upstream as received
//! - Dot segments (`.`, `..`, `%2e` forms) and segments carrying `?`, `#`
//!   or `\\` are rejected, so a rewritten path cannot leave its namespace

use axum::http::Uri;

use crate::error::ProxyError;

/// Path suffix as delivered by the inbound request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathCapture {
    /// Segments captured individually (e.g. repeated `?path=` values).
    pub segments: Option<Vec<String>>,
    /// Suffix captured as one string ("rides/42/cancel").
    pub joined: Option<String>,
    /// Raw request target, path and query.
    pub url: Option<String>,
}

impl PathCapture {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: Some(segments.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn from_joined(joined: impl Into<String>) -> Self {
        Self {
            joined: Some(joined.into()),
            ..Self::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Capture everything an inbound request URI offers. Repeated
    /// `capture_key` query values become the segment list.
    pub fn from_uri(uri: &Uri, capture_key: &str) -> Self {
        let segments: Vec<String> = uri
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .filter(|(key, _)| key == capture_key)
                    .map(|(_, value)| value.into_owned())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            segments: (!segments.is_empty()).then_some(segments),
            joined: None,
            url: uri.path_and_query().map(|pq| pq.as_str().to_string()),
        }
    }

    /// Normalize into the segments following `prefix`.
    pub fn normalize(&self, prefix: &str) -> Result<Vec<String>, ProxyError> {
        let candidates = [
            self.segments.as_deref().map(split_segment_list),
            self.joined.as_deref().map(split_joined),
            self.url.as_deref().map(|url| split_url(url, prefix)),
        ];

        let segments = candidates
            .into_iter()
            .flatten()
            .find(|segments| !segments.is_empty())
            .ok_or(ProxyError::InvalidPath)?;

        for segment in &segments {
            check_segment(segment)?;
        }
        Ok(segments)
    }
}

/// Reject a segment that URL parsing would resolve away or split.
///
/// `%2e` counts as a dot in either case, matching how URL parsers detect
/// dot segments.
pub fn check_segment(segment: &str) -> Result<(), ProxyError> {
    if segment.contains(['?', '#', '\\']) {
        return Err(ProxyError::InvalidPath);
    }

    let dotted = segment.to_ascii_lowercase().replace("%2e", ".");
    if dotted == "." || dotted == ".." {
        return Err(ProxyError::InvalidPath);
    }
    Ok(())
}

fn strip_query(raw: &str) -> &str {
    raw.split('?').next().unwrap_or_default()
}

fn split_path(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split('/').filter(|s| !s.is_empty()).map(String::from)
}

fn split_segment_list(segments: &[String]) -> Vec<String> {
    let last = segments.len().saturating_sub(1);
    segments
        .iter()
        .enumerate()
        .flat_map(|(i, segment)| {
            let segment = if i == last { strip_query(segment) } else { segment.as_str() };
            split_path(segment).collect::<Vec<_>>()
        })
        .collect()
}

fn split_joined(joined: &str) -> Vec<String> {
    split_path(strip_query(joined)).collect()
}

fn split_url(url: &str, prefix: &str) -> Vec<String> {
    let mut path = strip_query(url);

    // Absolute form: drop scheme and authority.
    if let Some(rest) = path
        .strip_prefix("https://")
        .or_else(|| path.strip_prefix("http://"))
    {
        path = rest.find('/').map(|i| &rest[i..]).unwrap_or("");
    }

    let prefix = prefix.trim_end_matches('/');
    let suffix = match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    };

    split_path(suffix).collect()
}
