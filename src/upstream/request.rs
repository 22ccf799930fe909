//! Outbound request model.
//!
//! A [`ForwardRequest`] is built once per inbound call and consumed by the
//! forwarder. Its constructor enforces the body rule: `GET` and `HEAD` never
//! carry a body, whatever the caller sent.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use url::form_urlencoded;

/// True if requests with this method may carry a body.
pub fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

#[derive(Debug, Clone)]
pub struct ForwardRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
    headers: HeaderMap,
}

impl ForwardRequest {
    /// Build an outbound request. An empty body, or any body on `GET`/`HEAD`,
    /// is dropped.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Vec<(String, String)>,
        body: Option<Bytes>,
        headers: HeaderMap,
    ) -> Self {
        let body = body.filter(|b| carries_body(&method) && !b.is_empty());

        Self {
            method,
            path: path.into(),
            query,
            body,
            headers,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Canonical backend path, e.g. "/admin/rides/7".
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Encoded query string, `None` when there are no parameters.
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query {
            serializer.append_pair(key, value);
        }
        Some(serializer.finish())
    }
}

/// Query parameters to forward: the caller's pairs in order (repeats kept),
/// minus the path-capture artifact, plus route defaults for absent keys.
pub fn forward_query(
    raw: Option<&str>,
    capture_key: &str,
    defaults: &[(String, String)],
) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = raw
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key != capture_key)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    for (key, value) in defaults {
        if !pairs.iter().any(|(k, _)| k == key) {
            pairs.push((key.clone(), value.clone()));
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_get_and_head_never_carry_body() {
        for method in [Method::GET, Method::HEAD] {
            for body in [
                Some(Bytes::from_static(b"{\"status\":\"suspended\"}")),
                Some(Bytes::from_static(b"not json at all")),
                Some(Bytes::new()),
                None,
            ] {
                let request =
                    ForwardRequest::new(method.clone(), "/admin/drivers", vec![], body, HeaderMap::new());
                assert!(request.body().is_none(), "{} carried a body", method);
            }
        }
    }

    #[test]
    fn test_mutations_keep_body() {
        let body = Bytes::from_static(b"{\"amount\":50}");
        let request = ForwardRequest::new(
            Method::PATCH,
            "/admin/riders/5/wallet",
            vec![],
            Some(body.clone()),
            HeaderMap::new(),
        );
        assert_eq!(request.body(), Some(&body));

        let empty = ForwardRequest::new(
            Method::POST,
            "/admin/rides/5/cancel",
            vec![],
            Some(Bytes::new()),
            HeaderMap::new(),
        );
        assert!(empty.body().is_none());
    }

    #[test]
    fn test_forward_query_strips_capture_key() {
        let query = forward_query(Some("path=rides&path=42&status=open&tag=a&tag=b"), "path", &[]);
        assert_eq!(
            query,
            vec![pair("status", "open"), pair("tag", "a"), pair("tag", "b")]
        );
    }

    #[test]
    fn test_forward_query_defaults() {
        let defaults = vec![pair("city", "Austin, TX")];

        let absent = forward_query(None, "path", &defaults);
        assert_eq!(absent, vec![pair("city", "Austin, TX")]);

        let supplied = forward_query(Some("city=Addis%20Ababa"), "path", &defaults);
        assert_eq!(supplied, vec![pair("city", "Addis Ababa")]);
    }

    #[test]
    fn test_query_string_encoding() {
        let request = ForwardRequest::new(
            Method::GET,
            "/admin/dashboard/overview",
            vec![pair("city", "Austin, TX")],
            None,
            HeaderMap::new(),
        );
        assert_eq!(request.query_string().as_deref(), Some("city=Austin%2C+TX"));

        let bare = ForwardRequest::new(Method::GET, "/admin/logs", vec![], None, HeaderMap::new());
        assert_eq!(bare.query_string(), None);
    }
}
