//! Incoming HTTP request type.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};

/// An incoming HTTP request with its body fully buffered.
///
/// The body is a [`Bytes`] handle, so middleware can keep a copy for logging
/// while the handler still reads the same bytes.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) extensions: Extensions,
}

impl Request {
    pub fn method(&self) -> &Method { &self.method }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// The URI as received, before any group prefix was stripped.
    pub fn uri(&self) -> &Uri { &self.uri }

    /// The path used for routing. Inside a route group this is the path with
    /// the group prefix removed.
    pub fn path(&self) -> &str { &self.path }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/books/{id}`, `req.param("id")` on `/books/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decoded query parameters. Repeated keys keep every value in order.
    pub fn query(&self) -> BTreeMap<String, Vec<String>> {
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if let Some(query) = self.uri.query() {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params.entry(key.into_owned()).or_default().push(value.into_owned());
            }
        }
        params
    }

    /// Request-scoped values set by middleware, e.g. the request id.
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    pub(crate) fn set_route(&mut self, path: String, params: HashMap<String, String>) {
        self.path = path;
        self.params = params;
    }

    #[cfg(test)]
    pub(crate) fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            path: parts.uri.path().to_owned(),
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            extensions: parts.extensions,
        }
    }
}
