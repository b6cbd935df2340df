//! Response sinks.
//!
//! Handlers produce [`Response`](crate::Response) values, but the middleware
//! chain works on a *sink*: something headers, a status, and body bytes are
//! written into. That is what lets a middleware observe exactly what went out
//! by slipping a [`ResponseWrapper`] between the handler and the real sink.
//!
//! ```text
//! server ── ResponseBuffer ──► global middleware ──► group middleware
//!                                                    │
//!                         AuditLog: ResponseWrapper(&mut sink) ──► handler
//! ```

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tracing::warn;

/// The write surface every handler and middleware talks to.
///
/// Semantics follow the usual HTTP handler contract: the first status written
/// is the one sent, and writing body bytes without a status commits `200 OK`.
pub trait ResponseWriter: Send {
    fn headers(&self) -> &HeaderMap;
    fn headers_mut(&mut self) -> &mut HeaderMap;
    fn write_status(&mut self, status: StatusCode);
    fn write(&mut self, buf: &[u8]);
}

// ── ResponseBuffer ────────────────────────────────────────────────────────────

/// The concrete sink the server hands to the router for each request.
///
/// Everything is buffered in memory and turned into one
/// `http::Response<Full<Bytes>>` once the handler chain returns.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status that will be sent; `200 OK` if nothing was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body.freeze()));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = self.headers;
        res
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(sent) => warn!(%sent, ignored = %status, "superfluous write_status call"),
        }
    }

    fn write(&mut self, buf: &[u8]) {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
    }
}

// ── ResponseWrapper ───────────────────────────────────────────────────────────

/// Transparent decorator over another sink that remembers what went through.
///
/// Every call is forwarded unchanged to the wrapped sink. On the side it keeps
/// the first status written and a copy of every body byte, for observability.
/// It lives on the handling task's stack and borrows the real sink only for
/// the duration of one request.
pub struct ResponseWrapper<'a> {
    inner: &'a mut dyn ResponseWriter,
    status: Option<StatusCode>,
    body: BytesMut,
}

impl<'a> ResponseWrapper<'a> {
    pub fn new(inner: &'a mut dyn ResponseWriter) -> Self {
        Self { inner, status: None, body: BytesMut::new() }
    }

    /// The captured status, `200 OK` if the handler never set one.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Copy of every byte written through this wrapper.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl ResponseWriter for ResponseWrapper<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status.get_or_insert(status);
        self.inner.write_status(status);
    }

    fn write(&mut self, buf: &[u8]) {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        self.inner.write(buf);
    }
}
