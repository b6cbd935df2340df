use std::fmt;
use std::sync::Arc;

use http::HeaderValue;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::Middleware;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::writer::ResponseWriter;

/// Response header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The id assigned to the request being handled.
///
/// Lives in the request's extensions, so it is owned by that request alone:
///
/// ```rust,ignore
/// let id = req.extensions().get::<RequestId>().map(RequestId::as_str);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assigns a fresh random id to every request.
///
/// The id goes into the `x-request-id` response header and the request's
/// extensions, and the downstream call runs inside a `request` span carrying
/// it, so any event logged while handling this request is correlated.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetRequestId;

impl Middleware for SetRequestId {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(WithRequestId { next })
    }
}

struct WithRequestId {
    next: BoxedHandler,
}

impl ErasedHandler for WithRequestId {
    fn call<'a>(&'a self, mut req: Request, w: &'a mut dyn ResponseWriter) -> BoxFuture<'a> {
        let id = RequestId::new();
        // uuid strings are always valid header values
        if let Ok(value) = HeaderValue::from_str(id.as_str()) {
            w.headers_mut().insert(X_REQUEST_ID, value);
        }
        let span = info_span!("request", request_id = %id);
        req.extensions_mut().insert(id);
        Box::pin(self.next.call(req, w).instrument(span))
    }
}
