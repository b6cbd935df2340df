//! Middleware layer.
//!
//! A middleware is a handler decorator: given the next handler it returns a
//! new one that may act before calling it, after it returns, or both, and may
//! short-circuit by never calling it. Decoration happens once, at route
//! registration. Only the resulting handlers do work at request time.
//!
//! Ordering: the first middleware registered is the outermost one. It sees
//! the request first and the response last.
//!
//! ```text
//! .with(A).with(B).on(GET, "/x", h)   ⇒   A(B(h))
//! ```
//!
//! Built-in middleware:
//! - [`ContentTypeJson`]: sets a JSON `content-type` on every response
//! - [`SetRequestId`]: per-request id in a response header, request extensions and log span
//! - [`AuditLog`]: one structured log entry per request/response pair

mod audit;
mod content_type;
mod request_id;

use std::sync::Arc;

use crate::handler::BoxedHandler;

pub use audit::AuditLog;
pub use content_type::ContentTypeJson;
pub use request_id::{RequestId, SetRequestId, X_REQUEST_ID};

/// A handler decorator.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// Wraps `handler` in every middleware of `chain`, first entry outermost.
pub(crate) fn apply(chain: &[BoxedMiddleware], handler: BoxedHandler) -> BoxedHandler {
    chain.iter().rev().fold(handler, |next, m| m.wrap(next))
}
