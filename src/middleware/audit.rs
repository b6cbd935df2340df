use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;
use http::HeaderMap;
use tracing::info;

use super::{Middleware, RequestId};
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::writer::{ResponseWrapper, ResponseWriter};

/// Emits one structured `info` event per request/response pair.
///
/// The event carries the request id (when [`SetRequestId`](super::SetRequestId)
/// ran before this middleware), method, route, query, request body, response
/// headers, final status and response body. It is emitted after the
/// downstream chain returns or panics; a panic is re-raised once logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditLog;

impl Middleware for AuditLog {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Audited { next })
    }
}

struct Audited {
    next: BoxedHandler,
}

impl ErasedHandler for Audited {
    fn call<'a>(&'a self, req: Request, w: &'a mut dyn ResponseWriter) -> BoxFuture<'a> {
        Box::pin(async move {
            let request_id = req.extensions().get::<RequestId>().map(ToString::to_string).unwrap_or_default();
            let method = req.method().clone();
            let route = req.uri().path().to_owned();
            let query = serde_json::to_string(&req.query()).unwrap_or_default();
            // shares the buffer, the handler still reads the full body
            let request_body = req.body().clone();

            let mut wrapper = ResponseWrapper::new(w);
            let outcome = AssertUnwindSafe(self.next.call(req, &mut wrapper)).catch_unwind().await;

            info!(
                request_id = %request_id,
                method = %method,
                route = %route,
                query = %query,
                request_body = %String::from_utf8_lossy(&request_body),
                response_headers = %headers_json(wrapper.headers()),
                status = wrapper.status().as_u16(),
                response_body = %String::from_utf8_lossy(wrapper.body()),
                panicked = outcome.is_err(),
                "request handled"
            );

            if let Err(payload) = outcome {
                panic::resume_unwind(payload);
            }
        })
    }
}

fn headers_json(headers: &HeaderMap) -> String {
    let mut map: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        map.entry(name.as_str())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    serde_json::to_string(&map).unwrap_or_default()
}
