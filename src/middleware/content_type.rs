use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::HeaderValue;

use super::Middleware;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::writer::ResponseWriter;

const APPLICATION_JSON: &str = "application/json;charset=utf8";

/// Sets `content-type: application/json;charset=utf8` before calling the next
/// handler, unconditionally. Responses never overwrite a header that is
/// already on the sink, so this is the content type that goes out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTypeJson;

impl Middleware for ContentTypeJson {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(WithContentType { next })
    }
}

struct WithContentType {
    next: BoxedHandler,
}

impl ErasedHandler for WithContentType {
    fn call<'a>(&'a self, req: Request, w: &'a mut dyn ResponseWriter) -> BoxFuture<'a> {
        w.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self.next.call(req, w)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::handler::Handler;
    use crate::response::Json;
    use crate::writer::ResponseBuffer;

    #[tokio::test]
    async fn sets_json_content_type() {
        let handler = ContentTypeJson.wrap((|_req: Request| async { StatusCode::NO_CONTENT }).into_boxed_handler());
        let mut sink = ResponseBuffer::new();
        let req = http::Request::delete("/books/1").body(Bytes::new()).unwrap().into();
        handler.call(req, &mut sink).await;

        assert_eq!(sink.status(), StatusCode::NO_CONTENT);
        assert_eq!(sink.headers()[CONTENT_TYPE], APPLICATION_JSON);
    }

    #[tokio::test]
    async fn wins_over_handler_content_type() {
        let handler = ContentTypeJson.wrap((|_req: Request| async { Json(vec![1, 2]) }).into_boxed_handler());
        let mut sink = ResponseBuffer::new();
        let req = http::Request::get("/books").body(Bytes::new()).unwrap().into();
        handler.call(req, &mut sink).await;

        assert_eq!(sink.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(sink.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(sink.body(), b"[1,2]");
    }
}
