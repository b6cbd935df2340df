//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The router needs to hold handlers of *different* types in a single
//! `HashMap<Method, Tree>`, and middleware needs to wrap any of them. Both
//! work on **trait objects** (`dyn ErasedHandler`):
//!
//! ```text
//! async fn get_book(req: Request) -> Response { … }   ← user writes this
//!        ↓ group.get("/books/{id}", get_book)
//! get_book.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(get_book))                       ← heap-allocated wrapper
//!        ↓  middleware::apply(chain, handler)
//! Arc<dyn ErasedHandler>  (decorated)                 ← stored in the tree
//!        ↓
//! handler.call(req, &mut sink)  at request time       ← one vtable dispatch per layer
//! ```
//!
//! A plain handler returns a [`Response`]; its `FnHandler` writes that
//! response into the sink. Middleware implement [`ErasedHandler`] directly,
//! so they see the sink and can wrap it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::IntoResponse;
use crate::writer::ResponseWriter;

/// A heap-allocated, type-erased future borrowing the request's sink.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// The unit the middleware chain decorates.
///
/// Implement this for the handler a [`Middleware`](crate::middleware::Middleware)
/// returns from `wrap`: do work, call `next.call(req, w)` (or don't, to
/// short-circuit), do more work.
pub trait ErasedHandler: Send + Sync + 'static {
    fn call<'a>(&'a self, req: Request, w: &'a mut dyn ResponseWriter) -> BoxFuture<'a>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Adapts a method taking shared state into a handler.
///
/// ```rust,ignore
/// let api = Arc::new(BooksApi::new(store));
/// group.get("/books", handler::bind(&api, BooksApi::get_books))
/// ```
pub fn bind<S, F, Fut, R>(state: &Arc<S>, f: F) -> impl Handler + use<S, F, Fut, R>
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let state = Arc::clone(state);
    move |req: Request| f(Arc::clone(&state), req)
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call<'a>(&'a self, req: Request, w: &'a mut dyn ResponseWriter) -> BoxFuture<'a> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response().write_to(w) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;
    use crate::writer::ResponseBuffer;
    use bytes::Bytes;
    use http::StatusCode;

    struct Greeter {
        name: &'static str,
    }

    impl Greeter {
        async fn greet(self: Arc<Self>, _req: Request) -> Response {
            Response::text(format!("hello {}", self.name))
        }
    }

    fn request() -> Request {
        http::Request::get("/").body(Bytes::new()).unwrap().into()
    }

    #[tokio::test]
    async fn fn_handler_writes_response_into_sink() {
        let handler = (|_req: Request| async { (StatusCode::ACCEPTED, "queued") }).into_boxed_handler();
        let mut sink = ResponseBuffer::new();
        handler.call(request(), &mut sink).await;
        assert_eq!(sink.status(), StatusCode::ACCEPTED);
        assert_eq!(sink.body(), b"queued");
    }

    #[tokio::test]
    async fn bind_passes_shared_state() {
        let greeter = Arc::new(Greeter { name: "tolkien" });
        let handler = bind(&greeter, Greeter::greet).into_boxed_handler();
        let mut sink = ResponseBuffer::new();
        handler.call(request(), &mut sink).await;
        assert_eq!(sink.body(), b"hello tolkien");
        assert_eq!(Arc::strong_count(&greeter), 2);
    }
}
