//! Route registration surface shared by the root mux and route groups.

use std::sync::Arc;

use http::Method;

use crate::handler::Handler;
use crate::middleware::{self, BoxedMiddleware, Middleware};
use crate::router::RouteTable;

/// Route table plus the middleware chain registrations are wrapped in.
#[doc(hidden)]
#[derive(Default)]
pub struct Scope {
    pub(crate) table: RouteTable,
    pub(crate) chain: Vec<BoxedMiddleware>,
}

impl Scope {
    fn register(&mut self, method: Method, path: &str, handler: impl Handler) {
        let handler = middleware::apply(&self.chain, handler.into_boxed_handler());
        self.table.insert(method, path, handler);
    }
}

/// `with`/`on` registration, implemented by [`Mux`](crate::Mux) and [`Group`].
///
/// Middleware only wraps handlers registered *after* it was added:
///
/// ```rust,ignore
/// group
///     .get("/plain", plain)        // no middleware
///     .with(AuditLog)
///     .get("/books", get_books);   // AuditLog(get_books)
/// ```
pub trait Routes: Sized {
    #[doc(hidden)]
    fn scope_mut(&mut self) -> &mut Scope;

    /// Appends `m` to this scope's middleware chain.
    fn with(mut self, m: impl Middleware) -> Self {
        self.scope_mut().chain.push(Arc::new(m));
        self
    }

    /// Registers `handler` for `method` + `path`, wrapped in the current chain.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid pattern or conflicts with a route
    /// already registered for `method`.
    fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.scope_mut().register(method, path, handler);
        self
    }

    fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }
}

/// A sub-router mounted under a path prefix.
///
/// Paths registered on a group are relative to the prefix: inside the
/// `/api/` group, `/books/{id}` answers `GET /api/books/7`.
#[derive(Default)]
pub struct Group {
    scope: Scope,
}

impl Group {
    pub(crate) fn into_table(self) -> RouteTable {
        self.scope.table
    }
}

impl Routes for Group {
    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

/// `"/api"` and `"/api/"` both become `"/api/"`.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    match prefix.trim_matches('/') {
        "" => "/".to_owned(),
        inner => format!("/{inner}/"),
    }
}
