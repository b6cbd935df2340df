//! Radix-tree request router with route groups.
//!
//! One tree per HTTP method, O(path-length) lookup. On top of that sits a
//! thin mux: root routes, a global middleware chain, and prefix-mounted
//! groups that each carry their own chain.
//!
//! ```text
//! request ─► root tree hit? ──────────────────────────► handler
//!              │ no
//!              ▼
//!            longest matching group prefix
//!              │
//!              ▼
//!            global chain ─► strip prefix ─► group tree ─► group chain ─► handler
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::Full;
use matchit::Router as MatchitRouter;

use crate::group::{normalize_prefix, Group, Routes, Scope};
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::middleware;
use crate::request::Request;
use crate::writer::{ResponseBuffer, ResponseWriter};

// ── RouteTable ───────────────────────────────────────────────────────────────

/// Method + path → handler.
#[derive(Default)]
pub(crate) struct RouteTable {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl RouteTable {
    pub(crate) fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

// ── Mux ───────────────────────────────────────────────────────────────────────

type GroupSetup = Box<dyn FnOnce(Group) -> Group>;

/// The builder handed to [`Router::new`]'s setup closure.
///
/// Root routes and global middleware go through [`Routes`]; groups are
/// declared with [`Mux::group`] and mounted when the router is finalised.
#[derive(Default)]
pub struct Mux {
    scope: Scope,
    groups: Vec<(String, GroupSetup)>,
}

impl Mux {
    /// Declares a group under `prefix`.
    ///
    /// `setup` runs exactly once, when the router is finalised. The group is
    /// then wrapped in the global chain as it stands at that point, so global
    /// middleware always wraps group middleware regardless of call order.
    pub fn group(mut self, prefix: &str, setup: impl FnOnce(Group) -> Group + 'static) -> Self {
        self.groups.push((normalize_prefix(prefix), Box::new(setup)));
        self
    }
}

impl Routes for Mux {
    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

struct Mount {
    prefix: String,
    handler: BoxedHandler,
}

/// The application router.
///
/// Built once at startup and read-only afterwards; pass it to
/// [`Server::serve`](crate::Server::serve).
///
/// ```rust,ignore
/// let router = Router::new(|mux| {
///     mux.with(ContentTypeJson)
///         .group("/api/", |g| g.with(SetRequestId).get("/books", get_books))
/// });
/// ```
pub struct Router {
    table: RouteTable,
    mounts: Vec<Mount>,
}

impl Router {
    pub fn new(setup: impl FnOnce(Mux) -> Mux) -> Self {
        let Mux { scope, groups } = setup(Mux::default());

        let mut mounts: Vec<Mount> = groups
            .into_iter()
            .map(|(prefix, setup)| {
                let group = setup(Group::default());
                let strip = StripPrefix {
                    strip: prefix.len() - 1,
                    table: group.into_table(),
                };
                Mount { prefix, handler: middleware::apply(&scope.chain, Arc::new(strip)) }
            })
            .collect();
        // longest prefix first, so `/api/system/` is tried before `/api/`
        mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Self { table: scope.table, mounts }
    }

    /// Routes `req` and runs the matched handler chain against `w`.
    ///
    /// Unmatched requests get an empty `404`.
    pub async fn dispatch(&self, mut req: Request, w: &mut dyn ResponseWriter) {
        if let Some((handler, params)) = self.table.lookup(req.method(), req.path()) {
            req.params = params;
            return handler.call(req, w).await;
        }
        match self.mounts.iter().find(|m| req.path().starts_with(&m.prefix)) {
            Some(mount) => mount.handler.call(req, w).await,
            None => w.write_status(StatusCode::NOT_FOUND),
        }
    }

    /// Buffers one full request/response exchange.
    pub async fn handle(&self, req: http::Request<Bytes>) -> http::Response<Full<Bytes>> {
        let mut sink = ResponseBuffer::new();
        self.dispatch(req.into(), &mut sink).await;
        sink.into_response()
    }
}

/// Removes a group's prefix (minus its trailing slash) from the routing path
/// and looks the remainder up in the group's own table.
struct StripPrefix {
    strip: usize,
    table: RouteTable,
}

impl ErasedHandler for StripPrefix {
    fn call<'a>(&'a self, mut req: Request, w: &'a mut dyn ResponseWriter) -> BoxFuture<'a> {
        let rest = req.path().get(self.strip..).unwrap_or("/").to_owned();
        match self.table.lookup(req.method(), &rest) {
            Some((handler, params)) => {
                req.set_route(rest, params);
                Box::pin(async move { handler.call(req, w).await })
            }
            None => {
                w.write_status(StatusCode::NOT_FOUND);
                Box::pin(async {})
            }
        }
    }
}
