//! # booksapi
//!
//! A small books CRUD service built on a minimal router.
//!
//! ## The router
//!
//! Routes are registered once, at startup, through a setup closure. Root
//! routes and global middleware go on the mux; everything else lives in
//! prefix-mounted groups with their own middleware:
//!
//! ```rust,no_run
//! use booksapi::middleware::{AuditLog, ContentTypeJson, SetRequestId};
//! use booksapi::{Request, Response, Router, Routes, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new(|mux| {
//!         mux.with(ContentTypeJson)
//!             .group("/api/", |g| {
//!                 g.with(SetRequestId)
//!                     .with(AuditLog)
//!                     .get("/books/{id}", get_book)
//!             })
//!     });
//!
//!     let addr = "0.0.0.0:6012".parse().unwrap();
//!     Server::bind(addr).serve(router).await.unwrap();
//! }
//!
//! async fn get_book(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//! ```
//!
//! What matters:
//!
//! - **Ordering**: middleware wraps only the handlers registered after it;
//!   the first one added is the outermost.
//! - **Groups**: the group prefix is stripped before the group's own routes
//!   are matched; global middleware wraps group middleware.
//! - **Response sink**: middleware sees the response as it is written, so
//!   [`AuditLog`](middleware::AuditLog) can log exactly what went out.
//!
//! ## The service
//!
//! [`app`] wires the books and system resources onto a router. The binary
//! loads [`Config`], installs logging and serves it.

mod app;
mod error;
mod group;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod writer;

pub mod books;
pub mod config;
pub mod database;
pub mod logging;
pub mod middleware;
pub mod system;

pub use app::{app, AppState};
pub use config::Config;
pub use error::{Error, Result};
pub use group::{Group, Routes};
pub use handler::{bind, BoxFuture, BoxedHandler, ErasedHandler, Handler};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::{Mux, Router};
pub use server::Server;
pub use writer::{ResponseBuffer, ResponseWrapper, ResponseWriter};
