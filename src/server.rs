//! HTTP server and graceful shutdown.
//!
//! On **SIGTERM** or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::FutureExt;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::time::error::Elapsed;
use tracing::{error, info, warn};

use crate::books::ApiError;
use crate::error::Error;
use crate::response::IntoResponse;
use crate::router::Router;
use crate::writer::ResponseBuffer;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, read_timeout: None, write_timeout: None }
    }

    /// Maximum time a client may take to send the request headers.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Maximum time from receiving a request to having its response ready.
    /// When it elapses the connection is closed without an answer.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);

        let mut builder = ConnBuilder::new(TokioExecutor::new());
        if let Some(timeout) = self.read_timeout {
            builder.http1().timer(TokioTimer::new()).header_read_timeout(timeout);
        }
        let builder = Arc::new(builder);
        let write_timeout = self.write_timeout;

        info!(addr = %self.addr, "booksapi listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // shutdown is checked first so a SIGTERM stops accepting at once
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let builder = Arc::clone(&builder);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // called once per request on the connection
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, write_timeout).await }
                        });

                        if let Err(e) = builder.serve_connection(io, svc).await {
                            warn!(peer = %remote_addr, "connection closed: {e}");
                        }
                    });
                }

                // reap finished tasks so the set does not grow without bound
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("booksapi stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers the request body and runs one request through the router.
///
/// A handler panic is answered with a `500` envelope and leaves the
/// connection usable. The only error is an elapsed write timeout, which
/// makes hyper drop the connection.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    write_timeout: Option<Duration>,
) -> Result<http::Response<Full<Bytes>>, Elapsed> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return Ok(status_only(StatusCode::BAD_REQUEST));
        }
    };
    let req = http::Request::from_parts(parts, body);
    let (method, path) = (req.method().clone(), req.uri().path().to_owned());

    let handled = AssertUnwindSafe(router.handle(req)).catch_unwind();
    let outcome = match write_timeout {
        Some(timeout) => tokio::time::timeout(timeout, handled).await.inspect_err(|_| {
            warn!(?timeout, "write timeout elapsed, dropping connection");
        })?,
        None => handled.await,
    };

    Ok(outcome.unwrap_or_else(|panic| {
        error!(%method, %path, panic = panic_message(&*panic), "handler panicked");
        internal_error()
    }))
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn internal_error() -> http::Response<Full<Bytes>> {
    let mut sink = ResponseBuffer::new();
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        .into_response()
        .write_to(&mut sink);
    sink.into_response()
}

fn status_only(status: StatusCode) -> http::Response<Full<Bytes>> {
    let mut res = http::Response::new(Full::new(Bytes::new()));
    *res.status_mut() = status;
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. A signal that cannot be installed is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
