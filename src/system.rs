//! System info and health endpoints.
//!
//! ```text
//! GET /about   → {"product":"Books Api","author":…,"version":…,"buildDatetime":…}
//! GET /health  → {"dependencies":[{"name":…,"healthStatus":{"healthy":…,"err":…},"address":…}]}
//! ```
//!
//! Health always answers `200 OK`; the per-dependency status is in the body,
//! so a probe can distinguish "process down" from "database down".

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;

use crate::group::Routes;
use crate::handler::bind;
use crate::request::Request;
use crate::response::Json;

/// Something the service needs in order to be useful, e.g. its database.
#[async_trait]
pub trait Dependency: Send + Sync {
    fn name(&self) -> &str;
    fn address(&self) -> &str;
    /// `Err` carries the reason the dependency is unreachable.
    async fn ping(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub product: String,
    pub author: String,
    pub version: String,
    pub build_datetime: String,
}

impl Default for About {
    fn default() -> Self {
        Self {
            product: "Books Api".to_owned(),
            author: "VPavliashvili".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            build_datetime: option_env!("BOOKSAPI_BUILD_DATETIME").unwrap_or("unknown").to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub err: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyHealth {
    pub name: String,
    pub health_status: HealthStatus,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub dependencies: Vec<DependencyHealth>,
}

/// HTTP handlers for the system resource.
pub struct SystemApi {
    about: About,
    dependencies: Vec<Arc<dyn Dependency>>,
}

impl SystemApi {
    pub fn new(about: About, dependencies: Vec<Arc<dyn Dependency>>) -> Self {
        Self { about, dependencies }
    }

    /// `GET /about`
    pub async fn about(self: Arc<Self>, _req: Request) -> Json<About> {
        Json(self.about.clone())
    }

    /// `GET /health`, pings every dependency concurrently.
    pub async fn health(self: Arc<Self>, _req: Request) -> Json<Health> {
        let checks = self.dependencies.iter().map(|dep| async move {
            let health_status = match dep.ping().await {
                Ok(()) => HealthStatus { healthy: true, err: String::new() },
                Err(err) => {
                    tracing::warn!(dependency = dep.name(), error = %err, "dependency unhealthy");
                    HealthStatus { healthy: false, err }
                }
            };
            DependencyHealth {
                name: dep.name().to_owned(),
                health_status,
                address: dep.address().to_owned(),
            }
        });
        Json(Health { dependencies: join_all(checks).await })
    }
}

/// Registers `/about` and `/health` on `routes`.
pub fn routes<R: Routes>(routes: R, api: &Arc<SystemApi>) -> R {
    routes
        .get("/health", bind(api, SystemApi::health))
        .get("/about", bind(api, SystemApi::about))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::response::IntoResponse;

    struct Fixed {
        name: &'static str,
        result: Result<(), &'static str>,
    }

    #[async_trait]
    impl Dependency for Fixed {
        fn name(&self) -> &str { self.name }
        fn address(&self) -> &str { "localhost:5432/books" }
        async fn ping(&self) -> Result<(), String> {
            self.result.map_err(str::to_owned)
        }
    }

    fn request() -> Request {
        http::Request::get("/health").body(Bytes::new()).unwrap().into()
    }

    #[tokio::test]
    async fn health_reports_each_dependency() {
        let api = Arc::new(SystemApi::new(
            About::default(),
            vec![
                Arc::new(Fixed { name: "books", result: Ok(()) }),
                Arc::new(Fixed { name: "cache", result: Err("connection refused") }),
            ],
        ));

        let res = api.health(request()).await.into_response();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(
            std::str::from_utf8(res.body()).unwrap(),
            concat!(
                r#"{"dependencies":["#,
                r#"{"name":"books","healthStatus":{"healthy":true,"err":""},"address":"localhost:5432/books"},"#,
                r#"{"name":"cache","healthStatus":{"healthy":false,"err":"connection refused"},"address":"localhost:5432/books"}"#,
                r#"]}"#,
            )
        );
    }

    #[tokio::test]
    async fn health_without_dependencies_is_empty_list() {
        let api = Arc::new(SystemApi::new(About::default(), Vec::new()));
        let res = api.health(request()).await.into_response();
        assert_eq!(res.body(), br#"{"dependencies":[]}"#);
    }

    #[tokio::test]
    async fn about_describes_the_build() {
        let about = About { build_datetime: "2024-05-01T10:00:00Z".into(), ..About::default() };
        let api = Arc::new(SystemApi::new(about, Vec::new()));
        let res = api.about(request()).await.into_response();
        let expected = format!(
            r#"{{"product":"Books Api","author":"VPavliashvili","version":"{}","buildDatetime":"2024-05-01T10:00:00Z"}}"#,
            env!("CARGO_PKG_VERSION")
        );
        assert_eq!(std::str::from_utf8(res.body()).unwrap(), expected);
    }
}
