//! PostgreSQL connection pool.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::system::Dependency;

/// The shared connection pool plus what the health endpoint reports about it.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    name: String,
    address: String,
}

impl Database {
    /// Builds the pool without opening a connection; the first query does.
    /// Startup therefore never blocks on the database being reachable.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.pass)
            .database(&config.db)
            .application_name(env!("CARGO_PKG_NAME"));

        let pool = PgPoolOptions::new()
            .max_connections(config.max_pool_size)
            .connect_lazy_with(options);

        let address = format!("{}:{}/{}", config.host, config.port, config.db);
        info!(%address, max_connections = config.max_pool_size, "database pool initialized");

        Self { pool, name: config.db.clone(), address }
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Dependency for Database {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn ping(&self) -> Result<(), String> {
        let mut conn = self.pool.acquire().await.map_err(|e| e.to_string())?;
        conn.ping().await.map_err(|e| e.to_string())
    }
}
