//! Service configuration, loaded from TOML.
//!
//! `{{ VAR }}` placeholders are replaced with environment variables before the
//! file is parsed, so secrets stay out of the file:
//!
//! ```toml
//! [http]
//! port = 6012
//! read_timeout = "10s"
//!
//! [logging]
//! format = "json"
//!
//! [database]
//! user = "books"
//! pass = "{{ BOOKSAPI_DB_PASS }}"
//! host = "localhost"
//! db = "booksdb"
//! ```

use std::env;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        text.parse()
    }

    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        self.database.validate()?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = replace_handlebars_with_env(s);
        Ok(toml::from_str(&text)?)
    }
}

/// Replaces every `{{ VAR }}` with the value of `VAR`, or with an empty string
/// (and a warning) when it is not set.
pub fn replace_handlebars_with_env(input: &str) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            let name = &caps[1];
            env::var(name).unwrap_or_else(|_| {
                warn!(variable = %name, "environment variable not set, substituting empty string");
                String::new()
            })
        })
        .into_owned()
}

// ── [http] ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Time allowed for a client to send the request headers.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Time allowed to produce the whole response.
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 6012,
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
        }
    }
}

impl HttpConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("[http] port must be > 0"));
        }
        Ok(())
    }
}

// ── [logging] ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, used when `RUST_LOG` is not set.
    pub level: String,
    pub enable_console: bool,
    /// Also write JSON lines to this file.
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_owned(),
            enable_console: true,
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Default,
    Json,
    Compact,
    Pretty,
}

// ── [database] ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub user: String,
    pub pass: String,
    pub host: String,
    pub port: u16,
    pub db: String,
    pub max_pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: "postgres".to_owned(),
            pass: String::new(),
            host: "localhost".to_owned(),
            port: 5432,
            db: "booksdb".to_owned(),
            max_pool_size: 5,
        }
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("[database] host is required"));
        }
        if self.db.trim().is_empty() {
            return Err(Error::config("[database] db is required"));
        }
        if self.max_pool_size == 0 {
            return Err(Error::config("[database] max_pool_size must be > 0"));
        }
        Ok(())
    }
}
