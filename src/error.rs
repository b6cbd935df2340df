//! Unified infrastructure error type.

use thiserror::Error;

/// The error type returned by the service's fallible plumbing.
///
/// Application-level errors (400, 404, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: reading configuration, installing logging,
/// binding to a port.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_message() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "io: port taken");
    }

    #[test]
    fn toml_errors_are_config_errors() {
        let toml_err = "not = [valid".parse::<toml::Value>().unwrap_err();
        let err: Error = toml_err.into();
        assert!(matches!(err, Error::Toml(_)));
        assert!(err.to_string().starts_with("config: "));
    }
}
