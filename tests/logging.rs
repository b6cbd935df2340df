//! Global subscriber installation. Runs in its own test binary, since it
//! owns the process-wide subscriber.

use booksapi::config::LoggingConfig;
use booksapi::{logging, Error};

#[test]
fn second_install_is_reported() {
    let config = LoggingConfig { enable_console: false, ..LoggingConfig::default() };

    let guard = logging::init(&config).unwrap();
    assert!(guard.is_none());

    let err = logging::init(&config).unwrap_err();
    assert!(matches!(err, Error::Logging(_)), "{err}");
    assert!(err.to_string().starts_with("logging: "));
}
