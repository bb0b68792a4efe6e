//! Where `logging::init` sends events in production mode.
//!
//! Separate binary from `tests/logging.rs`: the subscriber is global.

use std::fs;

use selma::middleware::{Middleware, log_requests};
use selma::{Error, LoggingConfig, Method, Mode, Request, Router, logging};

#[tokio::test]
async fn production_writes_no_debug_file_and_skips_disabled_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        directory: dir.path().join("logs"),
        system: Some("system.log".to_owned()),
        middleware: None,
        debug: Some("debug.log".to_owned()),
    };
    logging::init(&config, Mode::Production).unwrap();

    let router = Router::new().on_with(
        Method::Get,
        "/ping",
        |_req: Request| async { "pong" },
        [log_requests().boxed()],
    );
    router.dispatch(Request::new("GET", "/ping")).await;

    let system = fs::read_to_string(config.directory.join("system.log")).unwrap();
    assert!(system.contains("status=200"), "{system}");
    assert!(!system.contains("route registered"), "{system}");

    assert!(!config.directory.join("debug.log").exists());
    assert!(!config.directory.join("middleware.log").exists());

    // A second subscriber cannot be installed.
    let err = logging::init(&config, Mode::Production).unwrap_err();
    assert!(matches!(err, Error::Logging(_)), "{err}");
}
