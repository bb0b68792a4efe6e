//! Per-request access logging.
//!
//! Events are emitted under this module's target (`selma::middleware::logging`),
//! which [`logging::init`](crate::logging::init) routes to the middleware log
//! file as well as the console.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Logs method, path, status and latency for every request it wraps.
///
/// Request headers are logged at `debug` level, so they only show up where
/// debug output is enabled (the debug log file in development mode).
pub fn log_requests() -> LogRequests {
    LogRequests
}

/// Middleware built by [`log_requests`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LogRequests;

impl Middleware for LogRequests {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin(async move {
            let method = req.method().to_owned();
            let path = req.path().to_owned();
            debug!(%method, %path, headers = ?req.headers(), "request received");

            let started = Instant::now();
            let res = next.run(req).await;

            info!(
                %method,
                %path,
                status = res.status_code().as_u16(),
                elapsed_us = micros(started.elapsed()),
                "request",
            );
            res
        })
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::handler::Handler;
    use crate::middleware::compose;
    use crate::response::Response;

    #[tokio::test]
    async fn response_passes_through_unchanged() {
        let handler = (|_req: Request| async { StatusCode::ACCEPTED }).into_boxed_handler();
        let chain = compose(handler, &[log_requests().boxed()]);

        let res: Response = chain.call(Request::new("PUT", "/jobs")).await;

        assert_eq!(res.status_code(), StatusCode::ACCEPTED);
    }

    #[test]
    fn latency_saturates_instead_of_wrapping() {
        assert_eq!(micros(Duration::from_millis(3)), 3_000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
