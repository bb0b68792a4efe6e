//! `Authorization`-header gate.

use http::StatusCode;
use tracing::debug;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// Rejects requests that carry no `Authorization` header with `403 Forbidden`.
///
/// Only presence is checked. Validating the credential is the job of a
/// middleware further in, or of the handler.
pub fn require_authorization() -> RequireAuthorization {
    RequireAuthorization
}

/// Middleware built by [`require_authorization`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireAuthorization;

impl Middleware for RequireAuthorization {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let present = req.header("authorization").is_some_and(|v| !v.trim().is_empty());
        if present {
            return next.run(req);
        }
        debug!(method = req.method(), path = req.path(), "missing authorization header");
        Box::pin(async {
            Response::builder().status(StatusCode::FORBIDDEN).text("Forbidden\n")
        })
    }
}
