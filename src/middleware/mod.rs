//! Middleware layer.
//!
//! A middleware turns "the rest of the chain" into a new handler. It receives
//! the request together with a [`Next`], and may:
//!
//! - work before delegating with `next.run(req).await`,
//! - inspect or rewrite the response after it returns,
//! - or short-circuit by returning its own response without calling `next`.
//!
//! Routes compose their middleware once, at registration time. The first
//! middleware registered is the **outermost** layer: for `[a, b]` around `h`
//! the order is `a`-before, `b`-before, `h`, `b`-after, `a`-after.
//!
//! ```rust
//! use selma::{Method, Request, Response, Router};
//! use selma::middleware::{self, Middleware, Next};
//!
//! async fn admin(_req: Request) -> Response { Response::text("welcome") }
//!
//! let audit = middleware::from_fn(|req: Request, next: Next| async move {
//!     tracing::info!(path = req.path(), "admin access");
//!     next.run(req).await
//! });
//!
//! let router = Router::new().on_with(
//!     Method::Get,
//!     "/admin",
//!     admin,
//!     [middleware::require_authorization().boxed(), audit.boxed()],
//! );
//! ```

mod auth;
mod logging;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::IntoResponse;

pub use crate::handler::BoxFuture;
pub use auth::{RequireAuthorization, require_authorization};
pub use logging::{LogRequests, log_requests};

/// A handler-wrapping interceptor.
///
/// Any state a middleware needs is captured when it is constructed; the
/// same instance serves every request on its routes concurrently.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;

    /// Type-erases `self` so middleware of different types can share a list.
    fn boxed(self) -> BoxedMiddleware
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the chain below the current middleware.
pub struct Next {
    inner: BoxedHandler,
}

impl Next {
    /// Passes the request on and resolves to the inner response.
    pub fn run(self, req: Request) -> BoxFuture {
        self.inner.call(req)
    }
}

/// Adapts an async closure into a [`Middleware`].
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FromFn(f)
}

/// Middleware built by [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut, R> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// One middleware bound to the handler it wraps.
struct Layer {
    middleware: BoxedMiddleware,
    next: BoxedHandler,
}

impl ErasedHandler for Layer {
    fn call(&self, req: Request) -> BoxFuture {
        let next = Next { inner: Arc::clone(&self.next) };
        self.middleware.handle(req, next)
    }
}

/// Wraps `handler` in `layers`, innermost last.
///
/// Iterates in reverse so that `layers[0]` ends up outermost.
pub(crate) fn compose(handler: BoxedHandler, layers: &[BoxedMiddleware]) -> BoxedHandler {
    layers.iter().rev().fold(handler, |next, middleware| {
        Arc::new(Layer { middleware: Arc::clone(middleware), next }) as BoxedHandler
    })
}
