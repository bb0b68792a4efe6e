//! Exact-match request router.
//!
//! Two nested hash lookups: path, then method. No patterns, no parameters,
//! no trailing-slash normalisation. `/users` and `/users/` are different
//! routes, and a path registered only for `GET` answers `POST` with the same
//! `404` as a path that was never registered.

use std::collections::HashMap;

use tracing::{Span, debug, info_span};

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{self, BoxedMiddleware};
use crate::request::Request;
use crate::response::Response;

/// A registered handler with its middleware already composed around it.
struct Route {
    handler: BoxedHandler,
}

/// The application router.
///
/// Build it once at startup and hand it to [`Server::serve`](crate::Server::serve).
/// Registration takes `self` by value, so once the router is moved into the
/// server the table is frozen and concurrent dispatch needs no locking.
///
/// ```rust
/// use selma::{Method, Request, Response, Router, StatusCode};
///
/// async fn list_users(_req: Request) -> Response { Response::json(b"[]".to_vec()) }
/// async fn create_user(_req: Request) -> StatusCode { StatusCode::CREATED }
///
/// let router = Router::new()
///     .get("/users", list_users)
///     .on(Method::Post, "/users", create_user);
/// assert_eq!(router.len(), 2);
/// ```
pub struct Router {
    routes: HashMap<String, HashMap<Method, Route>>,
    span: Span,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), span: info_span!("router") }
    }

    /// Replaces the span that registration and dispatch events are logged under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Registers `handler` for an exact (method, path) pair.
    ///
    /// A second registration for the same pair replaces the first.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.on_with(method, path, handler, std::iter::empty::<BoxedMiddleware>())
    }

    /// Registers `handler` wrapped in `middleware`, first element outermost.
    ///
    /// The chain is composed here, once; requests only walk it.
    pub fn on_with(
        mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        middleware: impl IntoIterator<Item = BoxedMiddleware>,
    ) -> Self {
        let layers: Vec<BoxedMiddleware> = middleware.into_iter().collect();
        let route = Route {
            handler: middleware::compose(handler.into_boxed_handler(), &layers),
        };

        let previous = self.routes.entry(path.to_owned()).or_default().insert(method, route);
        if previous.is_some() {
            debug!(parent: &self.span, %method, path, layers = layers.len(), "route replaced");
        } else {
            debug!(parent: &self.span, %method, path, layers = layers.len(), "route registered");
        }
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Number of registered (method, path) pairs.
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a route exists for this raw method string and path.
    pub fn contains(&self, method: &str, path: &str) -> bool {
        self.resolve(method, path).is_some()
    }

    fn resolve(&self, method: &str, path: &str) -> Option<&BoxedHandler> {
        let methods = self.routes.get(path)?;
        let method: Method = method.parse().ok()?;
        methods.get(&method).map(|route| &route.handler)
    }

    /// Routes one request and produces one response.
    ///
    /// Any miss (unknown path, unregistered method, unparseable method) is
    /// answered with [`Response::not_found`].
    pub async fn dispatch(&self, req: Request) -> Response {
        match self.resolve(req.method(), req.path()) {
            Some(handler) => handler.call(req).await,
            None => {
                debug!(parent: &self.span, method = req.method(), path = req.path(), "no route");
                Response::not_found()
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::StatusCode;

    use super::*;

    fn counting(label: &'static str, hits: Arc<AtomicUsize>) -> impl Handler {
        move |_req: Request| {
            hits.fetch_add(1, Ordering::SeqCst);
            async move { Response::text(label) }
        }
    }

    #[tokio::test]
    async fn exact_pair_invokes_handler_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new().get("/users", counting("users", Arc::clone(&hits)));

        let res = router.dispatch(Request::new("GET", "/users")).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"users");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_other_pair_is_not_found() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .get("/users", counting("users", Arc::clone(&hits)))
            .post("/sessions", counting("sessions", Arc::clone(&hits)));

        for (method, path) in [
            ("POST", "/users"),
            ("GET", "/sessions"),
            ("GET", "/users/"),
            ("GET", "/Users"),
            ("GET", "/users?x=1"),
            ("get", "/users"),
            ("BREW", "/users"),
            ("GET", ""),
        ] {
            let res = router.dispatch(Request::new(method, path)).await;
            assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{method} {path}");
            assert_eq!(res.body(), b"404 page not found\n");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn same_path_dispatches_by_method() {
        let router = Router::new()
            .get("/items", |_req: Request| async { "list" })
            .post("/items", |_req: Request| async { StatusCode::CREATED })
            .delete("/items", |_req: Request| async { StatusCode::NO_CONTENT });

        assert_eq!(router.dispatch(Request::new("GET", "/items")).await.body(), b"list");
        assert_eq!(
            router.dispatch(Request::new("POST", "/items")).await.status_code(),
            StatusCode::CREATED,
        );
        assert_eq!(
            router.dispatch(Request::new("DELETE", "/items")).await.status_code(),
            StatusCode::NO_CONTENT,
        );
        assert_eq!(
            router.dispatch(Request::new("PUT", "/items")).await.status_code(),
            StatusCode::NOT_FOUND,
        );
    }

    #[tokio::test]
    async fn re_registration_replaces_route() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .get("/", counting("first", Arc::clone(&first)))
            .get("/", counting("second", Arc::clone(&second)));

        let res = router.dispatch(Request::new("GET", "/")).await;

        assert_eq!(res.body(), b"second");
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(router.len(), 1);
    }

    #[tokio::test]
    async fn any_string_is_a_valid_path() {
        let router = Router::new().get("not a path {at} all", |_req: Request| async { "odd" });

        assert!(router.contains("GET", "not a path {at} all"));
        let res = router.dispatch(Request::new("GET", "not a path {at} all")).await;
        assert_eq!(res.body(), b"odd");
    }

    #[tokio::test]
    async fn route_middleware_runs_only_on_its_route() {
        use crate::middleware::{Middleware, Next, from_fn};

        let gate = from_fn(|_req: Request, _next: Next| async { StatusCode::UNAUTHORIZED });
        let router = Router::new()
            .on_with(Method::Get, "/private", |_req: Request| async { "secret" }, [gate.boxed()])
            .get("/public", |_req: Request| async { "hello" });

        assert_eq!(
            router.dispatch(Request::new("GET", "/private")).await.status_code(),
            StatusCode::UNAUTHORIZED,
        );
        assert_eq!(router.dispatch(Request::new("GET", "/public")).await.body(), b"hello");
    }

    #[test]
    fn empty_router() {
        let router = Router::default();
        assert!(router.is_empty());
        assert!(!router.contains("GET", "/"));
    }
}
