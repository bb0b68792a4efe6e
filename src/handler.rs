//! Route handlers.
//!
//! A handler is any `Fn(Request) -> impl Future<Output = impl IntoResponse>`
//! that is `Send + Sync + 'static`: an `async fn`, or a closure that clones
//! its captured state into an `async move` block.
//!
//! Registration erases the concrete type. Both a bare handler and a handler
//! wrapped in middleware end up as the same [`BoxedHandler`]:
//!
//! ```text
//! router.on_with(method, path, save_user, [auth])
//!   save_user.into_boxed_handler()        FnHandler(save_user)
//!   middleware::compose(handler, [auth])  Layer { auth, next: FnHandler }
//!   routes[path][method] = Route { handler }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The boxed future every handler and middleware resolves through.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe form of a handler. Middleware layers implement it too.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Satisfied by every function or closure usable as a route handler.
///
/// Sealed: the blanket impl is the only one.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::StatusCode;

    use super::*;
    use crate::error::PersistError;

    async fn echo_path(req: Request) -> String {
        req.path().to_owned()
    }

    #[tokio::test]
    async fn async_fn_output_is_converted() {
        let handler = echo_path.into_boxed_handler();
        let res = handler.call(Request::new("GET", "/echo")).await;
        assert_eq!(res.body(), b"/echo");
    }

    #[tokio::test]
    async fn closures_keep_their_state_across_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = (move |_req: Request| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { n.to_string() }
        })
        .into_boxed_handler();

        handler.call(Request::new("GET", "/")).await;
        let res = handler.call(Request::new("GET", "/")).await;

        assert_eq!(res.body(), b"2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fallible_handlers_answer_with_their_error() {
        let handler = (|req: Request| async move {
            if req.header("x-missing").is_some() {
                Err(PersistError::NotFound { table: "users".into(), id: "9".into() })
            } else {
                Ok(StatusCode::NO_CONTENT)
            }
        })
        .into_boxed_handler();

        let ok = handler.call(Request::new("DELETE", "/users")).await;
        assert_eq!(ok.status_code(), StatusCode::NO_CONTENT);

        let missing = handler
            .call(Request::new("DELETE", "/users").with_header("x-missing", "1"))
            .await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }
}
