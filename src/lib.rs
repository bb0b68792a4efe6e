//! # selma
//!
//! A small server-side framework: exact-match routing with composable
//! middleware, record persistence over SQLite and a forward-only migration
//! runner.
//!
//! ## Pieces
//!
//! - [`Router`]: `(method, path)` to handler, exact match only. Anything
//!   unregistered is `404 page not found`.
//! - [`middleware`]: interceptors wrapped around a handler. The first one
//!   registered runs outermost.
//! - [`persist`]: [`Record`](persist::Record) types mapped onto a table with
//!   `upsert` and `find_by_id`.
//! - [`migrate`]: `*.sql` files applied once each, in file-name order.
//! - [`view`]: `*.html` templates loaded at startup and rendered by name.
//! - [`App`]: config, database and router together, with `migrate` and
//!   `serve` for startup.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use selma::{Method, Request, Response, Router, Server, StatusCode};
//! use selma::middleware::{Middleware, log_requests, require_authorization};
//!
//! #[tokio::main]
//! async fn main() -> selma::Result<()> {
//!     let app = Router::new()
//!         .on(Method::Get, "/users", list_users)
//!         .on_with(
//!             Method::Post,
//!             "/users",
//!             create_user,
//!             [log_requests().boxed(), require_authorization().boxed()],
//!         );
//!
//!     Server::bind(([0, 0, 0, 0], 3000)).serve(app).await
//! }
//!
//! async fn list_users(_req: Request) -> Response {
//!     Response::json(b"[]".to_vec())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(req.body().to_vec())
//! }
//! ```

mod app;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod logging;
pub mod middleware;
pub mod migrate;
pub mod persist;
pub mod view;

pub use app::App;
pub use config::{Config, DatabaseConfig, LoggingConfig, Mode};
pub use error::{ConfigError, Error, MigrationError, PersistError, Result, ViewError};
pub use handler::Handler;
pub use http::StatusCode;
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
