//! The application: configuration, store, views and routes in one value.
//!
//! ```rust,no_run
//! use selma::{App, Config, Request, logging};
//!
//! #[tokio::main]
//! async fn main() -> selma::Result<()> {
//!     let config = Config::load("config.json")?;
//!     logging::init(&config.logging, config.mode)?;
//!     let app = App::new(config)?;
//!     app.migrate()?;
//!
//!     app.routes(|router| router.get("/ping", |_req: Request| async { "pong" }))
//!         .serve()
//!         .await
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::migrate::{Migrator, Report, load_migrations};
use crate::persist::Database;
use crate::router::Router;
use crate::server::Server;
use crate::view::ViewRenderer;

pub struct App {
    config: Config,
    db: Arc<Database>,
    views: Option<Arc<ViewRenderer>>,
    router: Router,
}

impl App {
    /// Opens the configured database and, when `views_dir` is set, loads its
    /// templates. Routes start empty.
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::open(&config.database)?;
        let views = match &config.views_dir {
            Some(dir) => {
                let views = ViewRenderer::load(dir)?;
                info!(dir = %dir.display(), templates = views.names().len(), "views loaded");
                Some(Arc::new(views))
            }
            None => None,
        };
        Ok(Self { config, db: Arc::new(db), views, router: Router::new() })
    }

    /// [`Config::load`] followed by [`App::new`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Config::load(path)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared store handle. Clone it into handlers.
    pub fn db(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    /// The loaded views, if `views_dir` was configured. Clone it into handlers.
    pub fn views(&self) -> Option<Arc<ViewRenderer>> {
        self.views.clone()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Registers routes on the app's router.
    pub fn routes(mut self, register: impl FnOnce(Router) -> Router) -> Self {
        self.router = register(self.router);
        self
    }

    /// Applies every pending migration in `migrations_dir`.
    ///
    /// Meant to run once at startup, before [`serve`](App::serve); a failure
    /// should stop the process.
    pub fn migrate(&self) -> Result<Report> {
        let migrations = load_migrations(&self.config.migrations_dir)?;
        let report = Migrator::new().apply(&self.db, &migrations)?;
        info!(
            dir = %self.config.migrations_dir.display(),
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "migrations complete",
        );
        Ok(report)
    }

    /// Serves the registered routes on `server_port` until shutdown.
    pub async fn serve(self) -> Result<()> {
        Server::bind(self.config.addr()).serve(self.router).await
    }
}
