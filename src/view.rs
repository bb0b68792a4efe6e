//! HTML views.
//!
//! A [`ViewRenderer`] loads every `*.html` file directly inside one directory
//! at startup and renders them by file name:
//!
//! ```rust,no_run
//! use selma::view::ViewRenderer;
//!
//! let views = ViewRenderer::load("views")?;
//! let page = views.render("index.html", &serde_json::json!({ "title": "Home" }))?;
//! # Ok::<(), selma::ViewError>(())
//! ```
//!
//! Templates use Jinja syntax and may `{% extends %}` or `{% include %}` one
//! another by file name. Output is HTML-escaped.

use std::fs;
use std::path::Path;

use minijinja::Environment;
use serde::Serialize;
use tracing::{Span, debug, error, info_span};

use crate::error::ViewError;
use crate::response::Response;

const VIEW_SUFFIX: &str = "html";

/// Templates parsed once, rendered many times.
#[derive(Debug)]
pub struct ViewRenderer {
    env: Environment<'static>,
    names: Vec<String>,
    span: Span,
}

impl ViewRenderer {
    /// Parses every `*.html` file in `dir`. Subdirectories are ignored.
    ///
    /// A directory with no templates yields an empty renderer.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ViewError> {
        Self::load_with_span(dir, info_span!("views"))
    }

    /// [`load`](Self::load), logging under `span`.
    pub fn load_with_span(dir: impl AsRef<Path>, span: Span) -> Result<Self, ViewError> {
        let dir = dir.as_ref();
        let read_dir_err = |source| ViewError::ReadDir { path: dir.to_path_buf(), source };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != VIEW_SUFFIX) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            files.push((name.to_owned(), path.clone()));
        }
        files.sort();

        let mut env = Environment::new();
        let mut names = Vec::with_capacity(files.len());
        for (name, path) in files {
            let source = fs::read_to_string(&path)
                .map_err(|source| ViewError::ReadFile { path: path.clone(), source })?;
            env.add_template_owned(name.clone(), source)
                .map_err(|source| ViewError::Parse { name: name.clone(), source })?;
            debug!(parent: &span, template = %name, "template loaded");
            names.push(name);
        }

        Ok(Self { env, names, span })
    }

    /// Loaded template names, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Renders template `name` with `ctx` into a `200 OK` HTML response.
    pub fn render<C>(&self, name: &str, ctx: &C) -> Result<Response, ViewError>
    where
        C: Serialize + ?Sized,
    {
        self.render_to_string(name, ctx).map(Response::html)
    }

    /// Renders template `name` with `ctx` to a string.
    pub fn render_to_string<C>(&self, name: &str, ctx: &C) -> Result<String, ViewError>
    where
        C: Serialize + ?Sized,
    {
        if !self.contains(name) {
            error!(parent: &self.span, template = name, "template not found");
            return Err(ViewError::NotFound(name.to_owned()));
        }
        let rendered = self
            .env
            .get_template(name)
            .and_then(|template| template.render(ctx));
        rendered.map_err(|source| {
            error!(parent: &self.span, template = name, error = %source, "template render failed");
            ViewError::Render { name: name.to_owned(), source }
        })
    }
}
