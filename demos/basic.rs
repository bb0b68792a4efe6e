//! Small user API on top of selma: config, logging, migrations, views and a mapper.
//!
//! Run from the crate root with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8080/
//!   curl -X POST http://localhost:8080/users \
//!        -H 'authorization: Bearer demo' \
//!        -d '{"id":1,"name":"alice","email":"alice@example.com"}'
//!   curl -X POST http://localhost:8080/users/lookup -d '{"id":1}'
//!   curl http://localhost:8080/users/lookup          # 404, wrong method

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use selma::middleware::{Middleware, log_requests, require_authorization};
use selma::persist::{Database, Mapper};
use selma::view::ViewRenderer;
use selma::{App, Config, Method, PersistError, Request, Response, StatusCode, logging};

const CONFIG: &str = "demos/config.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
    email: Option<String>,
}

selma::record!(User { id, name, email });

#[derive(Deserialize)]
struct Lookup {
    id: i64,
}

/// Everything a user handler needs, shared by every request.
struct Users {
    db: Arc<Database>,
    mapper: Mapper<User>,
}

#[tokio::main]
async fn main() -> selma::Result<()> {
    // Logging first, so template loads and migrations are recorded.
    let config = Config::load(CONFIG)?;
    logging::init(&config.logging, config.mode)?;
    let app = App::new(config)?;
    app.migrate()?;

    let users = Arc::new(Users { db: app.db(), mapper: Mapper::new("users")? });

    let save = {
        let users = Arc::clone(&users);
        move |req: Request| {
            let users = Arc::clone(&users);
            async move { save_user(&users, req) }
        }
    };
    let lookup = move |req: Request| {
        let users = Arc::clone(&users);
        async move { find_user(&users, req) }
    };
    let index = app.views().map(|views| {
        move |_req: Request| {
            let views: Arc<ViewRenderer> = Arc::clone(&views);
            async move {
                views.render("index.html", &serde_json::json!({ "title": "selma users" }))
            }
        }
    });

    app.routes(|router| {
        let router = match index {
            Some(index) => router.get("/", index),
            None => router,
        };
        router
            .on_with(
                Method::Post,
                "/users",
                save,
                [log_requests().boxed(), require_authorization().boxed()],
            )
            .on_with(Method::Post, "/users/lookup", lookup, [log_requests().boxed()])
    })
    .serve()
    .await
}

// POST /users: insert or overwrite one user.
fn save_user(users: &Users, req: Request) -> Result<Response, PersistError> {
    let Ok(user) = serde_json::from_slice::<User>(req.body()) else {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    };
    users.mapper.upsert(&users.db, &user)?;
    Ok(Response::status(StatusCode::NO_CONTENT))
}

// POST /users/lookup: the path is matched exactly, so the id travels in the body.
fn find_user(users: &Users, req: Request) -> Result<Response, PersistError> {
    let Ok(Lookup { id }) = serde_json::from_slice(req.body()) else {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    };
    let user = users.mapper.find_by_id(&users.db, id)?;
    match serde_json::to_vec(&user) {
        Ok(body) => Ok(Response::json(body)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialise user");
            Ok(Response::status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}
