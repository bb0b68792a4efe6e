use std::fs;
use std::sync::Arc;

use selma::middleware::{self, Middleware, Next, require_authorization};
use selma::persist::{Database, Mapper, Value, Values};
use selma::{App, Method, PersistError, Request, Response, StatusCode};
use tempfile::TempDir;

#[derive(Debug, Default, PartialEq)]
struct Account {
    id: i64,
    owner: String,
    balance: i64,
}

selma::record!(Account { id, owner, balance });

/// Writes a config file plus a migrations directory into a fresh temp dir.
fn setup() -> (TempDir, App) {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    fs::write(
        migrations.join("001_accounts.sql"),
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY, owner TEXT NOT NULL);",
    )
    .unwrap();
    fs::write(
        migrations.join("002_balance.sql"),
        "ALTER TABLE accounts ADD COLUMN balance INTEGER NOT NULL DEFAULT 0;",
    )
    .unwrap();

    let config = serde_json::json!({
        "mode": "production",
        "server_port": 18080,
        "migrations_dir": migrations,
        "logging": { "directory": dir.path().join("logs") },
        "database": { "path": dir.path().join("app.db") },
    });
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, config.to_string()).unwrap();

    let app = App::load(&config_path).unwrap();
    (dir, app)
}

fn account_routes(app: App) -> App {
    let db = app.db();
    let mapper = Arc::new(Mapper::<Account>::new("accounts").unwrap());

    let deposit_route = {
        let (db, mapper) = (Arc::clone(&db), Arc::clone(&mapper));
        move |req: Request| {
            let (db, mapper) = (Arc::clone(&db), Arc::clone(&mapper));
            async move { deposit(&db, &mapper, req) }
        }
    };
    let show_route = move |req: Request| {
        let (db, mapper) = (Arc::clone(&db), Arc::clone(&mapper));
        async move { show(&db, &mapper, req) }
    };

    app.routes(|router| {
        router
            .on_with(Method::Post, "/accounts", deposit_route, [require_authorization().boxed()])
            .on(Method::Get, "/accounts", show_route)
    })
}

// Body: "<id> <owner> <balance>"
fn deposit(db: &Database, mapper: &Mapper<Account>, req: Request) -> Result<Response, PersistError> {
    let text = String::from_utf8_lossy(req.body()).into_owned();
    let parts: Vec<&str> = text.split_whitespace().collect();
    let [id, owner, balance] = parts.as_slice() else {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    };
    let (Ok(id), Ok(balance)) = (id.parse(), balance.parse()) else {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    };
    mapper.upsert(db, &Account { id, owner: (*owner).to_owned(), balance })?;
    Ok(Response::status(StatusCode::CREATED))
}

// Header `x-account` carries the id.
fn show(db: &Database, mapper: &Mapper<Account>, req: Request) -> Result<Response, PersistError> {
    let Some(id) = req.header("x-account").and_then(|v| v.parse::<i64>().ok()) else {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    };
    let account = mapper.find_by_id(db, id)?;
    Ok(Response::text(format!("{} {}", account.owner, account.balance)))
}

#[test]
fn startup_migrations_are_idempotent_across_restarts() {
    let (dir, app) = setup();

    let first = app.migrate().unwrap();
    assert_eq!(first.applied, ["001_accounts.sql", "002_balance.sql"]);
    drop(app);

    let app = App::load(dir.path().join("config.json")).unwrap();
    let second = app.migrate().unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.skipped, ["001_accounts.sql", "002_balance.sql"]);
}

#[tokio::test]
async fn routes_persist_and_load_records() {
    let (_dir, app) = setup();
    app.migrate().unwrap();
    let app = account_routes(app);
    let router = app.router();

    let created = router
        .dispatch(
            Request::new("POST", "/accounts")
                .with_header("Authorization", "Bearer t")
                .with_body("7 ada 100"),
        )
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);

    let shown = router
        .dispatch(Request::new("GET", "/accounts").with_header("x-account", "7"))
        .await;
    assert_eq!(shown.status_code(), StatusCode::OK);
    assert_eq!(shown.body(), b"ada 100");

    // Same id again: an update, not a second row.
    router
        .dispatch(
            Request::new("POST", "/accounts")
                .with_header("Authorization", "Bearer t")
                .with_body("7 ada 250"),
        )
        .await;
    let shown = router
        .dispatch(Request::new("GET", "/accounts").with_header("x-account", "7"))
        .await;
    assert_eq!(shown.body(), b"ada 250");
}

#[tokio::test]
async fn misses_and_rejections() {
    let (_dir, app) = setup();
    app.migrate().unwrap();
    let app = account_routes(app);
    let router = app.router();

    let unauthorized = router
        .dispatch(Request::new("POST", "/accounts").with_body("1 bob 5"))
        .await;
    assert_eq!(unauthorized.status_code(), StatusCode::FORBIDDEN);

    let missing = router
        .dispatch(Request::new("GET", "/accounts").with_header("x-account", "404"))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    for (method, path) in [("DELETE", "/accounts"), ("GET", "/accounts/"), ("get", "/accounts")] {
        let res = router.dispatch(Request::new(method, path)).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{method} {path}");
        assert_eq!(res.body(), b"404 page not found\n");
    }
}

#[tokio::test]
async fn unauthorized_writes_never_reach_the_store() {
    let (_dir, app) = setup();
    app.migrate().unwrap();
    let db = app.db();
    let app = account_routes(app);

    app.router()
        .dispatch(Request::new("POST", "/accounts").with_body("3 eve 1"))
        .await;

    let count: i64 = db
        .lock()
        .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn custom_middleware_sees_the_response() {
    let (_dir, app) = setup();
    let stamp = middleware::from_fn(|req: Request, next: Next| async move {
        let res = next.run(req).await;
        Response::builder()
            .status(res.status_code())
            .header("x-stamped", "yes")
            .text(String::from_utf8_lossy(res.body()).into_owned())
    });

    let app = app.routes(|router| {
        router.on_with(Method::Get, "/hello", |_req: Request| async { "hi" }, [stamp.boxed()])
    });

    let res = app.router().dispatch(Request::new("GET", "/hello")).await;
    assert_eq!(res.header("x-stamped"), Some("yes"));
    assert_eq!(res.body(), b"hi");
}

#[test]
fn raw_upsert_on_the_app_database() {
    let (_dir, app) = setup();
    app.migrate().unwrap();
    let db = app.db();

    let mut values = Values::new();
    values.insert("id".into(), Value::Integer(1));
    values.insert("owner".into(), Value::Text("raw".into()));
    selma::persist::upsert(&db, "accounts", &values).unwrap();

    let account: Account = selma::persist::find_by_id(&db, "accounts", 1).unwrap();
    assert_eq!(account, Account { id: 1, owner: "raw".into(), balance: 0 });
}
