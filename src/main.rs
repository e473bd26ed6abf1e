use std::str::FromStr;

use digicard::{AppState, app, auth, db};
use sqlx::sqlite::SqlitePoolOptions;

#[tokio::main]
async fn main() {
    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://dbc.db?mode=rwc".to_string());
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url.as_str())
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();
    db::seed_if_empty(&db_pool).await.unwrap();

    let provider = auth::Provider::from_json(
        serde_json::Value::from_str(include_str!("../client_secret.json")).unwrap(),
    )
    .unwrap();

    let router = app(AppState { db_pool, provider });
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    axum::serve(listener, router).await.unwrap();
}
