use sqlx::SqlitePool;

use crate::{AppResult, GetField, include_res};

// users.id holds either the identity provider's `sub` or a locally
// generated UUIDv7; links have no ordering beyond insertion order.
pub async fn init(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT,
            profile_pic_url TEXT,
            bio TEXT
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id),
            label TEXT NOT NULL,
            url TEXT NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}

/// Loads the bundled fixture users and links into a fresh database.
pub async fn seed_if_empty(db_pool: &SqlitePool) -> AppResult<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db_pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let data: serde_json::Value = serde_json::from_str(include_res!(str, "/test_data.json"))?;

    for user in data.get_obj_field("users")?.as_array().into_iter().flatten() {
        sqlx::query("INSERT INTO users (id,email,username,name,bio) VALUES (?,?,?,?,?)")
            .bind(user.get_str_field("id")?)
            .bind(user.get_str_field("email")?)
            .bind(user.get_str_field("username")?)
            .bind(user.get_str_field("name")?)
            .bind(user.get("bio").and_then(serde_json::Value::as_str))
            .execute(db_pool)
            .await?;
    }

    for link in data.get_obj_field("links")?.as_array().into_iter().flatten() {
        sqlx::query("INSERT INTO links (user_id,label,url) VALUES (?,?,?)")
            .bind(link.get_str_field("user_id")?)
            .bind(link.get_str_field("label")?)
            .bind(link.get_str_field("url")?)
            .execute(db_pool)
            .await?;
    }

    Ok(())
}
