use std::path::Path as FsPath;

use axum::{
    debug_handler,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::AppResult;

use super::{owner, photo};

pub(crate) const RELATIVE_UPLOAD_DIR: &str = "static/img/users";

#[debug_handler]
pub(crate) async fn upload(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let Some(user) = owner(&db_pool, &session, &username).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let mut uploaded = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("photo") {
            let data = field.bytes().await?;
            if !data.is_empty() {
                uploaded = Some(data);
            }
        }
    }
    let Some(data) = uploaded else {
        return Ok(
            Redirect::to(&format!("/{username}/admin?error=No%20file%20was%20selected"))
                .into_response(),
        );
    };

    let rel_path = format!("{RELATIVE_UPLOAD_DIR}/{username}.jpg");
    let outcome = {
        let rel_path = rel_path.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<photo::Outcome> {
            std::fs::create_dir_all(RELATIVE_UPLOAD_DIR)?;
            std::fs::write(&rel_path, &data)?;
            photo::compress(FsPath::new(&rel_path), photo::MAX_PHOTO_BYTES)
        })
        .await??
    };

    match outcome {
        photo::Outcome::CannotCompress { .. } => {
            std::fs::remove_file(&rel_path)?;
            Ok(Redirect::to(&format!(
                "/{username}/admin?error=The%20photo%20could%20not%20be%20compressed%20enough"
            ))
            .into_response())
        }
        _ => {
            sqlx::query("UPDATE users SET profile_pic_url=? WHERE id=?")
                .bind(&rel_path)
                .bind(&user.id)
                .execute(&db_pool)
                .await?;
            Ok(Redirect::to(&format!("/{username}/admin")).into_response())
        }
    }
}
