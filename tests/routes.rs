use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tower::ServiceExt;

use digicard::{AppState, app, auth::Provider, db};

// one connection so every request sees the same in-memory database
async fn test_app() -> (Router, SqlitePool) {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();

    let provider = Provider::from_json(serde_json::json!({
        "okta": {
            "client_id": "test-client",
            "client_secret": "test-secret",
            "auth_uri": "https://dev.okta.example/oauth2/default/v1/authorize",
            "token_uri": "https://dev.okta.example/oauth2/default/v1/token",
            "userinfo_uri": "https://dev.okta.example/oauth2/default/v1/userinfo",
            "redirect_uri": "http://localhost:8080/authorization-code/callback"
        }
    }))
    .unwrap();

    let state = AppState {
        db_pool: db_pool.clone(),
        provider,
    };
    (app(state), db_pool)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_multipart(
    app: &Router,
    uri: &str,
    file: Option<&[u8]>,
    cookie: Option<&str>,
) -> Response {
    let boundary = "X-TEST-BOUNDARY";
    let mut body = Vec::new();
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; \
                 filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

fn tiny_png() -> Vec<u8> {
    let img = image::ImageBuffer::from_pixel(4, 4, image::Rgb([90u8, 40, 200]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

async fn profile_pic_url(db_pool: &SqlitePool, username: &str) -> Option<String> {
    let (pic,): (Option<String>,) =
        sqlx::query_as("SELECT profile_pic_url FROM users WHERE username=?")
            .bind(username)
            .fetch_one(db_pool)
            .await
            .unwrap();
    pic
}

async fn post_form(app: &Router, uri: &str, body: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body.to_owned())).unwrap())
        .await
        .unwrap()
}

fn location(res: &Response) -> &str {
    res.headers()
        .get(header::LOCATION)
        .expect("expected a redirect")
        .to_str()
        .unwrap()
}

fn session_cookie(res: &Response) -> String {
    res.headers()
        .get(header::SET_COOKIE)
        .expect("expected a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_owned()
}

async fn body_string(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn user_count(db_pool: &SqlitePool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db_pool)
        .await
        .unwrap();
    count
}

async fn link_count(db_pool: &SqlitePool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM links")
        .fetch_one(db_pool)
        .await
        .unwrap();
    count
}

#[tokio::test]
async fn static_pages_render() {
    let (app, _) = test_app().await;
    for uri in ["/", "/about", "/contact", "/login", "/register"] {
        assert_eq!(get(&app, uri).await.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn unknown_profile_is_not_found_not_a_server_error() {
    let (app, db_pool) = test_app().await;
    db::seed_if_empty(&db_pool).await.unwrap();

    let res = get(&app, "/no-such-user").await;
    assert!(!res.status().is_server_error());
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seeded_profile_renders_with_links() {
    let (app, db_pool) = test_app().await;
    db::seed_if_empty(&db_pool).await.unwrap();

    let res = get(&app, "/jane-doe").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_string(res).await;
    assert!(body.contains("Jane Doe"));
    assert!(body.contains("https://blog.example.com"));

    // a user without bio or links still renders
    let res = get(&app, "/sam-field").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_without_code_is_forbidden_and_creates_nobody() {
    let (app, db_pool) = test_app().await;

    let res = get(&app, "/authorization-code/callback").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(user_count(&db_pool).await, 0);
}

#[tokio::test]
async fn register_logs_in_and_duplicate_email_redirects_to_login() {
    let (app, db_pool) = test_app().await;

    let res = post_form(
        &app,
        "/register",
        "name=Alice+Ant&email=alice%40example.com&username=alice&password=hunter2",
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/alice/admin");
    assert_eq!(user_count(&db_pool).await, 1);

    // same email again, different username
    let res = post_form(
        &app,
        "/register",
        "name=Alice+Again&email=alice%40example.com&username=alice2&password=hunter2",
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    assert_eq!(user_count(&db_pool).await, 1);
}

#[tokio::test]
async fn local_login_checks_the_password() {
    let (app, _db_pool) = test_app().await;

    post_form(
        &app,
        "/register",
        "name=Bob+Bee&email=bob%40example.com&username=bob&password=correct-horse",
        None,
    )
    .await;

    let res = post_form(
        &app,
        "/login",
        "email=bob%40example.com&password=wrong-horse",
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_string(res).await.contains("Wrong email or password."));

    let res = post_form(
        &app,
        "/login",
        "email=bob%40example.com&password=correct-horse",
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/bob/admin");
}

#[tokio::test]
async fn admin_page_requires_the_owner() {
    let (app, db_pool) = test_app().await;
    db::seed_if_empty(&db_pool).await.unwrap();

    let res = get(&app, "/jane-doe/admin").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn saving_links_filters_blank_rows_and_replaces_the_set() {
    let (app, db_pool) = test_app().await;

    let res = post_form(
        &app,
        "/register",
        "name=Cara+Cat&email=cara%40example.com&username=cara&password=hunter2",
        None,
    )
    .await;
    let cookie = session_cookie(&res);

    // two filled rows, one blank row in between
    let res = post_form(
        &app,
        "/cara/admin",
        "bio=hello&links-0-label=Google&links-0-url=https%3A%2F%2Fgoogle.com\
         &links-1-label=&links-1-url=\
         &links-2-label=Docs&links-2-url=https%3A%2F%2Fdocs.example.com",
        Some(&cookie),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/cara");
    assert_eq!(link_count(&db_pool).await, 2);

    // resubmitting replaces, not appends
    let res = post_form(
        &app,
        "/cara/admin",
        "bio=hello&links-0-label=Only&links-0-url=https%3A%2F%2Fonly.example.com",
        Some(&cookie),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(link_count(&db_pool).await, 1);

    let body = body_string(get(&app, "/cara").await).await;
    assert!(body.contains("Only"));
    assert!(!body.contains("Google"));
}

#[tokio::test]
async fn upload_without_a_file_redirects_with_an_error() {
    let (app, db_pool) = test_app().await;

    let res = post_form(
        &app,
        "/register",
        "name=Dana+Dove&email=dana%40example.com&username=dana&password=hunter2",
        None,
    )
    .await;
    let cookie = session_cookie(&res);

    let res = post_multipart(&app, "/dana/upload", None, Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        "/dana/admin?error=No%20file%20was%20selected"
    );
    assert_eq!(profile_pic_url(&db_pool, "dana").await, None);
}

#[tokio::test]
async fn upload_requires_the_owner() {
    let (app, db_pool) = test_app().await;
    db::seed_if_empty(&db_pool).await.unwrap();

    // anonymous caller, real file: nothing may be written
    let png = tiny_png();
    let res = post_multipart(&app, "/jane-doe/upload", Some(&png), None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    assert_eq!(profile_pic_url(&db_pool, "jane-doe").await, None);

    // a logged-in user still cannot touch someone else's photo
    let res = post_form(
        &app,
        "/register",
        "name=Eve+Eaves&email=eve%40example.com&username=eve&password=hunter2",
        None,
    )
    .await;
    let cookie = session_cookie(&res);

    let res = post_multipart(&app, "/jane-doe/upload", Some(&png), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    assert_eq!(profile_pic_url(&db_pool, "jane-doe").await, None);
}

#[tokio::test]
async fn owner_upload_updates_the_profile_photo() {
    let (app, db_pool) = test_app().await;

    let res = post_form(
        &app,
        "/register",
        "name=Pixel+Pete&email=pete%40example.com&username=pixel-pete&password=hunter2",
        None,
    )
    .await;
    let cookie = session_cookie(&res);

    let res = post_multipart(&app, "/pixel-pete/upload", Some(&tiny_png()), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/pixel-pete/admin");
    assert_eq!(
        profile_pic_url(&db_pool, "pixel-pete").await.as_deref(),
        Some("static/img/users/pixel-pete.jpg")
    );
    assert!(std::fs::metadata("static/img/users/pixel-pete.jpg").is_ok());

    let _ = std::fs::remove_file("static/img/users/pixel-pete.jpg");
}

#[tokio::test]
async fn logout_clears_the_session_and_redirects_home() {
    let (app, _db_pool) = test_app().await;

    let res = post_form(
        &app,
        "/register",
        "name=Finn+Fox&email=finn%40example.com&username=finn&password=hunter2",
        None,
    )
    .await;
    let cookie = session_cookie(&res);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    // the session is gone, so the admin page bounces to /login
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/finn/admin")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn stored_labels_are_escaped_on_the_public_page() {
    let (app, _db_pool) = test_app().await;

    let res = post_form(
        &app,
        "/register",
        "name=Erin+Elm&email=erin%40example.com&username=erin&password=hunter2",
        None,
    )
    .await;
    let cookie = session_cookie(&res);

    post_form(
        &app,
        "/erin/admin",
        "bio=hi&links-0-label=%3Cscript%3Ealert(1)%3C%2Fscript%3E\
         &links-0-url=https%3A%2F%2Fx.example.com",
        Some(&cookie),
    )
    .await;

    let body = body_string(get(&app, "/erin").await).await;
    assert!(!body.contains("<script>alert(1)</script>"));
    assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
}
