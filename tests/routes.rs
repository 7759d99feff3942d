mod common;

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::{json, Value};

use common::{flash, location, TestApp};

#[tokio::test]
async fn welcome_is_public() {
    let app = TestApp::new().await;

    let response = app.server.get("/").await;

    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["component"], "Welcome");
    assert_eq!(page["url"], "/");
    assert!(page["props"]["auth"]["user"].is_null());
}

#[tokio::test]
async fn welcome_shares_the_signed_in_user() {
    let app = TestApp::new().await;

    let page: Value = app.get("/").await.json();

    assert_eq!(page["props"]["auth"]["user"]["email"], "test@example.com");
    assert_eq!(page["props"]["auth"]["user"]["email_verified"], true);
}

#[tokio::test]
async fn resources_require_a_token() {
    let app = TestApp::new().await;

    for path in ["/dashboard", "/authors", "/authors/create", "/posts", "/posts/1"] {
        let response = app.server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>(), json!({ "message": "Unauthenticated." }));
    }

    app.server
        .post("/authors")
        .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_forged_token_counts_as_no_token() {
    let app = TestApp::new().await;

    app.server
        .get("/authors")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not.a.token"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unverified_users_are_forbidden() {
    let app = TestApp::new().await;
    let (name, value) = app.unverified();

    app.server
        .get("/posts")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_redirects_to_posts() {
    let app = TestApp::new().await;

    let response = app.get("/dashboard").await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/posts");
    assert!(flash(&response).is_none());
}

#[tokio::test]
async fn flash_is_shown_once_on_the_next_page() {
    let app = TestApp::new().await;

    let response = app
        .post("/authors")
        .json(&json!({ "name": "Ada Lovelace", "email": "ada@example.com" }))
        .await;
    let flash = flash(&response).expect("flash cookie");

    let cookie = format!("{}={}", inkwell::response::FLASH_COOKIE, flash.encode());
    let response = app
        .get("/authors")
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
        .await;

    let page: Value = response.json();
    assert_eq!(page["props"]["flash"]["message"], "Author created successfully.");
    assert!(page["props"]["flash"]["error"].is_null());

    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cleared.starts_with(&format!("{}=;", inkwell::response::FLASH_COOKIE)));
}
