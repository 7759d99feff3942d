#![allow(dead_code)]

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::{TestRequest, TestResponse, TestServer};
use rand::{rngs::StdRng, SeedableRng};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use inkwell::auth::{issue_token, CurrentUser};
use inkwell::entities::{authors, posts};
use inkwell::response::{Flash, FLASH_COOKIE};
use inkwell::seed::Faker;
use inkwell::{db, AppState, Config};

pub struct TestApp {
    pub server: TestServer,
    pub db: DatabaseConnection,
    config: Config,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = db::connect_in_memory().await.expect("in-memory database");
        let config = Config::default();
        let state = AppState::new(db.clone(), config.clone());
        let server = TestServer::new(inkwell::router(state)).expect("test server");

        Self { server, db, config }
    }

    fn token(&self, verified: bool) -> String {
        let user = CurrentUser {
            id: 1,
            name: "Test User".into(),
            email: "test@example.com".into(),
            email_verified: verified,
        };
        issue_token(&user, &self.config.auth).expect("token")
    }

    /// `Authorization` header for a verified user.
    pub fn auth(&self) -> (HeaderName, HeaderValue) {
        bearer(&self.token(true))
    }

    /// `Authorization` header for a user who has not verified their email.
    pub fn unverified(&self) -> (HeaderName, HeaderValue) {
        bearer(&self.token(false))
    }

    pub fn get(&self, path: &str) -> TestRequest {
        let (name, value) = self.auth();
        self.server.get(path).add_header(name, value)
    }

    pub fn post(&self, path: &str) -> TestRequest {
        let (name, value) = self.auth();
        self.server.post(path).add_header(name, value)
    }

    pub fn put(&self, path: &str) -> TestRequest {
        let (name, value) = self.auth();
        self.server.put(path).add_header(name, value)
    }

    pub fn patch(&self, path: &str) -> TestRequest {
        let (name, value) = self.auth();
        self.server.patch(path).add_header(name, value)
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        let (name, value) = self.auth();
        self.server.delete(path).add_header(name, value)
    }

    pub async fn create_author(&self, name: &str, email: &str, is_active: bool) -> authors::Model {
        authors::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            bio: Set(None),
            is_active: Set(is_active),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert author")
    }

    pub async fn create_post(&self, author_id: i32, title: &str, is_published: bool) -> posts::Model {
        posts::ActiveModel {
            title: Set(title.to_string()),
            content: Set(format!("Content of {title}")),
            author_id: Set(author_id),
            is_published: Set(is_published),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert post")
    }
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
    )
}

pub fn faker(seed: u64) -> Faker<StdRng> {
    Faker::new(StdRng::seed_from_u64(seed))
}

pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Flash carried by a redirect's `Set-Cookie` header.
pub fn flash(response: &TestResponse) -> Option<Flash> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|raw| cookie::Cookie::parse(raw).ok())
        .find(|c| c.name() == FLASH_COOKIE && !c.value().is_empty())
        .and_then(|c| Flash::decode(c.value()))
}
