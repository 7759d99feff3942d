//! Route table.
//!
//! `/` is public. The dashboard alias and both resources sit behind the
//! verified-user gate.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers::{authors, pages, posts};
use crate::AppState;

fn resources() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/authors", get(authors::index).post(authors::store))
        .route("/authors/create", get(authors::create))
        .route(
            "/authors/{author}",
            get(authors::show)
                .put(authors::update)
                .patch(authors::update)
                .delete(authors::destroy),
        )
        .route("/authors/{author}/edit", get(authors::edit))
        .route("/posts", get(posts::index).post(posts::store))
        .route("/posts/create", get(posts::create))
        .route(
            "/posts/{post}",
            get(posts::show)
                .put(posts::update)
                .patch(posts::update)
                .delete(posts::destroy),
        )
        .route("/posts/{post}/edit", get(posts::edit))
        .route_layer(middleware::from_fn(auth::require_verified))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::welcome))
        .merge(resources())
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
