use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde_json::json;

use super::{parse_id, recover, ListParams};
use crate::entities::{prelude::*, *};
use crate::error::{AppError, AppResult};
use crate::models::{PostFields, PostForm};
use crate::pagination::PageUrls;
use crate::query::{self, PostQuery, PostStatus};
use crate::response::{Page, Redirect, RequestContext};
use crate::validation::FormInput;
use crate::AppState;

const INDEX: &str = "/posts";

async fn find_or_404(state: &AppState, raw_id: &str) -> AppResult<posts::Model> {
    let id = parse_id(raw_id, "Post")?;
    query::find_post(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found.".to_string()))
}

pub async fn index(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Page> {
    let params = ListParams::new(pairs);
    let status = params.status();

    let spec = PostQuery {
        status: PostStatus::parse(status),
        page: params.page(),
        ..PostQuery::default()
    };
    let urls = PageUrls::new(ctx.path.clone()).with_query_string(&params.pairs);
    let posts = query::list_posts(&state.db, &spec)
        .await?
        .into_paginator(&urls);

    Ok(Page::render(
        "Posts/Index",
        json!({
            "posts": posts,
            "filters": { "status": status },
        }),
        &ctx,
    ))
}

pub async fn create(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Page> {
    let authors = query::active_author_options(&state.db).await?;
    Ok(Page::render("Posts/Form", json!({ "authors": authors }), &ctx))
}

pub async fn store(
    State(state): State<AppState>,
    ctx: RequestContext,
    input: FormInput,
) -> AppResult<Response> {
    let fields = PostFields::validate(&input, &state.db).await?;

    match fields.into_new_model().insert(&state.db).await {
        Ok(post) => {
            tracing::info!(post_id = post.id, author_id = post.author_id, "post created");
            Ok(Redirect::to(INDEX)
                .with_message("Post created successfully.")
                .into_response())
        }
        Err(e) => recover(e.into(), &ctx, INDEX),
    }
}

pub async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let post = find_or_404(&state, &id).await?;
    let post = query::post_with_author(&state.db, post).await?;
    Ok(Page::render("Posts/Show", json!({ "post": post }), &ctx))
}

pub async fn edit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let post = find_or_404(&state, &id).await?;
    let authors = query::active_author_options(&state.db).await?;

    Ok(Page::render(
        "Posts/Form",
        json!({
            "post": PostForm::from(post),
            "authors": authors,
        }),
        &ctx,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    input: FormInput,
) -> AppResult<Response> {
    let post = find_or_404(&state, &id).await?;
    let fields = PostFields::validate(&input, &state.db).await?;

    let mut model: posts::ActiveModel = post.into();
    fields.apply_to(&mut model);

    match model.update(&state.db).await {
        Ok(post) => {
            tracing::info!(post_id = post.id, "post updated");
            Ok(Redirect::to(INDEX)
                .with_message("Post updated successfully.")
                .into_response())
        }
        Err(e) => recover(e.into(), &ctx, INDEX),
    }
}

// Posts have no ownership guard, unlike authors.
pub async fn destroy(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let post = find_or_404(&state, &id).await?;

    match Posts::delete_by_id(post.id).exec(&state.db).await {
        Ok(_) => {
            tracing::info!(post_id = post.id, "post deleted");
            Ok(Redirect::to(INDEX)
                .with_message("Post deleted successfully.")
                .into_response())
        }
        Err(e) => recover(e.into(), &ctx, INDEX),
    }
}
