use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde_json::json;

use super::{parse_id, recover, ListParams};
use crate::entities::{prelude::*, *};
use crate::error::{AppError, AppResult};
use crate::models::AuthorFields;
use crate::pagination::PageUrls;
use crate::query::{self, AuthorQuery, AuthorStatus};
use crate::response::{Page, Redirect, RequestContext};
use crate::validation::FormInput;
use crate::AppState;

const INDEX: &str = "/authors";

async fn find_or_404(state: &AppState, raw_id: &str) -> AppResult<authors::Model> {
    let id = parse_id(raw_id, "Author")?;
    query::find_author(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Author not found.".to_string()))
}

pub async fn index(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Page> {
    let params = ListParams::new(pairs);
    let status = params.status();

    let spec = AuthorQuery {
        status: AuthorStatus::parse(status),
        page: params.page(),
        ..AuthorQuery::default()
    };
    let urls = PageUrls::new(ctx.path.clone()).with_query_string(&params.pairs);
    let authors = query::list_authors(&state.db, &spec)
        .await?
        .into_paginator(&urls);

    Ok(Page::render(
        "Authors/Index",
        json!({
            "authors": authors,
            "filters": { "status": status },
        }),
        &ctx,
    ))
}

pub async fn create(ctx: RequestContext) -> Page {
    Page::render("Authors/Form", json!({}), &ctx)
}

pub async fn store(
    State(state): State<AppState>,
    ctx: RequestContext,
    input: FormInput,
) -> AppResult<Response> {
    let fields = AuthorFields::validate(&input, &state.db, None).await?;

    match fields.into_new_model().insert(&state.db).await {
        Ok(author) => {
            tracing::info!(author_id = author.id, "author created");
            Ok(Redirect::to(INDEX)
                .with_message("Author created successfully.")
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
    let author = find_or_404(&state, &id).await?;
    let (total, published) = query::post_totals(&state.db, author.id).await?;
    let author = query::author_with_recent_posts(&state.db, author).await?;

    Ok(Page::render(
        "Authors/Show",
        json!({
            "author": author,
            "totalPosts": total,
            "publishedPosts": published,
        }),
        &ctx,
    ))
}

pub async fn edit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let author = find_or_404(&state, &id).await?;
    Ok(Page::render("Authors/Form", json!({ "author": author }), &ctx))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    input: FormInput,
) -> AppResult<Response> {
    let author = find_or_404(&state, &id).await?;
    let fields = AuthorFields::validate(&input, &state.db, Some(author.id)).await?;

    let mut model: authors::ActiveModel = author.into();
    fields.apply_to(&mut model);

    match model.update(&state.db).await {
        Ok(author) => {
            tracing::info!(author_id = author.id, "author updated");
            Ok(Redirect::to(INDEX)
                .with_message("Author updated successfully.")
                .into_response())
        }
        Err(e) => recover(e.into(), &ctx, INDEX),
    }
}

pub async fn destroy(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let author = find_or_404(&state, &id).await?;
    let (owned, _) = query::post_totals(&state.db, author.id).await?;

    if owned > 0 {
        tracing::warn!(author_id = author.id, posts = owned, "refused to delete author with posts");
        return recover(
            AppError::Constraint("Cannot delete author with associated posts.".to_string()),
            &ctx,
            INDEX,
        );
    }

    match Authors::delete_by_id(author.id).exec(&state.db).await {
        Ok(_) => {
            tracing::info!(author_id = author.id, "author deleted");
            Ok(Redirect::to(INDEX)
                .with_message("Author deleted successfully.")
                .into_response())
        }
        Err(e) => recover(e.into(), &ctx, INDEX),
    }
}
