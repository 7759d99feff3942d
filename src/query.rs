//! Listing and lookup queries.
//!
//! Listings are described by a query object (filter, page, related data to
//! load) and resolved by one function per entity. Related rows are fetched
//! in a second query keyed by the page's ids rather than per row.

use std::collections::HashMap;

use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};

use crate::entities::authors::AuthorScopes;
use crate::entities::posts::PostScopes;
use crate::entities::{prelude::*, *};
use crate::models::{AuthorOption, AuthorRow, AuthorSummary, AuthorWithPosts, PostRow};
use crate::pagination::{PageUrls, Paginator, PER_PAGE};

/// Posts shown on an author's detail page.
pub const RECENT_POSTS_LIMIT: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorStatus {
    Active,
    Inactive,
}

impl AuthorStatus {
    /// Unknown values mean "no filter".
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("active") => Some(Self::Active),
            Some("inactive") => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Published,
    Unpublished,
}

impl PostStatus {
    /// Unknown values mean "no filter".
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("published") => Some(Self::Published),
            Some("unpublished") => Some(Self::Unpublished),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorQuery {
    pub status: Option<AuthorStatus>,
    pub page: u64,
    pub per_page: u64,
    pub with_posts_count: bool,
}

impl Default for AuthorQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            per_page: PER_PAGE,
            with_posts_count: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub page: u64,
    pub per_page: u64,
    pub with_author: bool,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            per_page: PER_PAGE,
            with_author: true,
        }
    }
}

/// One page of rows plus the size of the whole result.
#[derive(Debug, Clone)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> PageSlice<T> {
    pub fn into_paginator(self, urls: &PageUrls) -> Paginator<T> {
        Paginator::new(self.items, self.total, self.per_page, self.page, urls)
    }
}

async fn fetch_page<C, E>(db: &C, select: Select<E>, page: u64, per_page: u64) -> Result<PageSlice<E::Model>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    let page = page.max(1);
    let per_page = per_page.max(1);
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;

    // Pages past the end are empty; an offset that large would not fit the
    // store's signed integers anyway.
    let items = if page > total.div_ceil(per_page) {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    Ok(PageSlice {
        items,
        total,
        page,
        per_page,
    })
}

pub async fn list_authors<C: ConnectionTrait>(db: &C, query: &AuthorQuery) -> Result<PageSlice<AuthorRow>, DbErr> {
    let mut select = Authors::find()
        .order_by_desc(authors::Column::CreatedAt)
        .order_by_desc(authors::Column::Id);

    select = match query.status {
        Some(AuthorStatus::Active) => select.active(),
        Some(AuthorStatus::Inactive) => select.inactive(),
        None => select,
    };

    let slice = fetch_page(db, select, query.page, query.per_page).await?;

    let counts = if query.with_posts_count {
        let ids: Vec<i32> = slice.items.iter().map(|a| a.id).collect();
        Some(posts_count_by_author(db, &ids).await?)
    } else {
        None
    };

    let items = slice
        .items
        .into_iter()
        .map(|author| AuthorRow {
            posts_count: counts
                .as_ref()
                .map(|counts| counts.get(&author.id).copied().unwrap_or(0)),
            author,
        })
        .collect();

    Ok(PageSlice {
        items,
        total: slice.total,
        page: slice.page,
        per_page: slice.per_page,
    })
}

pub async fn list_posts<C: ConnectionTrait>(db: &C, query: &PostQuery) -> Result<PageSlice<PostRow>, DbErr> {
    let mut select = Posts::find()
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id);

    select = match query.status {
        Some(PostStatus::Published) => select.published(),
        Some(PostStatus::Unpublished) => select.unpublished(),
        None => select,
    };

    let slice = fetch_page(db, select, query.page, query.per_page).await?;

    let summaries = if query.with_author {
        let ids: Vec<i32> = slice.items.iter().map(|p| p.author_id).collect();
        author_summaries(db, &ids).await?
    } else {
        HashMap::new()
    };

    let items = slice
        .items
        .into_iter()
        .map(|post| PostRow {
            author: summaries.get(&post.author_id).cloned(),
            post,
        })
        .collect();

    Ok(PageSlice {
        items,
        total: slice.total,
        page: slice.page,
        per_page: slice.per_page,
    })
}

async fn posts_count_by_author<C: ConnectionTrait>(db: &C, ids: &[i32]) -> Result<HashMap<i32, u64>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = Posts::find()
        .select_only()
        .column(posts::Column::AuthorId)
        .column_as(Expr::col(posts::Column::Id).count(), "posts_count")
        .filter(posts::Column::AuthorId.is_in(ids.iter().copied()))
        .group_by(posts::Column::AuthorId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(author_id, count)| (author_id, count.max(0) as u64))
        .collect())
}

async fn author_summaries<C: ConnectionTrait>(db: &C, ids: &[i32]) -> Result<HashMap<i32, AuthorSummary>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let rows = Authors::find()
        .select_only()
        .columns([
            authors::Column::Id,
            authors::Column::Name,
            authors::Column::Email,
        ])
        .filter(authors::Column::Id.is_in(ids))
        .into_model::<AuthorSummary>()
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|a| (a.id, a)).collect())
}

pub async fn find_author<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<authors::Model>, DbErr> {
    Authors::find_by_id(id).one(db).await
}

pub async fn find_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<posts::Model>, DbErr> {
    Posts::find_by_id(id).one(db).await
}

/// Author with their newest posts.
pub async fn author_with_recent_posts<C: ConnectionTrait>(db: &C, author: authors::Model) -> Result<AuthorWithPosts, DbErr> {
    let posts = Posts::find()
        .filter(posts::Column::AuthorId.eq(author.id))
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id)
        .limit(RECENT_POSTS_LIMIT)
        .all(db)
        .await?;

    Ok(AuthorWithPosts { author, posts })
}

/// Total and published post counts for one author.
pub async fn post_totals<C: ConnectionTrait>(db: &C, author_id: i32) -> Result<(u64, u64), DbErr> {
    let owned = || Posts::find().filter(posts::Column::AuthorId.eq(author_id));
    let total = owned().count(db).await?;
    let published = owned().published().count(db).await?;
    Ok((total, published))
}

pub async fn post_with_author<C: ConnectionTrait>(db: &C, post: posts::Model) -> Result<PostRow, DbErr> {
    let mut summaries = author_summaries(db, &[post.author_id]).await?;
    Ok(PostRow {
        author: summaries.remove(&post.author_id),
        post,
    })
}

/// Active authors as form options.
pub async fn active_author_options<C: ConnectionTrait>(db: &C) -> Result<Vec<AuthorOption>, DbErr> {
    Authors::find()
        .active()
        .select_only()
        .columns([authors::Column::Id, authors::Column::Name])
        .order_by_asc(authors::Column::Id)
        .into_model::<AuthorOption>()
        .all(db)
        .await
}
