mod common;

use std::collections::HashSet;

use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::Value;

use common::{faker, TestApp};
use inkwell::entities::authors::AuthorScopes;
use inkwell::entities::posts::PostScopes;
use inkwell::entities::prelude::*;
use inkwell::seed::{self, AuthorFactory, PostFactory};

#[tokio::test]
async fn seeding_creates_nine_active_and_one_inactive_author() {
    let app = TestApp::new().await;

    let summary = seed::run(&app.db, &mut faker(42)).await.unwrap();

    assert_eq!(summary.authors, 10);
    assert_eq!(summary.posts, 30);
    assert_eq!(Authors::find().active().count(&app.db).await.unwrap(), 9);
    assert_eq!(Authors::find().inactive().count(&app.db).await.unwrap(), 1);
    assert_eq!(Posts::find().count(&app.db).await.unwrap(), 30);

    let authors = Authors::find().all(&app.db).await.unwrap();
    let emails: HashSet<_> = authors.iter().map(|a| a.email.as_str()).collect();
    assert_eq!(emails.len(), authors.len());

    let ids: HashSet<_> = authors.iter().map(|a| a.id).collect();
    let posts = Posts::find().all(&app.db).await.unwrap();
    assert!(posts.iter().all(|p| ids.contains(&p.author_id)));
}

#[tokio::test]
async fn seeded_listings_filter_by_status() {
    let app = TestApp::new().await;
    seed::run(&app.db, &mut faker(7)).await.unwrap();

    let page: Value = app.get("/authors?status=inactive").await.json();
    assert_eq!(page["props"]["authors"]["total"], 1);
    assert_eq!(page["props"]["authors"]["data"][0]["is_active"], false);

    let unpublished = Posts::find().unpublished().count(&app.db).await.unwrap();
    let page: Value = app.get("/posts?status=unpublished").await.json();
    let posts = &page["props"]["posts"];
    assert_eq!(posts["total"], unpublished);
    assert!(posts["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["is_published"] == false));
}

#[tokio::test]
async fn post_factory_creates_an_author_when_none_is_given() {
    let app = TestApp::new().await;
    let mut faker = faker(1);

    let post = PostFactory::new().unpublished().create(&app.db, &mut faker).await.unwrap();

    assert!(!post.is_published);
    assert_eq!(Authors::find().count(&app.db).await.unwrap(), 1);
    assert!(Authors::find_by_id(post.author_id).one(&app.db).await.unwrap().is_some());
}

#[tokio::test]
async fn author_factory_creates_many_with_distinct_emails() {
    let app = TestApp::new().await;
    let mut faker = faker(3);

    let authors = AuthorFactory::new()
        .active()
        .create_many(50, &app.db, &mut faker)
        .await
        .unwrap();

    assert_eq!(authors.len(), 50);
    assert!(authors.iter().all(|a| a.is_active));
    assert_eq!(Authors::find().count(&app.db).await.unwrap(), 50);
}
