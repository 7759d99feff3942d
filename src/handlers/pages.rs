use serde_json::json;

use crate::response::{Page, Redirect, RequestContext};

pub async fn welcome(ctx: RequestContext) -> Page {
    Page::render("Welcome", json!({}), &ctx)
}

pub async fn dashboard() -> Redirect {
    Redirect::to("/posts")
}
