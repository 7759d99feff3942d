pub mod authors;
pub mod pages;
pub mod posts;

use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult, GENERIC_WRITE_FAILURE};
use crate::pagination;
use crate::response::{Redirect, RequestContext};

/// Query string of a listing request, in the order it was sent.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub pairs: Vec<(String, String)>,
}

impl ListParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Last value sent for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn status(&self) -> Option<&str> {
        self.get("status")
    }

    pub fn page(&self) -> u64 {
        pagination::page_number(self.get("page"))
    }
}

/// Route ids that do not parse can never match a row.
pub(crate) fn parse_id(raw: &str, entity: &str) -> AppResult<i32> {
    raw.parse::<i32>()
        .map_err(|_| AppError::NotFound(format!("{entity} not found.")))
}

/// Turn refusals into a redirect back with a readable message; anything
/// else propagates.
pub(crate) fn recover(err: AppError, ctx: &RequestContext, fallback: &str) -> AppResult<Response> {
    match err {
        AppError::Constraint(message) => {
            Ok(Redirect::to(ctx.back_or(fallback)).with_error(message).into_response())
        }
        AppError::Integrity(detail) => {
            tracing::error!(%detail, "store rejected write");
            Ok(Redirect::to(ctx.back_or(fallback))
                .with_error(GENERIC_WRITE_FAILURE)
                .into_response())
        }
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_query_value_wins() {
        let params = ListParams::new(vec![
            ("status".into(), "active".into()),
            ("page".into(), "2".into()),
            ("status".into(), "inactive".into()),
        ]);
        assert_eq!(params.status(), Some("inactive"));
        assert_eq!(params.page(), 2);
        assert_eq!(ListParams::default().page(), 1);
    }

    #[test]
    fn non_numeric_ids_are_not_found() {
        assert_eq!(parse_id("12", "Post").unwrap(), 12);
        assert!(matches!(parse_id("abc", "Post"), Err(AppError::NotFound(m)) if m == "Post not found."));
    }

    #[test]
    fn refusals_become_redirects() {
        let ctx = RequestContext {
            referer: Some("/authors/4".into()),
            ..RequestContext::default()
        };
        let response = recover(AppError::Constraint("No.".into()), &ctx, "/authors").unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[axum::http::header::LOCATION], "/authors/4");

        assert!(recover(AppError::NotFound("x".into()), &ctx, "/authors").is_err());
    }

    #[tokio::test]
    async fn store_violations_become_generic_redirects() {
        use crate::entities::authors;
        use crate::response::Flash;
        use sea_orm::{ActiveModelTrait, Set};

        let db = crate::db::connect_in_memory().await.unwrap();
        let author = || authors::ActiveModel {
            name: Set("Ada".into()),
            email: Set("ada@example.com".into()),
            is_active: Set(true),
            ..Default::default()
        };
        author().insert(&db).await.unwrap();

        let err: AppError = author().insert(&db).await.unwrap_err().into();
        assert!(matches!(err, AppError::Integrity(_)), "got {err:?}");

        let ctx = RequestContext::default();
        let response = recover(err, &ctx, "/authors").unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[axum::http::header::LOCATION], "/authors");

        let cookie = response.headers()[axum::http::header::SET_COOKIE]
            .to_str()
            .unwrap()
            .to_string();
        let cookie = cookie::Cookie::parse(cookie).unwrap();
        assert_eq!(Flash::decode(cookie.value()), Some(Flash::error(GENERIC_WRITE_FAILURE)));
    }

    #[tokio::test]
    async fn foreign_key_violations_are_integrity_errors() {
        use crate::entities::posts;
        use sea_orm::{ActiveModelTrait, Set};

        let db = crate::db::connect_in_memory().await.unwrap();
        let err: AppError = posts::ActiveModel {
            title: Set("Orphan".into()),
            content: Set("Body".into()),
            author_id: Set(404),
            is_published: Set(false),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap_err()
        .into();

        assert!(matches!(err, AppError::Integrity(_)), "got {err:?}");
    }
}
