use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{prelude::*, *};
use crate::error::AppResult;
use crate::validation::{self, FormInput, ValidationErrors, MAX_STRING_LENGTH};

/// Reduced author projection embedded in post payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct AuthorSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Selectable author in the post form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct AuthorOption {
    pub id: i32,
    pub name: String,
}

/// Author listing row.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorRow {
    #[serde(flatten)]
    pub author: authors::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_count: Option<u64>,
}

/// Post with its author's reduced projection.
#[derive(Debug, Clone, Serialize)]
pub struct PostRow {
    #[serde(flatten)]
    pub post: posts::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSummary>,
}

/// Author detail with its most recent posts.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorWithPosts {
    #[serde(flatten)]
    pub author: authors::Model,
    pub posts: Vec<posts::Model>,
}

/// Editable post fields for the edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostForm {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub is_published: bool,
}

impl From<posts::Model> for PostForm {
    fn from(post: posts::Model) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            is_published: post.is_published,
        }
    }
}

/// Validated author input. `None` leaves the stored value as it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorFields {
    pub name: String,
    pub email: String,
    pub bio: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl AuthorFields {
    /// Check `input` against the author rules. `ignore_id` excludes that
    /// author from the email uniqueness check.
    pub async fn validate<C: ConnectionTrait>(
        input: &FormInput,
        db: &C,
        ignore_id: Option<i32>,
    ) -> AppResult<Self> {
        let mut errors = ValidationErrors::default();

        let name = validation::required_string(&mut errors, input, "name", Some(MAX_STRING_LENGTH));
        let email = validation::required_email(&mut errors, input, "email");
        let bio = validation::nullable_string(&mut errors, input, "bio");
        let is_active = validation::boolean(&mut errors, input, "is_active");

        if let Some(email) = &email {
            let mut taken = Authors::find().filter(authors::Column::Email.eq(email.as_str()));
            if let Some(id) = ignore_id {
                taken = taken.filter(authors::Column::Id.ne(id));
            }
            if taken.count(db).await? > 0 {
                errors.add("email", validation::unique_message("email"));
            }
        }

        match (name, email) {
            (Some(name), Some(email)) if errors.is_empty() => Ok(Self {
                name,
                email,
                bio,
                is_active,
            }),
            _ => Err(errors.into()),
        }
    }

    pub fn into_new_model(self) -> authors::ActiveModel {
        authors::ActiveModel {
            id: NotSet,
            name: Set(self.name),
            email: Set(self.email),
            bio: Set(self.bio.flatten()),
            is_active: Set(self.is_active.unwrap_or(true)),
            ..Default::default()
        }
    }

    pub fn apply_to(self, model: &mut authors::ActiveModel) {
        model.name = Set(self.name);
        model.email = Set(self.email);
        if let Some(bio) = self.bio {
            model.bio = Set(bio);
        }
        if let Some(is_active) = self.is_active {
            model.is_active = Set(is_active);
        }
    }
}

/// Validated post input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub is_published: Option<bool>,
}

impl PostFields {
    pub async fn validate<C: ConnectionTrait>(input: &FormInput, db: &C) -> AppResult<Self> {
        let mut errors = ValidationErrors::default();

        let title = validation::required_string(&mut errors, input, "title", Some(MAX_STRING_LENGTH));
        let content = validation::required_string(&mut errors, input, "content", None);
        let author_id = validation::required_id(&mut errors, input, "author_id");
        let is_published = validation::boolean(&mut errors, input, "is_published");

        if let Some(id) = author_id {
            if Authors::find_by_id(id).count(db).await? == 0 {
                errors.add("author_id", validation::exists_message("author_id"));
            }
        }

        match (title, content, author_id) {
            (Some(title), Some(content), Some(author_id)) if errors.is_empty() => Ok(Self {
                title,
                content,
                author_id,
                is_published,
            }),
            _ => Err(errors.into()),
        }
    }

    pub fn into_new_model(self) -> posts::ActiveModel {
        posts::ActiveModel {
            id: NotSet,
            title: Set(self.title),
            content: Set(self.content),
            author_id: Set(self.author_id),
            is_published: Set(self.is_published.unwrap_or(false)),
            ..Default::default()
        }
    }

    pub fn apply_to(self, model: &mut posts::ActiveModel) {
        model.title = Set(self.title);
        model.content = Set(self.content);
        model.author_id = Set(self.author_id);
        if let Some(is_published) = self.is_published {
            model.is_published = Set(is_published);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::AppError;
    use sea_orm::ActiveModelTrait;
    use serde_json::json;

    fn form(value: serde_json::Value) -> FormInput {
        FormInput::from(value)
    }

    async fn author(db: &sea_orm::DatabaseConnection, email: &str) -> authors::Model {
        AuthorFields {
            name: "Ada".into(),
            email: email.into(),
            bio: None,
            is_active: None,
        }
        .into_new_model()
        .insert(db)
        .await
        .unwrap()
    }

    fn field_errors(err: AppError) -> ValidationErrors {
        match err {
            AppError::Validation(errors) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn author_defaults_on_create() {
        let db = db::connect_in_memory().await.unwrap();
        let fields = AuthorFields::validate(
            &form(json!({"name": "Ada", "email": "ada@example.com"})),
            &db,
            None,
        )
        .await
        .unwrap();

        let created = fields.into_new_model().insert(&db).await.unwrap();
        assert!(created.is_active);
        assert_eq!(created.bio, None);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_except_for_self() {
        let db = db::connect_in_memory().await.unwrap();
        let existing = author(&db, "ada@example.com").await;
        let input = form(json!({"name": "Ada", "email": "ada@example.com"}));

        let errors = field_errors(AuthorFields::validate(&input, &db, None).await.unwrap_err());
        assert_eq!(
            errors.get("email").unwrap(),
            ["The email has already been taken.".to_string()]
        );

        assert!(AuthorFields::validate(&input, &db, Some(existing.id)).await.is_ok());
    }

    #[tokio::test]
    async fn post_requires_existing_author() {
        let db = db::connect_in_memory().await.unwrap();
        let input = form(json!({"title": "Hello", "content": "Body", "author_id": 99}));

        let errors = field_errors(PostFields::validate(&input, &db).await.unwrap_err());
        assert_eq!(
            errors.get("author_id").unwrap(),
            ["The selected author id is invalid.".to_string()]
        );
    }

    #[tokio::test]
    async fn post_reports_every_missing_field() {
        let db = db::connect_in_memory().await.unwrap();
        let errors = field_errors(PostFields::validate(&form(json!({})), &db).await.unwrap_err());
        assert!(errors.has("title"));
        assert!(errors.has("content"));
        assert!(errors.has("author_id"));
        assert_eq!(errors.len(), 3);
    }

    #[tokio::test]
    async fn update_leaves_absent_flags_untouched() {
        let db = db::connect_in_memory().await.unwrap();
        let existing = author(&db, "ada@example.com").await;

        let mut model: authors::ActiveModel = existing.clone().into();
        model.is_active = Set(false);
        let stored = model.update(&db).await.unwrap();
        assert!(!stored.is_active);

        let fields = AuthorFields::validate(
            &form(json!({"name": "Ada L.", "email": "ada@example.com"})),
            &db,
            Some(existing.id),
        )
        .await
        .unwrap();
        let mut model: authors::ActiveModel = stored.into();
        fields.apply_to(&mut model);
        let updated = model.update(&db).await.unwrap();

        assert_eq!(updated.name, "Ada L.");
        assert!(!updated.is_active);
        assert!(updated.updated_at >= existing.updated_at);
        assert_eq!(updated.created_at, existing.created_at);
    }
}
