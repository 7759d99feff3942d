pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod query;
pub mod response;
pub mod routes;
pub mod seed;
pub mod validation;

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DbErr};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::router;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Connect to the configured database and make sure the tables exist.
    pub async fn bootstrap(config: Config) -> Result<Self, DbErr> {
        let db = db::connect(&config.database).await?;
        db::prepare_schema(&db).await?;
        Ok(Self::new(db, config))
    }
}
