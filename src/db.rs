use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

use crate::config::DatabaseConfig;
use crate::entities::prelude::*;

/// Open the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    tracing::info!(url = %config.url, "connecting to database");

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections.max(1))
        .sqlx_logging(config.sqlx_logging);

    // Every pooled connection to `:memory:` is its own database, and a
    // reaped connection takes its data with it.
    if config.is_in_memory() {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(u32::MAX as u64))
            .max_lifetime(Duration::from_secs(u32::MAX as u64));
    }

    let db = Database::connect(options).await?;
    tracing::info!("database connected");
    Ok(db)
}

/// Create the `authors` and `posts` tables when they do not exist yet.
pub async fn prepare_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut authors = schema.create_table_from_entity(Authors);
    authors.if_not_exists();
    db.execute(backend.build(&authors)).await?;

    let mut posts = schema.create_table_from_entity(Posts);
    posts.if_not_exists();
    db.execute(backend.build(&posts)).await?;

    Ok(())
}

/// In-memory database with the schema in place.
pub async fn connect_in_memory() -> Result<DatabaseConnection, DbErr> {
    let db = connect(&DatabaseConfig::in_memory()).await?;
    prepare_schema(&db).await?;
    Ok(db)
}
