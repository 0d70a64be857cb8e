use std::time::Duration;

use anyhow::Context;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;

// Soft-deleted rows keep their username and email, so uniqueness only covers
// rows that are still live. Postgres and sqlite share this syntax.
const ACTIVE_USER_UNIQUE_INDEXES: [&str; 2] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_users_active_username \
     ON users (username) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_users_active_email \
     ON users (email) WHERE deleted_at IS NULL",
];

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(cfg.url.clone());
    options
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;

    info!("syncing database schema from entities");
    db.get_schema_registry("knowledge_auth::db::entities::*")
        .sync(&db)
        .await
        .context("failed to sync database schema")?;

    for statement in ACTIVE_USER_UNIQUE_INDEXES {
        db.execute_unprepared(statement)
            .await
            .context("failed to create partial unique index on users")?;
    }
    Ok(db)
}
