#![cfg(test)]
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let mut cfg = configs::DatabaseConfig::from_env();
    cfg.max_connections = cfg.max_connections.max(10);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.connect_timeout_secs = 5;
    cfg.acquire_timeout_secs = 10;
    let db = models::db::connect_with_config(&cfg).await?;
    MIGRATED
        .get_or_try_init(|| async { migration::Migrator::up(&db, None).await })
        .await?;
    Ok(db)
}
