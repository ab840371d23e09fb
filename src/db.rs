use sea_orm::ConnectOptions;
use sea_orm::{Database, DatabaseConnection};
use std::time::Duration;
use tracing::{info, instrument};

#[instrument(skip(database_url))]
pub async fn init_db(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("connecting to database");

    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(10)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    let db = Database::connect(options).await?;
    info!("database connected");

    Ok(db)
}
