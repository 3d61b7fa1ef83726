use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Pool, Postgres};
use tracing::log::LevelFilter;
use tracing::{event, Level};

#[derive(Clone)]
pub struct PgConnectionString(pub String);

/// Owns the pool shared by the Postgres bmcs.
#[derive(Clone, Debug)]
pub struct DbModelManager {
    pool: Pool<Postgres>,
}

impl DbModelManager {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Connects and brings the schema up to date before handing out the pool.
    pub async fn connect(connection_string: PgConnectionString) -> Result<Self> {
        Ok(Self::new(prepare_database_schema(connection_string).await?))
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

pub async fn get_pg_connection_pool(connection_string: PgConnectionString) -> Result<Pool<Postgres>> {
    let database_connection_options: PgConnectOptions = connection_string
        .0
        .parse::<PgConnectOptions>()?
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(60));

    let pg_connection_pool: Pool<Postgres> = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(database_connection_options)
        .await?;

    Ok(pg_connection_pool)
}

pub async fn prepare_database_schema(connection_string: PgConnectionString) -> Result<Pool<Postgres>> {
    let pg_connection_pool = get_pg_connection_pool(connection_string).await?;

    perform_migration(&pg_connection_pool).await?;

    Ok(pg_connection_pool)
}

async fn perform_migration(pg_connection_pool: &Pool<Postgres>) -> Result<()> {
    event!(Level::INFO, "Migrating database if necessary");
    sqlx::migrate!().run(pg_connection_pool).await?;
    event!(Level::INFO, "Done migrating database");

    Ok(())
}
