use deadpool::managed::Pool;
use diesel::{pg::PgConnection, Connection};
use diesel_async::{pooled_connection::AsyncDieselConnectionManager, AsyncPgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub mod auth;
pub mod db;
pub mod error;
pub mod memory;
pub mod models;
pub mod schema;
pub mod telemetry;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub fn connect_to_db(db_url: &str) -> anyhow::Result<DbPool> {
    let db_config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    Pool::builder(db_config)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build database pool: {e}"))
}

/// Applies every pending migration over a blocking connection and returns
/// the versions that were run.
pub fn run_migrations(db_url: &str) -> anyhow::Result<Vec<String>> {
    let mut conn = PgConnection::establish(db_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
    Ok(applied.into_iter().map(|v| v.to_string()).collect())
}
