use club_hub::{connect_to_db, db, run_migrations, telemetry};
use envconfig::Envconfig;
use tracing::info;

#[derive(Envconfig)]
struct Config {
    #[envconfig(from = "DATABASE_URL")]
    pub db_url: String,
    #[envconfig(from = "LOG_FORMAT", default = "pretty")]
    pub log_format: String,
    #[envconfig(from = "MIGRATE", default = "true")]
    pub migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::init_from_env()?;
    telemetry::init_tracing(&config.log_format);

    if config.migrate {
        let db_url = config.db_url.clone();
        let applied = tokio::task::spawn_blocking(move || run_migrations(&db_url)).await??;
        for version in &applied {
            info!(%version, "applied migration");
        }
        info!(count = applied.len(), "schema is up to date");
    }

    let pool = connect_to_db(&config.db_url)?;
    let conn = &mut pool.get().await?;

    let clubs = db::club::count_clubs(conn).await?;
    let users = db::user::count_users(conn).await?;
    let projects = db::project::count_projects(conn).await?;
    info!(clubs, users, projects, "connected to club hub database");

    Ok(())
}
