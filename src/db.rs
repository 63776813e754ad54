use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::AppConfig;
use crate::error::KindraError;

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool
pub struct AppState {
  pub db: DbPool,
}

/// Connect to `db_url` and run migrations
pub async fn connect(db_url: &str, config: &AppConfig) -> Result<DbPool, KindraError> {
  tracing::info!(max_connections = config.max_connections, "connecting to database");

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect(db_url)
    .await?;

  run_migrations(&pool).await?;

  tracing::info!("database initialized");

  Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), KindraError> {
  sqlx::migrate!("./migrations").run(pool).await?;
  Ok(())
}

/// Get the path to the database file
/// Stored in the platform app data dir as kindra.db
#[cfg(feature = "desktop")]
fn get_db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<std::path::PathBuf, KindraError> {
  use tauri::Manager;

  let data_dir = app
    .path()
    .app_data_dir()
    .map_err(|e| KindraError::Config(format!("Failed to get app data dir: {}", e)))?;

  std::fs::create_dir_all(&data_dir)
    .map_err(|e| KindraError::Config(format!("Failed to create {}: {}", data_dir.display(), e)))?;

  Ok(data_dir.join("kindra.db"))
}

/// Initialize the database connection pool for the desktop app.
/// KINDRA_DATABASE_URL wins over the app data dir.
#[cfg(feature = "desktop")]
pub async fn initialize_db<R: tauri::Runtime>(
  app: &tauri::AppHandle<R>,
  config: &AppConfig,
) -> Result<DbPool, KindraError> {
  let db_url = match &config.database_url {
    Some(url) => url.clone(),
    None => format!("sqlite://{}?mode=rwc", get_db_path(app)?.display()),
  };

  connect(&db_url, config).await
}
