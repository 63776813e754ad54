//! Error type for persistence, configuration and command input
//!
//! The phase engine itself never fails; it degrades to defaults instead.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum KindraError {
  #[error("Database error: {0}")]
  Database(String),

  #[error("Migration error: {0}")]
  Migration(String),

  #[error("Invalid configuration: {0}")]
  Config(String),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Not found: {0}")]
  NotFound(String),
}

impl From<sqlx::Error> for KindraError {
  fn from(e: sqlx::Error) -> Self {
    KindraError::Database(e.to_string())
  }
}

impl From<sqlx::migrate::MigrateError> for KindraError {
  fn from(e: sqlx::migrate::MigrateError) -> Self {
    KindraError::Migration(e.to_string())
  }
}
