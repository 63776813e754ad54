//! Environment-driven configuration
//!
//! Values come from the process environment; `AppConfig::load` pulls in a
//! `.env` file first.

use std::env;

use crate::error::KindraError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  /// sqlx connection URL; None means the desktop app data dir
  pub database_url: Option<String>,
  pub max_connections: u32,
  pub log_filter: String,
  pub log_json: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: None,
      max_connections: DEFAULT_MAX_CONNECTIONS,
      log_filter: DEFAULT_LOG_FILTER.to_string(),
      log_json: false,
    }
  }
}

impl AppConfig {
  /// Load `.env` (if present) into the environment, then read it
  pub fn load() -> Result<Self, KindraError> {
    dotenvy::dotenv().ok();
    Self::from_env()
  }

  pub fn from_env() -> Result<Self, KindraError> {
    let database_url = non_empty_var("KINDRA_DATABASE_URL");

    let max_connections = match non_empty_var("KINDRA_DB_MAX_CONNECTIONS") {
      Some(raw) => match raw.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
          return Err(KindraError::Config(format!(
            "KINDRA_DB_MAX_CONNECTIONS must be a positive integer, got {:?}",
            raw
          )))
        }
      },
      None => DEFAULT_MAX_CONNECTIONS,
    };

    let log_filter = non_empty_var("KINDRA_LOG")
      .or_else(|| non_empty_var("RUST_LOG"))
      .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let log_json = match non_empty_var("KINDRA_LOG_JSON") {
      Some(raw) => parse_bool(&raw).ok_or_else(|| {
        KindraError::Config(format!("KINDRA_LOG_JSON must be a boolean, got {:?}", raw))
      })?,
      None => false,
    };

    Ok(Self {
      database_url,
      max_connections,
      log_filter,
      log_json,
    })
  }
}

fn non_empty_var(key: &str) -> Option<String> {
  env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}
