//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock cycle factories
//! - Date helpers

use crate::models::{CycleRecord, NewCycleRecord};
use chrono::NaiveDate;
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  crate::db::run_migrations(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed closed cycles of `length` days back to back, starting at `first_start`
/// Returns the IDs of created cycles
pub async fn seed_test_cycles(
  pool: &SqlitePool,
  person_id: &str,
  first_start: NaiveDate,
  length: i64,
  count: usize,
) -> Vec<i64> {
  let mut ids = Vec::new();

  for i in 0..count {
    let start = first_start + chrono::Duration::days(length * i as i64);
    let end = start + chrono::Duration::days(length - 1);

    let result = sqlx::query(
      r#"
      INSERT INTO cycles (person_id, period_start_date, period_end_date, cycle_end_date)
      VALUES (?1, ?2, ?3, ?4)
      "#,
    )
    .bind(person_id)
    .bind(start)
    .bind(start + chrono::Duration::days(4))
    .bind(end)
    .execute(pool)
    .await
    .expect("Failed to insert test cycle");

    ids.push(result.last_insert_rowid());
  }

  ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Shorthand for a calendar date in tests
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Create a mock cycle record with no period end recorded
pub fn mock_cycle(id: i64, person_id: &str, start: NaiveDate, cycle_end: Option<NaiveDate>) -> CycleRecord {
  CycleRecord {
    id,
    person_id: person_id.to_string(),
    period_start_date: start,
    period_end_date: None,
    cycle_end_date: cycle_end,
    ovulation_day: None,
    mood: None,
    notes: None,
    created_at: None,
  }
}

/// Create a mock cycle for person "me" with a recorded ovulation day
pub fn mock_cycle_with_ovulation(id: i64, start: NaiveDate, ovulation_day: i64) -> CycleRecord {
  CycleRecord {
    ovulation_day: Some(ovulation_day),
    ..mock_cycle(id, "me", start, None)
  }
}

/// Create a new-period input with a recorded period end
pub fn mock_new_cycle(person_id: &str, start: NaiveDate, period_days: i64) -> NewCycleRecord {
  NewCycleRecord {
    period_end_date: Some(start + chrono::Duration::days(period_days - 1)),
    ..NewCycleRecord::starting(person_id, start)
  }
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name = 'cycles'"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_cycles_returns_correct_count() {
    let pool = setup_test_db().await;

    let ids = seed_test_cycles(&pool, "me", date(2025, 1, 1), 28, 4).await;
    assert_eq!(ids.len(), 4);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cycles WHERE person_id = 'me'")
      .fetch_one(&pool)
      .await
      .expect("Failed to count cycles");

    assert_eq!(count, 4);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let cycle = mock_cycle_with_ovulation(3, date(2025, 2, 1), 15);
    assert_eq!(cycle.person_id, "me");
    assert_eq!(cycle.ovulation_day, Some(15));
    assert!(cycle.cycle_end_date.is_none());

    let new_cycle = mock_new_cycle("partner", date(2025, 2, 1), 5);
    assert_eq!(new_cycle.period_end_date, Some(date(2025, 2, 5)));
  }
}
