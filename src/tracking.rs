//! Cycle log persistence
//!
//! Supplies `CycleRecord`s to the phase engine and implements the period
//! logging workflow: starting a new period closes the cycle that was still
//! open, so a person normally has at most one open cycle.

use chrono::{Duration, NaiveDate};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::cycle::MAX_CYCLE_GAP_DAYS;
use crate::error::KindraError;
use crate::models::{CycleRecord, NewCycleRecord};

/// ---------------------------------------------------------------------------
/// Queries
/// ---------------------------------------------------------------------------

/// All cycles for one person, oldest first
pub async fn load_cycles_for_person(pool: &SqlitePool, person_id: &str) -> Result<Vec<CycleRecord>, KindraError> {
  let cycles = sqlx::query_as::<_, CycleRecord>(
    "SELECT * FROM cycles WHERE person_id = ?1 ORDER BY period_start_date ASC, id ASC",
  )
  .bind(person_id)
  .fetch_all(pool)
  .await?;

  Ok(cycles)
}

/// All cycles for several people (calendar view), oldest first
pub async fn load_cycles_for_people(pool: &SqlitePool, person_ids: &[String]) -> Result<Vec<CycleRecord>, KindraError> {
  if person_ids.is_empty() {
    return Ok(Vec::new());
  }

  let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM cycles WHERE person_id IN (");
  let mut separated = builder.separated(", ");
  for person_id in person_ids {
    separated.push_bind(person_id);
  }
  separated.push_unseparated(") ORDER BY period_start_date ASC, id ASC");

  let cycles = builder.build_query_as::<CycleRecord>().fetch_all(pool).await?;
  Ok(cycles)
}

pub async fn load_cycle(pool: &SqlitePool, cycle_id: i64) -> Result<CycleRecord, KindraError> {
  sqlx::query_as::<_, CycleRecord>("SELECT * FROM cycles WHERE id = ?1")
    .bind(cycle_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| KindraError::NotFound(format!("cycle {}", cycle_id)))
}

/// ---------------------------------------------------------------------------
/// Period Logging
/// ---------------------------------------------------------------------------

/// Record a new period start.
///
/// If the person has an open cycle that started earlier, it is closed on the
/// day before this period began. Its period end and ovulation day are pulled
/// back inside the shortened cycle.
pub async fn log_period_start(pool: &SqlitePool, new_cycle: NewCycleRecord) -> Result<CycleRecord, KindraError> {
  validate_new_cycle(&new_cycle)?;

  let mut tx = pool.begin().await?;

  let open: Option<(i64, NaiveDate)> = sqlx::query_as(
    r#"
    SELECT id, period_start_date FROM cycles
    WHERE person_id = ?1 AND cycle_end_date IS NULL AND period_start_date < ?2
    ORDER BY period_start_date DESC, id DESC
    LIMIT 1
    "#,
  )
  .bind(&new_cycle.person_id)
  .bind(new_cycle.period_start_date)
  .fetch_optional(&mut *tx)
  .await?;

  if let Some((open_id, open_start)) = open {
    if let Some(close_on) = new_cycle.period_start_date.checked_sub_signed(Duration::days(1)) {
      let closed_length = (close_on - open_start).num_days() + 1;
      sqlx::query(
        r#"
        UPDATE cycles SET
          cycle_end_date = ?1,
          period_end_date = CASE WHEN period_end_date > ?1 THEN ?1 ELSE period_end_date END,
          ovulation_day = CASE WHEN ovulation_day > ?2 THEN NULL ELSE ovulation_day END
        WHERE id = ?3
        "#,
      )
      .bind(close_on)
      .bind(closed_length)
      .bind(open_id)
      .execute(&mut *tx)
      .await?;
      tracing::debug!(
        cycle_id = open_id,
        %open_start,
        %close_on,
        "closed open cycle on new period start"
      );
    }
  }

  let result = sqlx::query(
    r#"
    INSERT INTO cycles (
      person_id, period_start_date, period_end_date, cycle_end_date,
      ovulation_day, mood, notes
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
  )
  .bind(&new_cycle.person_id)
  .bind(new_cycle.period_start_date)
  .bind(new_cycle.period_end_date)
  .bind(new_cycle.cycle_end_date)
  .bind(new_cycle.ovulation_day)
  .bind(&new_cycle.mood)
  .bind(&new_cycle.notes)
  .execute(&mut *tx)
  .await?;

  tx.commit().await?;

  let id = result.last_insert_rowid();
  tracing::info!(
    cycle_id = id,
    person_id = %new_cycle.person_id,
    start = %new_cycle.period_start_date,
    "logged period start"
  );

  load_cycle(pool, id).await
}

fn validate_new_cycle(new_cycle: &NewCycleRecord) -> Result<(), KindraError> {
  if new_cycle.person_id.trim().is_empty() {
    return Err(KindraError::InvalidInput("person_id must not be empty".into()));
  }
  let start = new_cycle.period_start_date;
  if let Some(end) = new_cycle.period_end_date {
    if end < start {
      return Err(KindraError::InvalidInput(format!(
        "period end {} is before period start {}",
        end, start
      )));
    }
  }
  if let Some(end) = new_cycle.cycle_end_date {
    if end < start {
      return Err(KindraError::InvalidInput(format!(
        "cycle end {} is before period start {}",
        end, start
      )));
    }
    if let Some(period_end) = new_cycle.period_end_date {
      if end < period_end {
        return Err(KindraError::InvalidInput(format!(
          "cycle end {} is before period end {}",
          end, period_end
        )));
      }
    }
  }
  if let Some(day) = new_cycle.ovulation_day {
    let cycle_length = new_cycle
      .cycle_end_date
      .map(|end| (end - start).num_days() + 1);
    validate_ovulation_day(day, cycle_length)?;
  }
  Ok(())
}

/// Ovulation must fall inside the cycle: `1..=cycle_length` for a closed
/// cycle, `1..=MAX_CYCLE_GAP_DAYS` while the cycle is still open
fn validate_ovulation_day(day: i64, cycle_length: Option<i64>) -> Result<(), KindraError> {
  if day < 1 {
    return Err(KindraError::InvalidInput(format!(
      "ovulation day must be 1 or later, got {}",
      day
    )));
  }
  match cycle_length {
    Some(length) if day > length => Err(KindraError::InvalidInput(format!(
      "ovulation day {} is past the end of a {}-day cycle",
      day, length
    ))),
    None if day > MAX_CYCLE_GAP_DAYS => Err(KindraError::InvalidInput(format!(
      "ovulation day {} is past the longest tracked cycle ({} days)",
      day, MAX_CYCLE_GAP_DAYS
    ))),
    _ => Ok(()),
  }
}

/// Record the last day of bleeding for a cycle
pub async fn log_period_end(pool: &SqlitePool, cycle_id: i64, end: NaiveDate) -> Result<CycleRecord, KindraError> {
  let cycle = load_cycle(pool, cycle_id).await?;

  if end < cycle.period_start_date {
    return Err(KindraError::InvalidInput(format!(
      "period end {} is before period start {}",
      end, cycle.period_start_date
    )));
  }
  if let Some(cycle_end) = cycle.cycle_end_date {
    if end > cycle_end {
      return Err(KindraError::InvalidInput(format!(
        "period end {} is after cycle end {}",
        end, cycle_end
      )));
    }
  }

  sqlx::query("UPDATE cycles SET period_end_date = ?1 WHERE id = ?2")
    .bind(end)
    .bind(cycle_id)
    .execute(pool)
    .await?;

  tracing::debug!(cycle_id, %end, "logged period end");

  load_cycle(pool, cycle_id).await
}

/// Record the observed ovulation day (1-based day-in-cycle)
pub async fn record_ovulation_day(pool: &SqlitePool, cycle_id: i64, day: i64) -> Result<CycleRecord, KindraError> {
  let cycle = load_cycle(pool, cycle_id).await?;
  validate_ovulation_day(day, cycle.recorded_cycle_length())?;

  sqlx::query("UPDATE cycles SET ovulation_day = ?1 WHERE id = ?2")
    .bind(day)
    .bind(cycle_id)
    .execute(pool)
    .await?;

  load_cycle(pool, cycle_id).await
}

/// Update mood and notes; None leaves a field unchanged
pub async fn update_cycle_notes(
  pool: &SqlitePool,
  cycle_id: i64,
  mood: Option<String>,
  notes: Option<String>,
) -> Result<CycleRecord, KindraError> {
  let result = sqlx::query(
    r#"
    UPDATE cycles SET
      mood = COALESCE(?1, mood),
      notes = COALESCE(?2, notes)
    WHERE id = ?3
    "#,
  )
  .bind(mood)
  .bind(notes)
  .bind(cycle_id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(KindraError::NotFound(format!("cycle {}", cycle_id)));
  }

  load_cycle(pool, cycle_id).await
}

pub async fn delete_cycle(pool: &SqlitePool, cycle_id: i64) -> Result<(), KindraError> {
  let result = sqlx::query("DELETE FROM cycles WHERE id = ?1")
    .bind(cycle_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(KindraError::NotFound(format!("cycle {}", cycle_id)));
  }

  tracing::info!(cycle_id, "deleted cycle");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cycle::get_phase_for_day;
  use crate::models::SubPhase;
  use crate::test_utils::{date, mock_new_cycle, seed_test_cycles, setup_test_db, teardown_test_db};

  #[tokio::test]
  async fn test_log_period_start_round_trips() {
    let pool = setup_test_db().await;

    let mut new_cycle = mock_new_cycle("me", date(2025, 5, 1), 5);
    new_cycle.mood = Some("calm".into());
    let cycle = log_period_start(&pool, new_cycle).await.unwrap();

    assert!(cycle.id > 0);
    assert_eq!(cycle.person_id, "me");
    assert_eq!(cycle.period_start_date, date(2025, 5, 1));
    assert_eq!(cycle.period_end_date, Some(date(2025, 5, 5)));
    assert_eq!(cycle.cycle_end_date, None);
    assert_eq!(cycle.mood.as_deref(), Some("calm"));
    assert!(cycle.created_at.is_some());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_new_period_closes_open_cycle() {
    let pool = setup_test_db().await;

    let first = log_period_start(&pool, mock_new_cycle("me", date(2025, 5, 1), 5)).await.unwrap();
    let second = log_period_start(&pool, mock_new_cycle("me", date(2025, 5, 30), 4)).await.unwrap();

    let first = load_cycle(&pool, first.id).await.unwrap();
    assert_eq!(first.cycle_end_date, Some(date(2025, 5, 29)));
    assert_eq!(first.recorded_cycle_length(), Some(29));
    assert_eq!(second.cycle_end_date, None);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_new_period_leaves_other_people_alone() {
    let pool = setup_test_db().await;

    let mine = log_period_start(&pool, mock_new_cycle("me", date(2025, 5, 1), 5)).await.unwrap();
    log_period_start(&pool, mock_new_cycle("partner", date(2025, 5, 20), 5)).await.unwrap();

    let mine = load_cycle(&pool, mine.id).await.unwrap();
    assert_eq!(mine.cycle_end_date, None);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_backfilled_period_does_not_close_later_cycle() {
    let pool = setup_test_db().await;

    let current = log_period_start(&pool, mock_new_cycle("me", date(2025, 6, 1), 5)).await.unwrap();
    let mut old = mock_new_cycle("me", date(2025, 5, 1), 5);
    old.cycle_end_date = Some(date(2025, 5, 31));
    log_period_start(&pool, old).await.unwrap();

    let current = load_cycle(&pool, current.id).await.unwrap();
    assert_eq!(current.cycle_end_date, None);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_log_period_start_rejects_bad_input() {
    let pool = setup_test_db().await;

    let blank = NewCycleRecord::starting("  ", date(2025, 5, 1));
    assert!(matches!(log_period_start(&pool, blank).await, Err(KindraError::InvalidInput(_))));

    let mut inverted = NewCycleRecord::starting("me", date(2025, 5, 10));
    inverted.period_end_date = Some(date(2025, 5, 1));
    assert!(matches!(log_period_start(&pool, inverted).await, Err(KindraError::InvalidInput(_))));

    let mut short_cycle = mock_new_cycle("me", date(2025, 5, 1), 5);
    short_cycle.cycle_end_date = Some(date(2025, 5, 3));
    assert!(matches!(log_period_start(&pool, short_cycle).await, Err(KindraError::InvalidInput(_))));

    let mut bad_ovulation = NewCycleRecord::starting("me", date(2025, 5, 1));
    bad_ovulation.ovulation_day = Some(0);
    assert!(matches!(log_period_start(&pool, bad_ovulation).await, Err(KindraError::InvalidInput(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cycles")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(count, 0);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_log_period_end_validates_range() {
    let pool = setup_test_db().await;

    let cycle = log_period_start(&pool, NewCycleRecord::starting("me", date(2025, 5, 1))).await.unwrap();

    let err = log_period_end(&pool, cycle.id, date(2025, 4, 30)).await.unwrap_err();
    assert!(matches!(err, KindraError::InvalidInput(_)));

    let updated = log_period_end(&pool, cycle.id, date(2025, 5, 6)).await.unwrap();
    assert_eq!(updated.recorded_period_length(), Some(6));

    let err = log_period_end(&pool, 9999, date(2025, 5, 6)).await.unwrap_err();
    assert!(matches!(err, KindraError::NotFound(_)));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_record_ovulation_day() {
    let pool = setup_test_db().await;

    let ids = seed_test_cycles(&pool, "me", date(2025, 1, 1), 28, 1).await;

    let err = record_ovulation_day(&pool, ids[0], 29).await.unwrap_err();
    assert!(matches!(err, KindraError::InvalidInput(_)));

    let cycle = record_ovulation_day(&pool, ids[0], 15).await.unwrap();
    assert_eq!(cycle.ovulation_day, Some(15));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_record_ovulation_day_bounds_open_cycle() {
    let pool = setup_test_db().await;

    let open = log_period_start(&pool, NewCycleRecord::starting("me", date(2025, 5, 1))).await.unwrap();

    let err = record_ovulation_day(&pool, open.id, 1_000_000_000_000_000).await.unwrap_err();
    assert!(matches!(err, KindraError::InvalidInput(_)));
    let err = record_ovulation_day(&pool, open.id, MAX_CYCLE_GAP_DAYS + 1).await.unwrap_err();
    assert!(matches!(err, KindraError::InvalidInput(_)));

    let cycle = record_ovulation_day(&pool, open.id, MAX_CYCLE_GAP_DAYS).await.unwrap();
    assert_eq!(cycle.ovulation_day, Some(MAX_CYCLE_GAP_DAYS));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_log_period_start_bounds_ovulation_like_record() {
    let pool = setup_test_db().await;

    // 28-day closed cycle: day 29 is rejected on both write paths
    let mut closed = mock_new_cycle("me", date(2025, 1, 1), 5);
    closed.cycle_end_date = Some(date(2025, 1, 28));
    closed.ovulation_day = Some(29);
    assert!(matches!(log_period_start(&pool, closed.clone()).await, Err(KindraError::InvalidInput(_))));

    closed.ovulation_day = Some(28);
    let cycle = log_period_start(&pool, closed).await.unwrap();
    assert!(matches!(record_ovulation_day(&pool, cycle.id, 29).await, Err(KindraError::InvalidInput(_))));

    let mut open = NewCycleRecord::starting("me", date(2025, 2, 1));
    open.ovulation_day = Some(1_000_000_000_000_000);
    assert!(matches!(log_period_start(&pool, open).await, Err(KindraError::InvalidInput(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_closing_cycle_clamps_period_end_and_ovulation() {
    let pool = setup_test_db().await;

    let mut long_period = mock_new_cycle("me", date(2025, 5, 1), 20);
    long_period.ovulation_day = Some(40);
    let first = log_period_start(&pool, long_period).await.unwrap();
    assert_eq!(first.period_end_date, Some(date(2025, 5, 20)));

    log_period_start(&pool, NewCycleRecord::starting("me", date(2025, 5, 10))).await.unwrap();

    let first = load_cycle(&pool, first.id).await.unwrap();
    assert_eq!(first.cycle_end_date, Some(date(2025, 5, 9)));
    assert_eq!(first.period_end_date, Some(date(2025, 5, 9)));
    assert_eq!(first.ovulation_day, None);
    assert!(first.period_end_date <= first.cycle_end_date);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_closing_cycle_keeps_values_inside_range() {
    let pool = setup_test_db().await;

    let mut open = mock_new_cycle("me", date(2025, 5, 1), 5);
    open.ovulation_day = Some(14);
    let first = log_period_start(&pool, open).await.unwrap();
    log_period_start(&pool, NewCycleRecord::starting("me", date(2025, 5, 29))).await.unwrap();

    let first = load_cycle(&pool, first.id).await.unwrap();
    assert_eq!(first.period_end_date, Some(date(2025, 5, 5)));
    assert_eq!(first.ovulation_day, Some(14));
    assert_eq!(first.recorded_cycle_length(), Some(28));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_update_cycle_notes_keeps_unset_fields() {
    let pool = setup_test_db().await;

    let cycle = log_period_start(&pool, NewCycleRecord::starting("me", date(2025, 5, 1))).await.unwrap();

    let cycle = update_cycle_notes(&pool, cycle.id, Some("tired".into()), Some("long day".into())).await.unwrap();
    let cycle = update_cycle_notes(&pool, cycle.id, None, Some("better".into())).await.unwrap();
    assert_eq!(cycle.mood.as_deref(), Some("tired"));
    assert_eq!(cycle.notes.as_deref(), Some("better"));

    let err = update_cycle_notes(&pool, 4242, None, None).await.unwrap_err();
    assert!(matches!(err, KindraError::NotFound(_)));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_delete_cycle() {
    let pool = setup_test_db().await;

    let ids = seed_test_cycles(&pool, "me", date(2025, 1, 1), 28, 2).await;
    delete_cycle(&pool, ids[0]).await.unwrap();

    let remaining = load_cycles_for_person(&pool, "me").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ids[1]);

    assert!(matches!(delete_cycle(&pool, ids[0]).await, Err(KindraError::NotFound(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_load_cycles_for_people_filters_and_orders() {
    let pool = setup_test_db().await;

    seed_test_cycles(&pool, "partner", date(2025, 3, 1), 30, 2).await;
    seed_test_cycles(&pool, "me", date(2025, 1, 1), 28, 3).await;
    seed_test_cycles(&pool, "friend", date(2025, 1, 1), 28, 1).await;

    let cycles = load_cycles_for_people(&pool, &["me".to_string(), "partner".to_string()])
      .await
      .unwrap();
    assert_eq!(cycles.len(), 5);
    assert!(cycles.iter().all(|c| c.person_id != "friend"));
    assert!(cycles.windows(2).all(|w| w[0].period_start_date <= w[1].period_start_date));

    assert!(load_cycles_for_people(&pool, &[]).await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_stored_cycles_feed_phase_engine() {
    let pool = setup_test_db().await;

    // Three 30-day cycles starting 01-01, 01-31, 03-02
    seed_test_cycles(&pool, "me", date(2025, 1, 1), 30, 3).await;
    let cycles = load_cycles_for_person(&pool, "me").await.unwrap();

    let phase = get_phase_for_day(date(2025, 3, 17), "me", &cycles).unwrap();
    assert_eq!(phase.day_in_cycle, 16);
    assert_eq!(phase.sub_phase, SubPhase::Ovulation);
    assert_eq!(phase.period_length_estimate, 5);

    teardown_test_db(pool).await;
  }
}
