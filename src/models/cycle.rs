use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One tracked menstrual cycle for a person (self or a connection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CycleRecord {
  pub id: i64,
  pub person_id: String,
  pub period_start_date: NaiveDate,
  pub period_end_date: Option<NaiveDate>,
  /// Last day of the cycle; None while the next period hasn't started
  pub cycle_end_date: Option<NaiveDate>,
  /// Recorded day-in-cycle of ovulation (1-based), when known
  pub ovulation_day: Option<i64>,
  pub mood: Option<String>,
  pub notes: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
}

impl CycleRecord {
  /// Period length in days, if the period end was recorded and is sane
  pub fn recorded_period_length(&self) -> Option<i64> {
    let end = self.period_end_date?;
    let days = (end - self.period_start_date).num_days() + 1;
    (days >= 1).then_some(days)
  }

  /// Cycle length in days, if the cycle was closed and the span is sane
  pub fn recorded_cycle_length(&self) -> Option<i64> {
    let end = self.cycle_end_date?;
    let days = (end - self.period_start_date).num_days() + 1;
    (days >= 1).then_some(days)
  }
}

/// For inserting new cycle records (without id, created_at)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCycleRecord {
  pub person_id: String,
  pub period_start_date: NaiveDate,
  pub period_end_date: Option<NaiveDate>,
  pub cycle_end_date: Option<NaiveDate>,
  pub ovulation_day: Option<i64>,
  pub mood: Option<String>,
  pub notes: Option<String>,
}

impl NewCycleRecord {
  /// A fresh period starting on `start` with nothing else known yet
  pub fn starting(person_id: impl Into<String>, start: NaiveDate) -> Self {
    Self {
      person_id: person_id.into(),
      period_start_date: start,
      period_end_date: None,
      cycle_end_date: None,
      ovulation_day: None,
      mood: None,
      notes: None,
    }
  }
}
