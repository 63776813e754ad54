//! Tauri commands for the period log

use chrono::NaiveDate;
use std::sync::Arc;
use tauri::State;

use crate::db::AppState;
use crate::error::KindraError;
use crate::models::{CycleRecord, NewCycleRecord};
use crate::tracking;

/// All cycles for a tracked person, oldest first
#[tauri::command]
pub async fn get_cycles(
  state: State<'_, Arc<AppState>>,
  person_id: String,
) -> Result<Vec<CycleRecord>, KindraError> {
  tracking::load_cycles_for_person(&state.db, &person_id).await
}

/// Log a new period (closes the previous open cycle)
#[tauri::command]
pub async fn log_period_start(
  state: State<'_, Arc<AppState>>,
  cycle: NewCycleRecord,
) -> Result<CycleRecord, KindraError> {
  tracking::log_period_start(&state.db, cycle).await
}

#[tauri::command]
pub async fn log_period_end(
  state: State<'_, Arc<AppState>>,
  cycle_id: i64,
  end_date: NaiveDate,
) -> Result<CycleRecord, KindraError> {
  tracking::log_period_end(&state.db, cycle_id, end_date).await
}

#[tauri::command]
pub async fn record_ovulation_day(
  state: State<'_, Arc<AppState>>,
  cycle_id: i64,
  day: i64,
) -> Result<CycleRecord, KindraError> {
  tracking::record_ovulation_day(&state.db, cycle_id, day).await
}

#[tauri::command]
pub async fn update_cycle_notes(
  state: State<'_, Arc<AppState>>,
  cycle_id: i64,
  mood: Option<String>,
  notes: Option<String>,
) -> Result<CycleRecord, KindraError> {
  tracking::update_cycle_notes(&state.db, cycle_id, mood, notes).await
}

#[tauri::command]
pub async fn delete_cycle(
  state: State<'_, Arc<AppState>>,
  cycle_id: i64,
) -> Result<(), KindraError> {
  tracking::delete_cycle(&state.db, cycle_id).await
}
