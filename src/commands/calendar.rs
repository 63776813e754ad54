//! Tauri commands for the calendar and cycle tracker views

use chrono::{NaiveDate, Weekday};
use std::sync::Arc;
use tauri::State;

use crate::calendar::{self, CalendarDay, CycleForecast};
use crate::cycle::CycleProfile;
use crate::db::AppState;
use crate::error::KindraError;
use crate::models::PhaseDescriptor;
use crate::tracking;

/// Phase card for one person and day. `None` means no tracked cycle covers
/// the day; the view shows "no data" rather than a phase.
#[tauri::command]
pub async fn get_phase_for_day(
  state: State<'_, Arc<AppState>>,
  person_id: String,
  date: NaiveDate,
  symptoms: Option<Vec<String>>,
  mood: Option<String>,
) -> Result<Option<PhaseDescriptor>, KindraError> {
  let cycles = tracking::load_cycles_for_person(&state.db, &person_id).await?;
  let profile = CycleProfile::for_person(&person_id, &cycles);
  let symptoms = symptoms.unwrap_or_default();

  Ok(profile.phase_for_day_with(date, &symptoms, mood.as_deref()))
}

/// Month grid with a phase per tracked person per visible day
#[tauri::command]
pub async fn get_month_view(
  state: State<'_, Arc<AppState>>,
  year: i32,
  month: u32,
  person_ids: Vec<String>,
  week_starts_on_sunday: Option<bool>,
) -> Result<Vec<CalendarDay>, KindraError> {
  let week_start = if week_starts_on_sunday.unwrap_or(false) {
    Weekday::Sun
  } else {
    Weekday::Mon
  };

  let cycles = tracking::load_cycles_for_people(&state.db, &person_ids).await?;
  calendar::month_view(year, month, week_start, &person_ids, &cycles)
}

/// Next period and fertile window for a person, from `today`
#[tauri::command]
pub async fn get_cycle_forecast(
  state: State<'_, Arc<AppState>>,
  person_id: String,
  today: NaiveDate,
) -> Result<Option<CycleForecast>, KindraError> {
  let cycles = tracking::load_cycles_for_person(&state.db, &person_id).await?;
  Ok(calendar::forecast(&person_id, &cycles, today))
}
