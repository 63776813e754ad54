//! Kindra cycle tracking core
//!
//! The phase engine (`cycle`) is pure and usable on its own; `tracking`
//! persists the period log that feeds it, and `calendar` builds the month
//! and forecast views on top. The Tauri shell lives behind the `desktop`
//! feature.

pub mod calendar;
pub mod config;
pub mod cycle;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod tracking;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(test)]
mod test_utils;

pub use cycle::{
  classify_day, estimate_cycle_length, estimate_ovulation_day, get_phase_for_day, resolve_day_to_cycle,
  CycleProfile, DayContext, ResolvedDay,
};
pub use error::KindraError;
pub use models::{CycleRecord, NewCycleRecord, Phase, PhaseDescriptor, SubPhase};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  use db::AppState;
  use std::sync::Arc;
  use tauri::Manager;

  let config = match config::AppConfig::load() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{}; falling back to defaults", e);
      config::AppConfig::default()
    }
  };
  logging::init_tracing(&config);

  tauri::Builder::default()
    .setup(move |app| {
      // Initialize database
      let app_handle = app.handle().clone();
      tauri::async_runtime::block_on(async move {
        match db::initialize_db(&app_handle, &config).await {
          Ok(pool) => {
            let state = Arc::new(AppState { db: pool });
            app_handle.manage(state);
            tracing::info!("database ready");
          }
          Err(e) => {
            tracing::error!(error = %e, "failed to initialize database");
          }
        }
      });
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      // Period log
      commands::cycles::get_cycles,
      commands::cycles::log_period_start,
      commands::cycles::log_period_end,
      commands::cycles::record_ovulation_day,
      commands::cycles::update_cycle_notes,
      commands::cycles::delete_cycle,
      // Calendar and tracker views
      commands::calendar::get_phase_for_day,
      commands::calendar::get_month_view,
      commands::calendar::get_cycle_forecast,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
