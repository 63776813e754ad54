//! Calendar month view and cycle forecast
//!
//! Builds one `CycleProfile` per tracked person per request, then answers
//! every visible day from it instead of re-deriving the history estimates
//! for each cell.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::cycle::{add_days, estimate_ovulation_day, CycleProfile};
use crate::error::KindraError;
use crate::models::{CycleRecord, PhaseDescriptor};

// ---------------------------------------------------------------------------
/// Month Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonPhase {
    pub person_id: String,
    /// None when no tracked cycle covers the day
    pub phase: Option<PhaseDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for the padding days of the previous/next month
    pub in_month: bool,
    pub phases: Vec<PersonPhase>,
}

/// Whole weeks covering a month, starting on `week_start`
pub fn visible_days(year: i32, month: u32, week_start: Weekday) -> Result<Vec<NaiveDate>, KindraError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| KindraError::InvalidInput(format!("invalid month {}-{}", year, month)))?;
    let last = last_day_of_month(first)
        .ok_or_else(|| KindraError::InvalidInput(format!("month {}-{} out of range", year, month)))?;

    let lead = days_between_weekdays(week_start, first.weekday());
    let week_end = week_start.pred();
    let trail = days_between_weekdays(last.weekday(), week_end);

    let start = add_days(first, -lead);
    let end = add_days(last, trail);

    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

/// Days from `from` forward to the next `to` (0 if equal)
fn days_between_weekdays(from: Weekday, to: Weekday) -> i64 {
    let from = from.num_days_from_monday() as i64;
    let to = to.num_days_from_monday() as i64;
    (to - from).rem_euclid(7)
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
    };
    next_month.pred_opt()
}

/// Phase per tracked person for every visible day of a month
pub fn month_view(
    year: i32,
    month: u32,
    week_start: Weekday,
    person_ids: &[String],
    cycles: &[CycleRecord],
) -> Result<Vec<CalendarDay>, KindraError> {
    let days = visible_days(year, month, week_start)?;
    let profiles: Vec<CycleProfile> = person_ids
        .iter()
        .map(|id| CycleProfile::for_person(id, cycles))
        .collect();

    tracing::debug!(year, month, people = profiles.len(), days = days.len(), "building month view");

    Ok(days
        .into_iter()
        .map(|date| CalendarDay {
            date,
            in_month: date.month() == month && date.year() == year,
            phases: profiles
                .iter()
                .map(|profile| PersonPhase {
                    person_id: profile.person_id().to_string(),
                    phase: profile.phase_for_day(date),
                })
                .collect(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
/// Forecast: upcoming period and fertile window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleForecast {
    pub person_id: String,
    pub cycle_length: i64,
    /// First projected period start on or after `today`
    pub next_period_start: NaiveDate,
    pub days_until_next_period: i64,
    /// First projected ovulation on or after `today`
    pub next_ovulation: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

/// Project the latest cycle forward in steps of the estimated cycle length.
/// None when the person has no cycles at all.
pub fn forecast(person_id: &str, cycles: &[CycleRecord], today: NaiveDate) -> Option<CycleForecast> {
    let profile = CycleProfile::for_person(person_id, cycles);
    let latest_start = profile.latest()?.period_start_date;
    let cycle_length = profile.estimated_cycle_length().max(1);

    let since_start = (today - latest_start).num_days();
    let periods_ahead = ceil_div(since_start, cycle_length).max(1);
    let next_period_start = add_days(latest_start, periods_ahead.saturating_mul(cycle_length));

    // A learned ovulation day can exceed the cycle; keep the projection inside it
    let ovulation_day = estimate_ovulation_day(cycle_length, profile.cycles()).clamp(1, cycle_length);
    let first_ovulation = add_days(latest_start, ovulation_day - 1);
    let since_ovulation = (today - first_ovulation).num_days();
    let cycles_ahead = ceil_div(since_ovulation, cycle_length).max(0);
    let next_ovulation = add_days(first_ovulation, cycles_ahead.saturating_mul(cycle_length));

    Some(CycleForecast {
        person_id: person_id.to_string(),
        cycle_length,
        next_period_start,
        days_until_next_period: (next_period_start - today).num_days(),
        next_ovulation,
        fertile_window_start: add_days(next_ovulation, -2),
        fertile_window_end: add_days(next_ovulation, 1),
    })
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    -((-numerator).div_euclid(denominator))
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
