//! Menstrual cycle phase engine
//!
//! Pure date arithmetic over a person's cycle history:
//! - estimate average cycle length from period start dates
//! - estimate (or learn) the ovulation day
//! - resolve a calendar day to the tracked cycle containing it
//! - classify a day-in-cycle into one of the sub-phases
//!
//! Nothing here fails. Thin or malformed history degrades to defaults
//! (28-day cycle, 5-day period, ovulation no earlier than day 12), and a day
//! no tracked cycle covers comes back as `None` rather than a guessed phase.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

use crate::models::{CycleRecord, PhaseDescriptor, SubPhase};

/// ---------------------------------------------------------------------------
/// Defaults and Thresholds
/// ---------------------------------------------------------------------------

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;
/// Ovulation happens this many days before the cycle ends
pub const LUTEAL_PHASE_DAYS: i64 = 14;
pub const MIN_OVULATION_DAY: i64 = 12;
/// Start-to-start gaps above this are treated as missed logging, not a cycle
pub const MAX_CYCLE_GAP_DAYS: i64 = 45;
/// Recorded ovulations needed before they override the luteal heuristic
pub const MIN_RECORDED_OVULATIONS: usize = 3;

/// ---------------------------------------------------------------------------
/// History Estimates
/// ---------------------------------------------------------------------------

/// Average start-to-start gap across a person's cycles, rounded to whole days
pub fn estimate_cycle_length(cycles: &[CycleRecord]) -> i64 {
  let mut starts: Vec<NaiveDate> = cycles.iter().map(|c| c.period_start_date).collect();
  if starts.len() < 2 {
    return DEFAULT_CYCLE_LENGTH;
  }
  starts.sort();

  let gaps: Vec<i64> = starts
    .windows(2)
    .map(|pair| (pair[1] - pair[0]).num_days())
    .filter(|gap| *gap > 0 && *gap <= MAX_CYCLE_GAP_DAYS)
    .collect();

  rounded_mean(&gaps).unwrap_or(DEFAULT_CYCLE_LENGTH)
}

/// Day-in-cycle of ovulation.
///
/// With enough recorded ovulations the person's own average wins; otherwise
/// ovulation is placed a luteal phase before the end of the cycle.
pub fn estimate_ovulation_day(cycle_length: i64, historical_cycles: &[CycleRecord]) -> i64 {
  let recorded: Vec<i64> = historical_cycles
    .iter()
    .filter_map(|c| c.ovulation_day)
    .filter(|day| *day > 0)
    .collect();

  if recorded.len() >= MIN_RECORDED_OVULATIONS {
    if let Some(learned) = rounded_mean(&recorded) {
      return learned;
    }
  }

  cycle_length.saturating_sub(LUTEAL_PHASE_DAYS).max(MIN_OVULATION_DAY)
}

fn rounded_mean(values: &[i64]) -> Option<i64> {
  if values.is_empty() {
    return None;
  }
  // Widened so a handful of huge values cannot overflow the sum
  let sum: i128 = values.iter().map(|v| *v as i128).sum();
  Some((sum as f64 / values.len() as f64).round() as i64)
}

/// ---------------------------------------------------------------------------
/// Day Classification
/// ---------------------------------------------------------------------------

/// Optional inputs to `classify_day`. `Default` is "no history, no symptoms".
#[derive(Debug, Clone, Copy, Default)]
pub struct DayContext<'a> {
  pub historical_cycles: &'a [CycleRecord],
  pub symptoms: &'a [String],
  pub mood: Option<&'a str>,
}

/// Classify a 1-based day-in-cycle.
///
/// Ranges are tried in order and the first match wins: menstrual, follicular,
/// fertile window, luteal. Anything left over (non-positive days, days past
/// the end of the cycle) is `unknown`.
pub fn classify_day(
  day_in_cycle: i64,
  cycle_length: i64,
  period_length: i64,
  ctx: &DayContext<'_>,
) -> PhaseDescriptor {
  let period_length = period_length.max(0);
  let ovulation_day = estimate_ovulation_day(cycle_length, ctx.historical_cycles);
  let (sub_phase, day_range) = locate(day_in_cycle, cycle_length, period_length, ovulation_day);
  let copy = phase_copy(sub_phase);

  let mut recommendations: Vec<String> = copy.recommendations.iter().map(|r| r.to_string()).collect();
  for extra in personalized_recommendations(ctx.symptoms, ctx.mood) {
    if !recommendations.contains(&extra) {
      recommendations.push(extra);
    }
  }

  PhaseDescriptor {
    phase: sub_phase.phase(),
    sub_phase,
    day_in_cycle,
    cycle_length_estimate: cycle_length,
    period_length_estimate: period_length,
    ovulation_day,
    color: copy.color.to_string(),
    emoji: copy.emoji.to_string(),
    description: copy.description.to_string(),
    day_range,
    hormonal_profile: copy.hormonal_profile.to_string(),
    recommendations,
  }
}

fn locate(day: i64, cycle_length: i64, period_length: i64, ovulation_day: i64) -> (SubPhase, String) {
  if day < 1 {
    return (SubPhase::Unknown, String::new());
  }

  // Menstrual: days 1..=period_length, heavy for the first two
  if day <= period_length {
    return if day <= 2 {
      (SubPhase::HeavyFlow, day_range(1, period_length.min(2)))
    } else {
      (SubPhase::LightFlow, day_range(3, period_length))
    };
  }

  // Follicular: may be empty when ovulation comes early
  let follicular_start = period_length.saturating_add(1);
  let follicular_end = ovulation_day.saturating_sub(3);
  if day >= follicular_start && day <= follicular_end {
    let early_end = follicular_start.saturating_add(2).min(follicular_end);
    return if day <= early_end {
      (SubPhase::EarlyFollicular, day_range(follicular_start, early_end))
    } else {
      (SubPhase::LateFollicular, day_range(early_end.saturating_add(1), follicular_end))
    };
  }

  // Fertile window: two days before ovulation through the day after
  let fertile_start = ovulation_day.saturating_sub(2);
  let fertile_end = ovulation_day.saturating_add(1);
  if day >= fertile_start && day <= fertile_end {
    return if day == ovulation_day {
      (SubPhase::Ovulation, day_range(ovulation_day, ovulation_day))
    } else {
      (SubPhase::FertileWindow, day_range(fertile_start, fertile_end))
    };
  }

  // Luteal: rest of the cycle, split at the midpoint
  if day > fertile_end && day <= cycle_length {
    let luteal_length = cycle_length.saturating_sub(ovulation_day);
    let split = ovulation_day.saturating_add(luteal_length.div_euclid(2));
    return if day <= split {
      (SubPhase::EarlyLuteal, day_range(fertile_end.saturating_add(1), split))
    } else {
      (SubPhase::LateLuteal, day_range(split.saturating_add(1), cycle_length))
    };
  }

  (SubPhase::Unknown, String::new())
}

/// "Day 14" or "Days 6-8", never below day 1
fn day_range(start: i64, end: i64) -> String {
  let start = start.max(1);
  let end = end.max(start);
  if start == end {
    format!("Day {}", start)
  } else {
    format!("Days {}-{}", start, end)
  }
}

/// ---------------------------------------------------------------------------
/// Phase Copy
/// ---------------------------------------------------------------------------

struct PhaseCopy {
  color: &'static str,
  emoji: &'static str,
  description: &'static str,
  hormonal_profile: &'static str,
  recommendations: &'static [&'static str],
}

fn phase_copy(sub_phase: SubPhase) -> PhaseCopy {
  match sub_phase {
    SubPhase::HeavyFlow => PhaseCopy {
      color: "red-600",
      emoji: "🩸",
      description: "Heavy flow. The uterine lining is shedding and energy is usually at its lowest.",
      hormonal_profile: "Estrogen and progesterone at their lowest; prostaglandins drive cramping.",
      recommendations: &[
        "Rest and keep plans light",
        "Use heat for cramps",
        "Eat iron-rich foods",
        "Stay hydrated",
      ],
    },
    SubPhase::LightFlow => PhaseCopy {
      color: "red-400",
      emoji: "💧",
      description: "Light flow. Bleeding is easing and energy starts to come back.",
      hormonal_profile: "Estrogen beginning to rise from its low point.",
      recommendations: &[
        "Gentle movement like walking or yoga",
        "Keep up iron and fluids",
        "Ease back into social plans",
      ],
    },
    SubPhase::EarlyFollicular => PhaseCopy {
      color: "emerald-400",
      emoji: "🌱",
      description: "Early follicular. Period is over and a fresh start feeling sets in.",
      hormonal_profile: "Estrogen rising steadily; FSH stimulating follicle growth.",
      recommendations: &[
        "Start new projects",
        "Try something new together",
        "Increase workout intensity",
      ],
    },
    SubPhase::LateFollicular => PhaseCopy {
      color: "emerald-600",
      emoji: "🌿",
      description: "Late follicular. Energy, confidence and sociability are climbing.",
      hormonal_profile: "Estrogen approaching its peak; testosterone rising.",
      recommendations: &[
        "Plan social time and dates",
        "Have important conversations",
        "Tackle challenging workouts",
      ],
    },
    SubPhase::FertileWindow => PhaseCopy {
      color: "purple-400",
      emoji: "🌸",
      description: "Fertile window. Conception is possible on these days.",
      hormonal_profile: "Estrogen at its peak; LH surge approaching or just passed.",
      recommendations: &[
        "Be mindful of fertility",
        "Make time for connection",
        "Channel the high energy",
      ],
    },
    SubPhase::Ovulation => PhaseCopy {
      color: "purple-600",
      emoji: "🥚",
      description: "Ovulation. Peak fertility and often peak energy and mood.",
      hormonal_profile: "LH surge triggers egg release; estrogen peaks then dips.",
      recommendations: &[
        "Peak fertility today",
        "Great day for quality time",
        "Express appreciation",
      ],
    },
    SubPhase::EarlyLuteal => PhaseCopy {
      color: "amber-400",
      emoji: "🌕",
      description: "Early luteal. Calm, steady energy with a pull toward nesting.",
      hormonal_profile: "Progesterone rising; estrogen has a secondary bump.",
      recommendations: &[
        "Cozy nights in",
        "Focus on routine tasks",
        "Moderate exercise",
      ],
    },
    SubPhase::LateLuteal => PhaseCopy {
      color: "orange-500",
      emoji: "🌙",
      description: "Late luteal (PMS). Mood swings, bloating and cravings are common.",
      hormonal_profile: "Progesterone and estrogen falling ahead of the next period.",
      recommendations: &[
        "Extra patience and support",
        "Limit salt, sugar and caffeine",
        "Prioritise sleep",
        "Comfort without judgement",
      ],
    },
    SubPhase::Unknown => PhaseCopy {
      color: "gray-400",
      emoji: "❓",
      description: "Phase unknown for this day.",
      hormonal_profile: "Not enough information to estimate hormone levels.",
      recommendations: &["Monitor your cycle"],
    },
  }
}

/// Extra suggestions from logged symptoms and mood; the phase is unaffected
fn personalized_recommendations(symptoms: &[String], mood: Option<&str>) -> Vec<String> {
  let mut out = Vec::new();
  let mut push = |s: &str| {
    if !out.iter().any(|existing: &String| existing == s) {
      out.push(s.to_string());
    }
  };

  for symptom in symptoms {
    let symptom = symptom.to_lowercase();
    if symptom.contains("cramp") {
      push("Use a heating pad and gentle stretching for cramps");
    }
    if symptom.contains("bloat") {
      push("Cut back on salt and sip water to ease bloating");
    }
    if symptom.contains("headache") || symptom.contains("migraine") {
      push("Keep hydrated and rest your eyes if headaches build");
    }
    if symptom.contains("fatigue") || symptom.contains("tired") {
      push("Plan lighter commitments and prioritise sleep");
    }
  }

  if let Some(mood) = mood {
    match mood.trim().to_lowercase().as_str() {
      "anxious" | "stressed" => push("Try a short breathing exercise or a walk outside"),
      "irritable" | "angry" => push("Give yourself and others extra patience today"),
      "sad" | "low" | "down" => push("Reach out to someone close; connection helps on low days"),
      _ => {}
    }
  }

  out
}

/// ---------------------------------------------------------------------------
/// Resolving Calendar Days to Cycles
/// ---------------------------------------------------------------------------

/// Calendar date of an instant in its own timezone (time of day dropped)
pub fn calendar_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
  instant.date_naive()
}

/// The cycle a day falls in and its 1-based position within it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDay {
  pub cycle: CycleRecord,
  pub day_in_cycle: i64,
}

/// One person's cycles sorted by start date, with the history estimate
/// computed once. Build one per person per render pass and reuse it for
/// every visible day.
#[derive(Debug, Clone)]
pub struct CycleProfile {
  person_id: String,
  cycles: Vec<CycleRecord>,
  estimated_cycle_length: i64,
}

impl CycleProfile {
  pub fn for_person(person_id: &str, cycles: &[CycleRecord]) -> Self {
    let mut person_cycles: Vec<CycleRecord> = cycles
      .iter()
      .filter(|c| c.person_id == person_id)
      .cloned()
      .collect();
    // Stable: records sharing a start date keep their input order
    person_cycles.sort_by_key(|c| c.period_start_date);

    let estimated_cycle_length = estimate_cycle_length(&person_cycles);

    Self {
      person_id: person_id.to_string(),
      cycles: person_cycles,
      estimated_cycle_length,
    }
  }

  pub fn person_id(&self) -> &str {
    &self.person_id
  }

  pub fn cycles(&self) -> &[CycleRecord] {
    &self.cycles
  }

  pub fn is_empty(&self) -> bool {
    self.cycles.is_empty()
  }

  pub fn estimated_cycle_length(&self) -> i64 {
    self.estimated_cycle_length
  }

  /// Most recent cycle by start date
  pub fn latest(&self) -> Option<&CycleRecord> {
    self.cycles.last()
  }

  /// Last day of a cycle: recorded end, or start + estimated length - 1
  pub fn effective_end(&self, cycle: &CycleRecord) -> NaiveDate {
    match cycle.cycle_end_date {
      Some(end) => end,
      None => add_days(cycle.period_start_date, self.estimated_cycle_length - 1),
    }
  }

  /// First cycle (earliest start) whose inclusive range contains `day`
  pub fn resolve(&self, day: NaiveDate) -> Option<(&CycleRecord, i64)> {
    let found = self.cycles.iter().find(|c| {
      c.period_start_date <= day && day <= self.effective_end(c)
    });

    match found {
      Some(cycle) => {
        let day_in_cycle = (day - cycle.period_start_date).num_days() + 1;
        Some((cycle, day_in_cycle))
      }
      None => {
        tracing::trace!(person_id = %self.person_id, %day, "no tracked cycle covers day");
        None
      }
    }
  }

  /// Phase for a calendar day, or None if no tracked cycle covers it
  pub fn phase_for_day(&self, day: NaiveDate) -> Option<PhaseDescriptor> {
    self.phase_for_day_with(day, &[], None)
  }

  /// Same as `phase_for_day`, with symptoms and mood folded into the
  /// recommendations
  pub fn phase_for_day_with(&self, day: NaiveDate, symptoms: &[String], mood: Option<&str>) -> Option<PhaseDescriptor> {
    let (cycle, day_in_cycle) = self.resolve(day)?;

    let period_length = cycle.recorded_period_length().unwrap_or(DEFAULT_PERIOD_LENGTH);
    let cycle_length = cycle
      .recorded_cycle_length()
      .unwrap_or(self.estimated_cycle_length);

    let ctx = DayContext {
      historical_cycles: &self.cycles,
      symptoms,
      mood,
    };

    Some(classify_day(day_in_cycle, cycle_length, period_length, &ctx))
  }
}

/// Shift a date, pinned to `NaiveDate::MIN`/`MAX` instead of overflowing
pub(crate) fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
  match Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta)) {
    Some(shifted) => shifted,
    None if days < 0 => NaiveDate::MIN,
    None => NaiveDate::MAX,
  }
}

/// Find the cycle containing `day` for `person_id`.
///
/// When records overlap, the one that started earliest wins.
pub fn resolve_day_to_cycle(day: NaiveDate, person_id: &str, cycles: &[CycleRecord]) -> Option<ResolvedDay> {
  let profile = CycleProfile::for_person(person_id, cycles);
  profile.resolve(day).map(|(cycle, day_in_cycle)| ResolvedDay {
    cycle: cycle.clone(),
    day_in_cycle,
  })
}

/// Resolve then classify. `None` means no tracked cycle covers the day,
/// which is different from a covered day whose phase is `unknown`.
pub fn get_phase_for_day(day: NaiveDate, person_id: &str, cycles: &[CycleRecord]) -> Option<PhaseDescriptor> {
  CycleProfile::for_person(person_id, cycles).phase_for_day(day)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
