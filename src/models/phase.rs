use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Coarse Phase
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Menstrual,
  Follicular,
  Fertile,
  Luteal,
  Unknown,
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Menstrual => write!(f, "menstrual"),
      Self::Follicular => write!(f, "follicular"),
      Self::Fertile => write!(f, "fertile"),
      Self::Luteal => write!(f, "luteal"),
      Self::Unknown => write!(f, "unknown"),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Sub-Phase: fine-grained position within a coarse phase
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubPhase {
  HeavyFlow,
  LightFlow,
  EarlyFollicular,
  LateFollicular,
  FertileWindow,
  Ovulation,
  EarlyLuteal,
  LateLuteal,
  Unknown,
}

impl SubPhase {
  /// The coarse phase this sub-phase belongs to
  pub fn phase(self) -> Phase {
    match self {
      Self::HeavyFlow | Self::LightFlow => Phase::Menstrual,
      Self::EarlyFollicular | Self::LateFollicular => Phase::Follicular,
      Self::FertileWindow | Self::Ovulation => Phase::Fertile,
      Self::EarlyLuteal | Self::LateLuteal => Phase::Luteal,
      Self::Unknown => Phase::Unknown,
    }
  }
}

impl std::fmt::Display for SubPhase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::HeavyFlow => "heavy_flow",
      Self::LightFlow => "light_flow",
      Self::EarlyFollicular => "early_follicular",
      Self::LateFollicular => "late_follicular",
      Self::FertileWindow => "fertile_window",
      Self::Ovulation => "ovulation",
      Self::EarlyLuteal => "early_luteal",
      Self::LateLuteal => "late_luteal",
      Self::Unknown => "unknown",
    };
    write!(f, "{}", s)
  }
}

impl std::str::FromStr for SubPhase {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "heavy_flow" => Ok(Self::HeavyFlow),
      "light_flow" => Ok(Self::LightFlow),
      "early_follicular" => Ok(Self::EarlyFollicular),
      "late_follicular" => Ok(Self::LateFollicular),
      "fertile_window" => Ok(Self::FertileWindow),
      "ovulation" => Ok(Self::Ovulation),
      "early_luteal" => Ok(Self::EarlyLuteal),
      "late_luteal" => Ok(Self::LateLuteal),
      "unknown" => Ok(Self::Unknown),
      _ => Err(format!("Unknown sub-phase: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Phase Descriptor: computed per day, never persisted
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
  pub phase: Phase,
  pub sub_phase: SubPhase,
  pub day_in_cycle: i64,
  pub cycle_length_estimate: i64,
  pub period_length_estimate: i64,
  /// Ovulation day the fertile window and luteal split were anchored on
  pub ovulation_day: i64,
  pub color: String,
  pub emoji: String,
  pub description: String,
  pub day_range: String,
  pub hormonal_profile: String,
  pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sub_phase_maps_to_phase() {
    assert_eq!(SubPhase::HeavyFlow.phase(), Phase::Menstrual);
    assert_eq!(SubPhase::LateFollicular.phase(), Phase::Follicular);
    assert_eq!(SubPhase::Ovulation.phase(), Phase::Fertile);
    assert_eq!(SubPhase::LateLuteal.phase(), Phase::Luteal);
    assert_eq!(SubPhase::Unknown.phase(), Phase::Unknown);
  }

  #[test]
  fn test_sub_phase_display_matches_serde() {
    for sub in [SubPhase::FertileWindow, SubPhase::EarlyLuteal, SubPhase::Unknown] {
      let json = serde_json::to_string(&sub).unwrap();
      assert_eq!(json, format!("\"{}\"", sub));
      assert_eq!(sub.to_string().parse::<SubPhase>(), Ok(sub));
    }
  }

  #[test]
  fn test_unknown_sub_phase_string_rejected() {
    assert!("pms".parse::<SubPhase>().is_err());
  }
}
