pub mod cycle;
pub mod phase;

pub use cycle::{CycleRecord, NewCycleRecord};
pub use phase::{Phase, PhaseDescriptor, SubPhase};
