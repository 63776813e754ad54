pub mod calendar;
pub mod cycles;
