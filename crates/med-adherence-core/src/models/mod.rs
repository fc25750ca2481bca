//! Domain models for medication tracking.

mod adherence;
mod dose_log;
mod medication;

pub use adherence::*;
pub use dose_log::*;
pub use medication::*;
