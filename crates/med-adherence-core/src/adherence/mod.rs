//! Adherence aggregation.
//!
//! Turns a medication's raw dose-log history into one status per calendar
//! day over a trailing window:
//!
//! ```text
//!  entries ──► group by calendar day (reference zone)
//!                 │
//!                 ▼
//!          keep max (logged_at, id) per day      ◄── latest-wins
//!                 │
//!                 ▼
//!   for each of the N days ending today: winner's status, else Pending
//! ```

mod window;

pub use window::*;

/// Window length used by the medication list view.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Longest window a caller may request.
pub const MAX_WINDOW_DAYS: u32 = 366;
