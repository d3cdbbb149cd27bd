//! gtb-fixing
//!
//! Gotobi fixing-day determination.
//!
//! - Calendar classification (weekend, holiday sets, year-end closure)
//! - Bounded roll-back to the preceding business day
//! - Monthly base-day candidates and the fixing-day test
//! - Pre-fixing notification window
//! - Once-per-fixing-day dedup state
//!
//! Pure deterministic logic. No IO, no wall-clock. The runtime supplies `now`
//! and the loaded holiday sets.

mod calendar;
mod dedup;
mod engine;
mod types;
mod window;

pub use calendar::{
    is_non_business_day, is_weekend, is_yearend_closure_day, normalize_business_day,
    MAX_ROLLBACK_DAYS,
};
pub use dedup::{DedupDecision, DedupState};
pub use engine::{build_base_days, choose_fixing_date, determine_fixing, explain_month, Candidate};
pub use types::*;
pub use window::{in_notify_window, local_instant, window_bounds};
