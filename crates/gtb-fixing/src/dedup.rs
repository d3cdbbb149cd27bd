//! Once-per-fixing-day dedup state.
//!
//! # Invariants
//!
//! - **One value**: the only state is the `YYYYMMDD` key of the last fixing
//!   day a notification was dispatched for. `0` means none.
//!
//! - **Unknown boots empty**: a missing, unreadable or undecodable persisted
//!   value boots as the empty state. At worst that repeats one notification;
//!   it never hides one.
//!
//! - **Only dispatch advances**: [`DedupState::record_dispatch`] is the only
//!   transition and callers invoke it after a successful dispatch decision.
//!   A suppressed run leaves the state untouched.
//!
//! - **No expiry**: a key, once recorded, stays suppressed for that key.
//!
//! The state is a plain value passed in and returned. Loading and saving it
//! is the caller's job.

use crate::CivilDate;

/// What to do with the fixing day found by this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupDecision {
    /// Already notified for this fixing day. No dispatch, no state change.
    Suppress,
    /// Not yet notified. Dispatch, then record.
    Dispatch,
}

impl DedupDecision {
    /// Compare a stored key against the key of the fixing day just found.
    pub fn evaluate(stored_key: u32, fixing_key: u32) -> Self {
        if stored_key == fixing_key {
            DedupDecision::Suppress
        } else {
            DedupDecision::Dispatch
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DedupState {
    last_notified_key: u32,
}

impl DedupState {
    /// Boot from whatever the store held.
    ///
    /// | Persisted                 | Boot result          |
    /// |---------------------------|----------------------|
    /// | `None`                    | empty (`0`)          |
    /// | `Some(0)`                 | empty (`0`)          |
    /// | `Some(k)`, `k` a date key | `k`                  |
    /// | `Some(k)`, garbage        | empty (`0`)          |
    pub fn boot(persisted: Option<u32>) -> Self {
        let last_notified_key = persisted
            .and_then(CivilDate::from_key)
            .map(|d| d.key())
            .unwrap_or(0);
        Self { last_notified_key }
    }

    pub fn last_notified_key(&self) -> u32 {
        self.last_notified_key
    }

    pub fn last_notified(&self) -> Option<CivilDate> {
        CivilDate::from_key(self.last_notified_key)
    }

    pub fn decide(&self, fixing_date: CivilDate) -> DedupDecision {
        DedupDecision::evaluate(self.last_notified_key, fixing_date.key())
    }

    /// State after a successful dispatch for `fixing_date`.
    pub fn record_dispatch(self, fixing_date: CivilDate) -> Self {
        Self {
            last_notified_key: fixing_date.key(),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
