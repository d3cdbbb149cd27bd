//! gtb-runtime
//!
//! One evaluation of "is there a fixing day to announce right now?", plus
//! the retry policy around it.
//!
//! Step order, short-circuiting as soon as a step finds nothing to do:
//!
//! 1. load holiday sets (input error on failure)
//! 2. choose today / tomorrow as the fixing day
//! 3. window check (skipped when not enforced)
//! 4. dedup against the persisted state
//! 5. dispatch
//! 6. persist the new state
//!
//! A failed attempt is re-run from step 1 once, after a delay. Input errors
//! are not retried.

mod dispatch;
mod message;

pub use dispatch::build_dispatcher;
pub use message::{build_message, minutes_until_cutoff};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use gtb_config::{NotifierConfig, NotifyMode};
use gtb_fixing::{
    choose_fixing_date, in_notify_window, CivilDate, DedupDecision, FixingRules, FixingWhen,
    HolidaySet, Holidays, WindowSpec,
};
use gtb_notify::{DispatchOutcome, Dispatcher, Notification};
use gtb_state::{load_state, save_state, DispatchRecord};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Everything one evaluation needs, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub rules: FixingRules,
    pub window: WindowSpec,
    pub enforce_window: bool,
    /// `None` when the calendar is disabled.
    pub jp_holidays: Option<PathBuf>,
    pub us_holidays: Option<PathBuf>,
    pub state_path: PathBuf,
    pub update_state: bool,
    pub title: String,
    pub priority: String,
    pub notify_mode: NotifyMode,
    pub ntfy_server: String,
    pub ntfy_topic: String,
    pub retry_delay: Duration,
}

impl RunSettings {
    /// Paths are taken as they are; resolve them on the config first.
    pub fn from_config(cfg: &NotifierConfig) -> Result<Self> {
        Ok(Self {
            rules: cfg.fixing_rules(),
            window: cfg.window_spec()?,
            enforce_window: cfg.window.enforce,
            jp_holidays: cfg
                .holidays
                .jp
                .enabled
                .then(|| cfg.holidays.jp.path.clone()),
            us_holidays: cfg
                .holidays
                .us
                .enabled
                .then(|| cfg.holidays.us.path.clone()),
            state_path: cfg.state.path.clone(),
            update_state: cfg.state.update,
            title: cfg.notify.title.clone(),
            priority: cfg.notify.priority.clone(),
            notify_mode: cfg.notify.mode,
            ntfy_server: cfg.notify.ntfy.server.clone(),
            ntfy_topic: cfg.notify.ntfy.topic.clone(),
            retry_delay: Duration::from_secs(cfg.runtime.retry_delay_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Outcomes and errors
// ---------------------------------------------------------------------------

/// What a successful evaluation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Neither today nor tomorrow is a fixing day.
    NoFixing,
    /// A fixing day was found but `now` is outside its window.
    OutsideWindow { fixing: CivilDate },
    /// Already notified for this fixing day.
    AlreadyNotified { fixing: CivilDate },
    /// A notification went through the dispatcher.
    Notified {
        fixing: CivilDate,
        base_day: u32,
        when: FixingWhen,
        dispatch: DispatchOutcome,
        state_updated: bool,
    },
}

/// Failure classes that drive the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Bad input data. Fatal, never retried.
    Input(String),
    /// Transport failure. Retried once.
    Transient(String),
    /// Anything else (e.g. the state write). Retried once.
    Unexpected(String),
}

impl RunError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RunError::Input(_))
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Input(msg) => write!(f, "input error: {msg}"),
            RunError::Transient(msg) => write!(f, "transient error: {msg}"),
            RunError::Unexpected(msg) => write!(f, "unexpected error: {msg}"),
        }
    }
}

impl std::error::Error for RunError {}

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Nothing to do, dispatched, or suppressed duplicate.
    Success,
    /// Transient or unexpected failure after the retry.
    Failure,
    /// Input or configuration error.
    InputError,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::InputError => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Single evaluation
// ---------------------------------------------------------------------------

fn load_calendar(path: Option<&Path>) -> Result<Option<HolidaySet>, RunError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let set = gtb_holidays::load_holiday_set(path).map_err(|e| RunError::Input(e.to_string()))?;
    tracing::debug!(path = %path.display(), dates = set.len(), "holiday file loaded");
    Ok(Some(set))
}

/// One pass through the steps. No retry, no sleeping.
pub fn run_once(
    now: DateTime<Tz>,
    settings: &RunSettings,
    dispatcher: &dyn Dispatcher,
) -> Result<RunOutcome, RunError> {
    let now = now.with_timezone(&settings.window.tz);
    let today = CivilDate::from_naive(now.date_naive())
        .ok_or_else(|| RunError::Input(format!("date out of range: {now}")))?;

    let jp = load_calendar(settings.jp_holidays.as_deref())?;
    let us = load_calendar(settings.us_holidays.as_deref())?;
    let holidays = Holidays::new(jp.as_ref(), us.as_ref());

    let Some(decision) = choose_fixing_date(today, holidays, &settings.rules) else {
        tracing::info!(now = %now.to_rfc3339(), "no fixing day today or tomorrow");
        return Ok(RunOutcome::NoFixing);
    };
    let fixing = decision.date;

    if settings.enforce_window && !in_notify_window(&now, fixing, &settings.window) {
        tracing::info!(
            now = %now.to_rfc3339(),
            fixing = %fixing,
            "fixing day found but outside the notification window"
        );
        return Ok(RunOutcome::OutsideWindow { fixing });
    }

    let mut state = load_state(&settings.state_path);
    if state.dedup_state().decide(fixing) == DedupDecision::Suppress {
        tracing::info!(
            fixing = %fixing,
            last_at = state.last_notified_at().unwrap_or("-"),
            last_mode = state.notify_mode().unwrap_or("-"),
            "already notified for this fixing day; skipping"
        );
        return Ok(RunOutcome::AlreadyNotified { fixing });
    }

    let message = build_message(&now, fixing, decision.base_day, &settings.window);
    tracing::info!(
        fixing = %fixing,
        base_day = decision.base_day,
        when = decision.when.as_str(),
        transport = dispatcher.name(),
        "notifying: {message}"
    );

    let notification = Notification {
        title: settings.title.clone(),
        message,
        priority: settings.priority.clone(),
    };
    let outcome = dispatcher
        .dispatch(&notification)
        .map_err(|e| RunError::Transient(format!("{} dispatch failed: {e}", dispatcher.name())))?;

    if outcome == DispatchOutcome::Unavailable {
        tracing::warn!("local notification unavailable; message was logged only");
    }

    let state_updated = if settings.update_state {
        let ntfy = (settings.notify_mode == NotifyMode::Ntfy)
            .then(|| (settings.ntfy_server.as_str(), settings.ntfy_topic.as_str()));
        state.record(&DispatchRecord {
            fixing_key: fixing.key(),
            notified_at: now.to_rfc3339(),
            notify_mode: settings.notify_mode.as_str(),
            ntfy,
        });
        save_state(&settings.state_path, &state)
            .map_err(|e| RunError::Unexpected(format!("{e:#}")))?;
        tracing::info!(path = %settings.state_path.display(), "state updated");
        true
    } else {
        tracing::info!("state update disabled; skipping");
        false
    };

    Ok(RunOutcome::Notified {
        fixing,
        base_day: decision.base_day,
        when: decision.when,
        dispatch: outcome,
        state_updated,
    })
}

// ---------------------------------------------------------------------------
// Retry wrapper
// ---------------------------------------------------------------------------

/// Collaborators of [`evaluate_and_notify`].
pub struct RunDeps<'a> {
    pub dispatcher: &'a dyn Dispatcher,
    /// Blocks for the retry delay. `std::thread::sleep` in production.
    pub sleep: &'a dyn Fn(Duration),
}

const MAX_ATTEMPTS: u32 = 2;

/// Run the evaluation with the one-retry policy and map the result to an
/// exit status.
///
/// `now` is called once per attempt, so a retry re-reads the clock.
pub fn evaluate_and_notify(
    now: &dyn Fn() -> DateTime<Tz>,
    settings: &RunSettings,
    deps: &RunDeps<'_>,
) -> ExitStatus {
    for attempt in 1..=MAX_ATTEMPTS {
        match run_once(now(), settings, deps.dispatcher) {
            Ok(_) => return ExitStatus::Success,
            Err(e @ RunError::Input(_)) => {
                tracing::error!(error = %e, "input data invalid");
                return ExitStatus::InputError;
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "run failed");
                if attempt < MAX_ATTEMPTS {
                    tracing::info!(
                        delay_secs = settings.retry_delay.as_secs(),
                        "re-evaluating after delay"
                    );
                    (deps.sleep)(settings.retry_delay);
                }
            }
        }
    }
    ExitStatus::Failure
}
