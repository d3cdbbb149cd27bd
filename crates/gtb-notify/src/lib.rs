//! gtb-notify
//!
//! Notification boundary for the fixing notifier.
//!
//! This crate defines the [`Dispatcher`] trait and the concrete transports.
//! It knows nothing about fixing days or dedup: callers build a
//! [`Notification`] and decide what an outcome means for persisted state.
//!
//! | Transport            | Type                  | Failure mode                       |
//! |----------------------|-----------------------|------------------------------------|
//! | ntfy HTTP push       | [`NtfyNotifier`]      | `Err(DispatchError)` (retryable)   |
//! | OS notification      | [`LocalNotifier`]     | `Ok(Unavailable)`, warning only    |
//! | push disabled (dry)  | [`DisabledNotifier`]  | never fails                        |

mod local;
mod ntfy;

pub use local::{LocalBackend, LocalNotifier};
pub use ntfy::{NtfyConfig, NtfyNotifier};

use std::fmt;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One alert as handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// Transport-specific priority string (ntfy: `min|low|default|high|max`).
    pub priority: String,
}

// ---------------------------------------------------------------------------
// Outcome / error
// ---------------------------------------------------------------------------

/// Result of a dispatch that did not fail.
///
/// Every variant counts as a successful decision for state purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The transport accepted the notification.
    Sent,
    /// Sending was disabled by configuration.
    Skipped,
    /// No local notification program could be used. Logged as a warning.
    Unavailable,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Sent => "sent",
            DispatchOutcome::Skipped => "skipped",
            DispatchOutcome::Unavailable => "unavailable",
        }
    }
}

/// A transport failure. All variants are treated as transient by the
/// runtime and retried once.
#[derive(Debug)]
pub enum DispatchError {
    /// The HTTP client could not be built.
    Client(String),
    /// Connection, TLS or timeout failure.
    Transport(String),
    /// The server answered with a non-2xx status.
    Status { code: u16, reason: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Client(msg) => write!(f, "http client error: {msg}"),
            DispatchError::Transport(msg) => write!(f, "transport error: {msg}"),
            DispatchError::Status { code, reason } => {
                write!(f, "http error status={code} {reason}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

// ---------------------------------------------------------------------------
// Dispatcher trait
// ---------------------------------------------------------------------------

/// Delivery contract. Object safe so the runtime can hold a
/// `Box<dyn Dispatcher>` chosen at startup.
pub trait Dispatcher {
    /// Short transport name used in logs and the state file (`ntfy`, `local`).
    fn name(&self) -> &'static str;

    fn dispatch(&self, notification: &Notification) -> Result<DispatchOutcome, DispatchError>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn dispatch(&self, notification: &Notification) -> Result<DispatchOutcome, DispatchError> {
        (**self).dispatch(notification)
    }
}

/// Stand-in for a transport whose sending is switched off (`--no-ntfy`,
/// `--dry-run`, `notify.enabled: false`).
#[derive(Debug, Clone, Copy)]
pub struct DisabledNotifier {
    name: &'static str,
}

impl DisabledNotifier {
    /// `name` is the transport that would have been used.
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Dispatcher for DisabledNotifier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn dispatch(&self, notification: &Notification) -> Result<DispatchOutcome, DispatchError> {
        tracing::info!(
            transport = self.name,
            title = %notification.title,
            "notification send disabled; skipping"
        );
        Ok(DispatchOutcome::Skipped)
    }
}
