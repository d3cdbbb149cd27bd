//! gtb-state
//!
//! The persisted "last notified" record.
//!
//! On disk this is one pretty-printed JSON object:
//!
//! ```json
//! {
//!   "last_notified_fixing_yyyymmdd": 20261230,
//!   "last_notified_at_jst": "2026-12-29T10:05:00+09:00",
//!   "notify_mode": "ntfy",
//!   "ntfy_server": "https://ntfy.sh",
//!   "ntfy_topic": "gotobi-fixing"
//! }
//! ```
//!
//! Keys this crate does not know are kept and written back unchanged.
//!
//! Reading never fails: a missing, unreadable or non-object file is the
//! empty state. Writing goes to `<path>.tmp` first and is renamed over the
//! target, so a crash mid-write leaves the previous file intact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gtb_fixing::DedupState;
use serde_json::{Map, Value};

pub const KEY_LAST_FIXING: &str = "last_notified_fixing_yyyymmdd";
pub const KEY_LAST_AT: &str = "last_notified_at_jst";
pub const KEY_NOTIFY_MODE: &str = "notify_mode";
pub const KEY_NTFY_SERVER: &str = "ntfy_server";
pub const KEY_NTFY_TOPIC: &str = "ntfy_topic";

/// In-memory view of the state file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    fields: Map<String, Value>,
}

/// Metadata written with a new fixing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord<'a> {
    pub fixing_key: u32,
    /// RFC 3339 instant in the observer zone.
    pub notified_at: String,
    pub notify_mode: &'a str,
    /// `(server, topic)` when the push transport was used.
    pub ntfy: Option<(&'a str, &'a str)>,
}

impl NotificationState {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Stored key, `0` when absent or not a non-negative integer.
    ///
    /// A numeric string is accepted too; hand-edited files are common.
    pub fn last_notified_key(&self) -> u32 {
        match self.fields.get(KEY_LAST_FIXING) {
            Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()).unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn last_notified_at(&self) -> Option<&str> {
        self.fields.get(KEY_LAST_AT).and_then(Value::as_str)
    }

    pub fn notify_mode(&self) -> Option<&str> {
        self.fields.get(KEY_NOTIFY_MODE).and_then(Value::as_str)
    }

    /// Boot the dedup state machine from this record.
    pub fn dedup_state(&self) -> DedupState {
        DedupState::boot(Some(self.last_notified_key()))
    }

    /// Overwrite the known keys; every other key is left alone.
    pub fn record(&mut self, rec: &DispatchRecord<'_>) {
        self.fields
            .insert(KEY_LAST_FIXING.to_string(), Value::from(rec.fixing_key));
        self.fields.insert(
            KEY_LAST_AT.to_string(),
            Value::String(rec.notified_at.clone()),
        );
        self.fields.insert(
            KEY_NOTIFY_MODE.to_string(),
            Value::String(rec.notify_mode.to_string()),
        );
        if let Some((server, topic)) = rec.ntfy {
            self.fields
                .insert(KEY_NTFY_SERVER.to_string(), Value::String(server.to_string()));
            self.fields
                .insert(KEY_NTFY_TOPIC.to_string(), Value::String(topic.to_string()));
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Read the state file. Never fails; see the crate docs.
pub fn load_state(path: &Path) -> NotificationState {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return NotificationState::default();
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "state file unreadable; starting empty"
            );
            return NotificationState::default();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => NotificationState::from_map(map),
        Ok(_) => {
            tracing::warn!(
                path = %path.display(),
                "state file is not a JSON object; starting empty"
            );
            NotificationState::default()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "state file corrupt; starting empty"
            );
            NotificationState::default()
        }
    }
}

/// `<path>.tmp`, next to the target so the rename stays on one filesystem.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

/// Write atomically: temp file, then rename over `path`.
pub fn save_state(path: &Path, state: &NotificationState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create state dir failed: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(&Value::Object(state.fields.clone()))
        .context("serialize state failed")?;

    let tmp = temp_path(path);
    fs::write(&tmp, format!("{json}\n"))
        .with_context(|| format!("write state temp file failed: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replace state file failed: {}", path.display()))?;
    Ok(())
}
