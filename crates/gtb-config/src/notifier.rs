//! Typed view of the merged config tree.
//!
//! Every key is optional; a missing key takes the default listed on its
//! section struct. Validation happens once, in [`NotifierConfig::from_json`],
//! so downstream code can treat the value as well formed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use gtb_fixing::{FixingRules, WindowSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Notify mode
// ---------------------------------------------------------------------------

/// Which transport delivers the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// HTTP push to an ntfy server.
    #[default]
    Ntfy,
    /// OS notification on the machine running the check.
    Local,
}

impl NotifyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyMode::Ntfy => "ntfy",
            NotifyMode::Local => "local",
        }
    }

    /// Case-insensitive parse of `ntfy` / `local`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ntfy" => Some(NotifyMode::Ntfy),
            "local" => Some(NotifyMode::Local),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixingSection {
    pub include_day31: bool,
    pub include_feb_last_day: bool,
    pub exclude_yearend_closure: bool,
}

impl Default for FixingSection {
    fn default() -> Self {
        Self {
            include_day31: true,
            include_feb_last_day: true,
            exclude_yearend_closure: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayFileSection {
    pub enabled: bool,
    pub path: PathBuf,
}

impl HolidayFileSection {
    fn with_path(path: &str) -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(path),
        }
    }
}

impl Default for HolidayFileSection {
    fn default() -> Self {
        Self::with_path("holidays.csv")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidaysSection {
    pub jp: HolidayFileSection,
    pub us: HolidayFileSection,
}

impl Default for HolidaysSection {
    fn default() -> Self {
        Self {
            jp: HolidayFileSection::with_path("jp_holidays.csv"),
            us: HolidayFileSection::with_path("fed_bank_holidays.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    /// `false` skips the window check entirely.
    pub enforce: bool,
    /// IANA zone name of the observer calendar.
    pub timezone: String,
    /// `HH:MM` on the day before the fixing day.
    pub prev_day_start: String,
    /// `HH:MM` on the fixing day (exclusive).
    pub fixing_end: String,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            enforce: true,
            timezone: "Asia/Tokyo".to_string(),
            prev_day_start: "10:00".to_string(),
            fixing_end: "09:55".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NtfySection {
    pub server: String,
    pub topic: String,
    /// NAME of the env var holding the access token. Never the token.
    pub token_env: Option<String>,
}

impl Default for NtfySection {
    fn default() -> Self {
        Self {
            server: "https://ntfy.sh".to_string(),
            topic: "gotobi-fixing".to_string(),
            token_env: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    pub mode: NotifyMode,
    /// `false` skips the push send (the decision is still recorded).
    pub enabled: bool,
    pub title: String,
    pub priority: String,
    pub timeout_secs: u64,
    pub ntfy: NtfySection,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            mode: NotifyMode::Ntfy,
            enabled: true,
            title: "gotobi-fixing".to_string(),
            priority: "default".to_string(),
            timeout_secs: 15,
            ntfy: NtfySection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSection {
    pub path: PathBuf,
    /// `false` leaves the state file untouched after a dispatch.
    pub update: bool,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gotobi-fixing.state.json"),
            update: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Delay before the single re-run after a failed attempt.
    pub retry_delay_secs: u64,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            retry_delay_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub fixing: FixingSection,
    pub holidays: HolidaysSection,
    pub window: WindowSection,
    pub notify: NotifySection,
    pub state: StateSection,
    pub runtime: RuntimeSection,
}

impl NotifierConfig {
    /// Deserialize and validate the merged config tree.
    ///
    /// Unknown keys are not an error here; see
    /// [`crate::report_unused_keys`].
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: NotifierConfig = serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: config does not match the expected shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the cross-field rules serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.timezone()?;
        parse_hhmm(&self.window.prev_day_start)
            .with_context(|| "CONFIG_INVALID: /window/prev_day_start".to_string())?;
        parse_hhmm(&self.window.fixing_end)
            .with_context(|| "CONFIG_INVALID: /window/fixing_end".to_string())?;

        if self.notify.mode == NotifyMode::Ntfy {
            if self.notify.ntfy.server.trim().is_empty() {
                bail!("CONFIG_INVALID: /notify/ntfy/server must not be empty in ntfy mode");
            }
            if self.notify.ntfy.topic.trim().trim_start_matches('/').is_empty() {
                bail!("CONFIG_INVALID: /notify/ntfy/topic must not be empty in ntfy mode");
            }
        }
        if self.notify.timeout_secs == 0 {
            bail!("CONFIG_INVALID: /notify/timeout_secs must be > 0");
        }
        if self.state.path.as_os_str().is_empty() {
            bail!("CONFIG_INVALID: /state/path must not be empty");
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        let name = self.window.timezone.trim();
        name.parse::<Tz>().map_err(|_| {
            anyhow::anyhow!("CONFIG_INVALID: /window/timezone unknown time zone '{name}'")
        })
    }

    pub fn fixing_rules(&self) -> FixingRules {
        FixingRules {
            include_day31: self.fixing.include_day31,
            include_feb_last_day: self.fixing.include_feb_last_day,
            exclude_yearend_closure: self.fixing.exclude_yearend_closure,
            enable_holiday_jp: self.holidays.jp.enabled,
            enable_holiday_us: self.holidays.us.enabled,
        }
    }

    pub fn window_spec(&self) -> Result<WindowSpec> {
        Ok(WindowSpec {
            tz: self.timezone()?,
            prev_day_start: parse_hhmm(&self.window.prev_day_start)?,
            fixing_end: parse_hhmm(&self.window.fixing_end)?,
        })
    }

    /// Rebase every relative path onto `base_dir`. Absolute paths are kept.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for p in [
            &mut self.holidays.jp.path,
            &mut self.holidays.us.path,
            &mut self.state.path,
        ] {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        }
    }
}

/// Parse `H:MM` / `HH:MM` (24h).
pub fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    let t = s.trim();
    let Some((h, m)) = t.split_once(':') else {
        bail!("expected HH:MM, got '{t}'");
    };
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        bail!("expected HH:MM, got '{t}'");
    }
    let hour: u32 = h.parse().with_context(|| format!("bad hour in '{t}'"))?;
    let minute: u32 = m.parse().with_context(|| format!("bad minute in '{t}'"))?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow::anyhow!("time out of range: '{t}'"))
}
