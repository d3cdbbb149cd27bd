//! `gotobi run`: evaluate the current instant and notify once per fixing day.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gtb_config::{resolve_secrets, NotifierConfig, NotifyMode};
use gtb_runtime::{build_dispatcher, evaluate_and_notify, ExitStatus, RunDeps, RunSettings};

use super::load_notifier_config;
use super::now::parse_now;

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Layered config paths in merge order (repeatable)
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Fail when the config has keys nothing reads
    #[arg(long, default_value_t = false)]
    pub strict_config: bool,

    /// Japanese holiday file
    #[arg(long, env = "GOTOBI_HOLIDAY_JP")]
    pub jp: Option<PathBuf>,

    /// US holiday file
    #[arg(long, env = "GOTOBI_HOLIDAY_US")]
    pub us: Option<PathBuf>,

    /// State file path
    #[arg(long, env = "GOTOBI_STATE")]
    pub state: Option<PathBuf>,

    #[arg(long, env = "NTFY_SERVER")]
    pub ntfy_server: Option<String>,

    #[arg(long, env = "NTFY_TOPIC")]
    pub ntfy_topic: Option<String>,

    #[arg(long, env = "NTFY_TITLE")]
    pub ntfy_title: Option<String>,

    /// ntfy priority (min | low | default | high | max)
    #[arg(long, env = "NTFY_PRIORITY")]
    pub ntfy_priority: Option<String>,

    /// Transport: ntfy (default) or local OS notification
    #[arg(long = "notify", env = "GOTOBI_NOTIFY_MODE", value_parser = ["ntfy", "local"])]
    pub notify: Option<String>,

    /// Skip the notification-window check
    #[arg(long, default_value_t = false)]
    pub no_window: bool,

    /// Pretend the current time is this (e.g. "2026-01-02 12:34")
    #[arg(long)]
    pub now: Option<String>,

    /// Do not send the ntfy push
    #[arg(long, default_value_t = false)]
    pub no_ntfy: bool,

    /// Do not update the state file
    #[arg(long, alias = "no-state-update", default_value_t = false)]
    pub no_state: bool,

    /// Same as --no-ntfy --no-state
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Flags and env vars win over the config files.
    pub fn apply_overrides(&self, cfg: &mut NotifierConfig) -> Result<()> {
        if let Some(p) = &self.jp {
            cfg.holidays.jp.path = p.clone();
        }
        if let Some(p) = &self.us {
            cfg.holidays.us.path = p.clone();
        }
        if let Some(p) = &self.state {
            cfg.state.path = p.clone();
        }
        if let Some(s) = &self.ntfy_server {
            cfg.notify.ntfy.server = s.clone();
        }
        if let Some(s) = &self.ntfy_topic {
            cfg.notify.ntfy.topic = s.clone();
        }
        if let Some(s) = &self.ntfy_title {
            cfg.notify.title = s.clone();
        }
        if let Some(s) = &self.ntfy_priority {
            cfg.notify.priority = s.clone();
        }
        if let Some(m) = &self.notify {
            cfg.notify.mode = NotifyMode::parse(m)
                .with_context(|| format!("invalid --notify '{m}'. expected one of: ntfy | local"))?;
        }
        if self.no_window {
            cfg.window.enforce = false;
        }
        if self.no_ntfy || self.dry_run {
            cfg.notify.enabled = false;
        }
        if self.no_state || self.dry_run {
            cfg.state.update = false;
        }
        cfg.validate()
    }
}

/// Everything up to the evaluation is an input error (`Err`); the
/// evaluation itself reports through the returned status.
pub fn run_cmd(args: &RunArgs) -> Result<ExitStatus> {
    let mut cfg = load_notifier_config(&args.config_paths, args.strict_config)?;
    args.apply_overrides(&mut cfg)?;

    let settings = RunSettings::from_config(&cfg)?;
    let tz = settings.window.tz;

    let fixed_now = match args.now.as_deref() {
        Some(raw) => Some(parse_now(raw, tz)?),
        None => None,
    };
    if let Some(now) = &fixed_now {
        tracing::info!(now = %now.to_rfc3339(), "using --now");
    }

    let secrets = resolve_secrets(&cfg)?;
    let dispatcher = build_dispatcher(&cfg, &secrets)?;

    let clock = || fixed_now.unwrap_or_else(|| chrono::Utc::now().with_timezone(&tz));
    let deps = RunDeps {
        dispatcher: dispatcher.as_ref(),
        sleep: &std::thread::sleep,
    };

    Ok(evaluate_and_notify(&clock, &settings, &deps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_disables_push_and_state() {
        let args = RunArgs {
            dry_run: true,
            ..RunArgs::default()
        };
        let mut cfg = NotifierConfig::default();
        args.apply_overrides(&mut cfg).unwrap();
        assert!(!cfg.notify.enabled);
        assert!(!cfg.state.update);
        assert!(cfg.window.enforce);
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = RunArgs {
            ntfy_topic: Some("alt-topic".to_string()),
            notify: Some("local".to_string()),
            state: Some(PathBuf::from("/tmp/s.json")),
            no_window: true,
            ..RunArgs::default()
        };
        let mut cfg = NotifierConfig::default();
        args.apply_overrides(&mut cfg).unwrap();
        assert_eq!(cfg.notify.ntfy.topic, "alt-topic");
        assert_eq!(cfg.notify.mode, NotifyMode::Local);
        assert_eq!(cfg.state.path, PathBuf::from("/tmp/s.json"));
        assert!(!cfg.window.enforce);
    }

    #[test]
    fn empty_topic_override_fails_validation() {
        let args = RunArgs {
            ntfy_topic: Some(String::new()),
            ..RunArgs::default()
        };
        assert!(args.apply_overrides(&mut NotifierConfig::default()).is_err());
    }
}
