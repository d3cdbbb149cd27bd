use std::time::Duration;

use anyhow::{Context, Result};
use gtb_config::{NotifierConfig, NotifyMode, ResolvedSecrets};
use gtb_notify::{DisabledNotifier, Dispatcher, LocalNotifier, NtfyConfig, NtfyNotifier};

/// Pick the transport for this run.
///
/// | mode    | `notify.enabled` | transport             |
/// |---------|------------------|-----------------------|
/// | `ntfy`  | true             | [`NtfyNotifier`]      |
/// | `ntfy`  | false            | [`DisabledNotifier`]  |
/// | `local` | any              | [`LocalNotifier`]     |
///
/// The enable switch only gates the push send; a local notification is
/// always shown.
pub fn build_dispatcher(
    cfg: &NotifierConfig,
    secrets: &ResolvedSecrets,
) -> Result<Box<dyn Dispatcher>> {
    match cfg.notify.mode {
        NotifyMode::Local => Ok(Box::new(LocalNotifier::new())),
        NotifyMode::Ntfy if !cfg.notify.enabled => Ok(Box::new(DisabledNotifier::new("ntfy"))),
        NotifyMode::Ntfy => {
            let notifier = NtfyNotifier::new(NtfyConfig {
                server: cfg.notify.ntfy.server.clone(),
                topic: cfg.notify.ntfy.topic.clone(),
                token: secrets.ntfy_token.clone(),
                timeout: Duration::from_secs(cfg.notify.timeout_secs),
            })
            .context("ntfy client init failed")?;
            Ok(Box::new(notifier))
        }
    }
}
