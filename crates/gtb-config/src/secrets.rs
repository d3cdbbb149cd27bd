//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only the env var NAME of the ntfy access token
//!   (`/notify/ntfy/token_env`).
//! - Callers invoke [`resolve_secrets`] once at startup and hand the result
//!   to the transport constructor.
//! - `Debug` redacts values; errors name the variable, never the value.
//!
//! The token is optional: a public ntfy topic needs none. Naming a variable
//! that is unset or blank is a configuration error though, because the
//! operator clearly meant to authenticate.

use anyhow::{bail, Result};

use crate::NotifierConfig;

/// Secrets resolved from the environment for one run.
#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    /// ntfy bearer token. `None` when no `token_env` is configured.
    pub ntfy_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("ntfy_token", &self.ntfy_token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Returns `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Resolve every secret the config refers to.
///
/// # Errors
/// `SECRETS_MISSING` with the variable NAME when `token_env` is set but the
/// variable is absent or blank.
pub fn resolve_secrets(cfg: &NotifierConfig) -> Result<ResolvedSecrets> {
    let var = cfg
        .notify
        .ntfy
        .token_env
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let Some(var) = var else {
        return Ok(ResolvedSecrets::default());
    };

    match resolve_env(var) {
        Some(token) => Ok(ResolvedSecrets {
            ntfy_token: Some(token),
        }),
        None => bail!(
            "SECRETS_MISSING: env var '{}' (ntfy access token) is not set or empty",
            var
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let s = ResolvedSecrets {
            ntfy_token: Some("tk_supersecretvalue".to_string()),
        };
        let dbg = format!("{s:?}");
        assert!(dbg.contains("<REDACTED>"));
        assert!(!dbg.contains("supersecret"));
    }

    #[test]
    fn no_token_env_means_no_token() {
        let s = resolve_secrets(&NotifierConfig::default()).unwrap();
        assert!(s.ntfy_token.is_none());
    }

    #[test]
    fn blank_token_env_name_is_ignored() {
        let mut cfg = NotifierConfig::default();
        cfg.notify.ntfy.token_env = Some("  ".to_string());
        assert!(resolve_secrets(&cfg).unwrap().ntfy_token.is_none());
    }
}
