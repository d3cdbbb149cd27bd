//! ntfy HTTP push.
//!
//! `POST {server}/{topic}` with the message as a `text/plain` body and the
//! title / priority in the `Title` / `Priority` headers. Only the status
//! code of the reply is inspected.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::{DispatchError, DispatchOutcome, Dispatcher, Notification};

/// Connection settings for one ntfy topic.
#[derive(Clone)]
pub struct NtfyConfig {
    pub server: String,
    pub topic: String,
    /// Bearer token for protected topics. Never logged.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for NtfyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtfyConfig")
            .field("server", &self.server)
            .field("topic", &self.topic)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NtfyConfig {
    /// `https://ntfy.sh/` + `/topic` -> `https://ntfy.sh/topic`.
    pub fn publish_url(&self) -> String {
        format!(
            "{}/{}",
            self.server.trim().trim_end_matches('/'),
            self.topic.trim().trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    cfg: NtfyConfig,
    http: Client,
}

impl NtfyNotifier {
    pub fn new(cfg: NtfyConfig) -> Result<Self, DispatchError> {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;
        Ok(Self { cfg, http })
    }
}

impl Dispatcher for NtfyNotifier {
    fn name(&self) -> &'static str {
        "ntfy"
    }

    fn dispatch(&self, n: &Notification) -> Result<DispatchOutcome, DispatchError> {
        let url = self.cfg.publish_url();

        let mut req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(n.message.clone());

        // Header values must be visible ASCII; ntfy also reads both fields
        // from the query string, which has no such limit.
        if is_header_safe(&n.title) {
            req = req.header("Title", n.title.as_str());
        } else {
            req = req.query(&[("title", n.title.as_str())]);
        }
        if is_header_safe(&n.priority) {
            req = req.header("Priority", n.priority.as_str());
        } else {
            req = req.query(&[("priority", n.priority.as_str())]);
        }
        if let Some(token) = self.cfg.token.as_deref() {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .map_err(|e| DispatchError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DispatchError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        tracing::debug!(url = %url, status = status.as_u16(), "ntfy publish accepted");
        Ok(DispatchOutcome::Sent)
    }
}

fn is_header_safe(s: &str) -> bool {
    s.bytes().all(|b| (0x20..0x7f).contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(server: &str, topic: &str) -> NtfyConfig {
        NtfyConfig {
            server: server.to_string(),
            topic: topic.to_string(),
            token: Some("tk_secretsecret".to_string()),
            timeout: Duration::from_secs(15),
        }
    }

    #[test]
    fn url_trims_slashes() {
        assert_eq!(
            cfg("https://ntfy.sh/", "/gotobi").publish_url(),
            "https://ntfy.sh/gotobi"
        );
        assert_eq!(
            cfg(" https://ntfy.example ", " topic ").publish_url(),
            "https://ntfy.example/topic"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let dbg = format!("{:?}", cfg("https://ntfy.sh", "t"));
        assert!(!dbg.contains("secretsecret"));
        assert!(dbg.contains("<REDACTED>"));
    }

    #[test]
    fn header_safety() {
        assert!(is_header_safe("gotobi-fixing"));
        assert!(!is_header_safe("五十日"));
        assert!(!is_header_safe("a\nb"));
    }
}
