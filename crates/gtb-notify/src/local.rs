//! OS-local notification fallback chain.
//!
//! Backends are tried in a fixed order and the first program found on the
//! search path is used:
//!
//! 1. `termux-notification` (Android / Termux)
//! 2. `notify-send` (Linux desktops)
//! 3. `osascript` (macOS only)
//! 4. `powershell` balloon tip (Windows only)
//!
//! Nothing here is ever an error. A missing program, a spawn failure or an
//! unsupported platform yields [`DispatchOutcome::Unavailable`] and the
//! caller logs a warning.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::{DispatchError, DispatchOutcome, Dispatcher, Notification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalBackend {
    Termux,
    NotifySend,
    OsaScript,
    PowerShell,
}

impl LocalBackend {
    /// Fallback order.
    pub const CHAIN: [LocalBackend; 4] = [
        LocalBackend::Termux,
        LocalBackend::NotifySend,
        LocalBackend::OsaScript,
        LocalBackend::PowerShell,
    ];

    pub fn program(&self) -> &'static str {
        match self {
            LocalBackend::Termux => "termux-notification",
            LocalBackend::NotifySend => "notify-send",
            LocalBackend::OsaScript => "osascript",
            LocalBackend::PowerShell => "powershell",
        }
    }

    /// Platform gate. The first two only need the program to exist.
    pub fn supported_here(&self) -> bool {
        match self {
            LocalBackend::Termux | LocalBackend::NotifySend => true,
            LocalBackend::OsaScript => cfg!(target_os = "macos"),
            LocalBackend::PowerShell => cfg!(windows),
        }
    }

    /// Command-line arguments for this backend.
    pub fn args(&self, title: &str, message: &str) -> Vec<String> {
        match self {
            LocalBackend::Termux => vec![
                "--title".to_string(),
                title.to_string(),
                "--content".to_string(),
                message.to_string(),
            ],
            LocalBackend::NotifySend => vec![title.to_string(), message.to_string()],
            LocalBackend::OsaScript => vec![
                "-e".to_string(),
                format!(
                    "display notification \"{}\" with title \"{}\"",
                    escape_applescript(message),
                    escape_applescript(title)
                ),
            ],
            LocalBackend::PowerShell => {
                let script = format!(
                    "[void][reflection.assembly]::LoadWithPartialName('System.Windows.Forms');\
                     [void][reflection.assembly]::LoadWithPartialName('System.Drawing');\
                     $n=New-Object System.Windows.Forms.NotifyIcon;\
                     $n.Icon=[System.Drawing.SystemIcons]::Information;\
                     $n.BalloonTipTitle='{}';\
                     $n.BalloonTipText='{}';\
                     $n.Visible=$true;\
                     $n.ShowBalloonTip(10000);\
                     Start-Sleep -Seconds 10;\
                     $n.Dispose();",
                    escape_powershell(title),
                    escape_powershell(message)
                );
                vec![
                    "-NoProfile".to_string(),
                    "-NonInteractive".to_string(),
                    "-Sta".to_string(),
                    "-Command".to_string(),
                    script,
                ]
            }
        }
    }
}

fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Single-quoted PowerShell literal; line breaks flattened.
fn escape_powershell(s: &str) -> String {
    s.replace(['\r', '\n'], " ").replace('\'', "''")
}

/// Runs the first available backend of [`LocalBackend::CHAIN`].
#[derive(Debug, Clone, Default)]
pub struct LocalNotifier {
    /// `None` = the process `PATH`.
    search_path: Option<OsString>,
}

impl LocalNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look programs up in `path` (PATH syntax) instead of the process PATH.
    pub fn with_search_path(path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(path.into()),
        }
    }

    /// First usable backend and the resolved program path.
    pub fn select_backend(&self) -> Option<(LocalBackend, PathBuf)> {
        let path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))?;

        LocalBackend::CHAIN
            .iter()
            .filter(|b| b.supported_here())
            .find_map(|b| find_program(b.program(), &path).map(|p| (*b, p)))
    }
}

impl Dispatcher for LocalNotifier {
    fn name(&self) -> &'static str {
        "local"
    }

    fn dispatch(&self, n: &Notification) -> Result<DispatchOutcome, DispatchError> {
        let Some((backend, program)) = self.select_backend() else {
            tracing::warn!("no local notification program available");
            return Ok(DispatchOutcome::Unavailable);
        };

        let out = Command::new(&program)
            .args(backend.args(&n.title, &n.message))
            .stdin(Stdio::null())
            .output();

        match out {
            Ok(out) => {
                // Exit status is not checked; the program ran.
                if !out.status.success() {
                    tracing::warn!(
                        program = backend.program(),
                        status = ?out.status.code(),
                        "local notification program exited non-zero"
                    );
                }
                Ok(DispatchOutcome::Sent)
            }
            Err(e) => {
                tracing::warn!(
                    program = backend.program(),
                    error = %e,
                    "local notification program could not be started"
                );
                Ok(DispatchOutcome::Unavailable)
            }
        }
    }
}

fn find_program(name: &str, search_path: &OsString) -> Option<PathBuf> {
    std::env::split_paths(search_path).find_map(|dir| {
        let candidates: &[&str] = if cfg!(windows) {
            &["", ".exe", ".cmd", ".bat"]
        } else {
            &[""]
        };
        candidates.iter().find_map(|ext| {
            let p = dir.join(format!("{name}{ext}"));
            is_executable(&p).then_some(p)
        })
    })
}

#[cfg(unix)]
fn is_executable(p: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    p.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(p: &Path) -> bool {
    p.is_file()
}
