//! Configuration validation.
//!
//! Produces diagnostics for the `doctor` command and the `/env` admin
//! command. Validation never fails hard: the bot can start with an
//! incomplete destination and will refuse uploads until it is fixed.

use std::path::PathBuf;

use crate::schema::RelayConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "missing", "invalid", "security", "tuning"
    pub category: &'static str,
    /// Dotted path, e.g. "destination.host"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Maps the stable missing-field names back to their config keys.
fn destination_key(field: &str) -> &'static str {
    match field {
        "host" => "destination.host",
        "username" => "destination.username",
        "password" => "destination.password",
        "remoteBasePath" => "destination.remote_base_path",
        "publicUrlBase" => "destination.public_url_base",
        _ => "destination",
    }
}

/// Validate a loaded configuration.
#[must_use]
pub fn validate(config: &RelayConfig, config_path: Option<PathBuf>) -> ValidationResult {
    let mut result = ValidationResult {
        diagnostics: Vec::new(),
        config_path,
    };

    if !config.telegram.has_token() {
        result.push(
            Severity::Error,
            "missing",
            "telegram.token",
            "bot token is not set (TELEGRAM_BOT_TOKEN)",
        );
    }
    if config.telegram.owner_id.is_none() {
        result.push(
            Severity::Warning,
            "security",
            "telegram.owner_id",
            "owner id is not set (OWNER_ID); admin commands will be refused",
        );
    }
    if config.telegram.account_id.trim().is_empty() {
        result.push(
            Severity::Error,
            "invalid",
            "telegram.account_id",
            "account id must not be empty",
        );
    }

    for field in config.destination.missing_fields() {
        result.push(
            Severity::Error,
            "missing",
            destination_key(field),
            format!("{field} is required; uploads are refused until it is set"),
        );
    }

    if let Some(ref base) = config.destination.public_url_base {
        let trimmed = base.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("https://") {
            if trimmed.starts_with("http://") {
                result.push(
                    Severity::Warning,
                    "security",
                    "destination.public_url_base",
                    "download links will be served over plain http",
                );
            } else {
                result.push(
                    Severity::Error,
                    "invalid",
                    "destination.public_url_base",
                    format!("`{trimmed}` is not an http(s) URL"),
                );
            }
        }
    }

    if let Some(ref path) = config.destination.remote_base_path
        && !path.trim().is_empty()
        && !path.trim().starts_with('/')
    {
        result.push(
            Severity::Info,
            "invalid",
            "destination.remote_base_path",
            "relative path resolves against the SFTP user's home directory",
        );
    }

    if config.destination.timeout_secs == 0 {
        result.push(
            Severity::Error,
            "invalid",
            "destination.timeout_secs",
            "timeout of 0 would let a stalled upload hang forever",
        );
    }

    if config.relay.progress_interval_ms < 1000 {
        result.push(
            Severity::Warning,
            "tuning",
            "relay.progress_interval_ms",
            "intervals below 1000 ms tend to hit Telegram edit rate limits",
        );
    }

    result
}
