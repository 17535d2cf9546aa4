/// Config schema types (telegram bot, upload destination, relay tuning, storage).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration.
///
/// Built once at startup and handed to the gate, the relay pipeline and the
/// bot state. Nothing reads it through a global.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub telegram: TelegramConfig,
    pub destination: DestinationConfig,
    pub relay: RelaySettings,
    pub storage: StorageConfig,
}

/// Telegram bot account settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Identifier of this bot instance. Keys the persisted channel list.
    pub account_id: String,

    /// The single principal allowed to run admin commands.
    pub owner_id: Option<u64>,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,

    /// Register the slash-command menu with Telegram on startup.
    pub register_commands: bool,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            account_id: "default".into(),
            owner_id: None,
            poll_timeout_secs: 30,
            register_commands: true,
        }
    }
}

impl TelegramConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

/// Remote SFTP host and the public URL that serves its upload directory.
///
/// Every field that the relay needs is optional here so that an incomplete
/// configuration can still be loaded and reported precisely.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    /// Directory on the host that receives uploads.
    pub remote_base_path: Option<String>,
    /// URL prefix under which `remote_base_path` is publicly served.
    pub public_url_base: Option<String>,
    /// Bound on TCP connect, socket I/O and SSH session operations.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("remote_base_path", &self.remote_base_path)
            .field("public_url_base", &self.public_url_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 22,
            username: None,
            password: None,
            remote_base_path: None,
            public_url_base: None,
            timeout_secs: 30,
        }
    }
}

impl DestinationConfig {
    /// Names of required settings that are absent or blank, in a stable order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: Option<&str>| v.is_none_or(|s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(self.host.as_deref()) {
            missing.push("host");
        }
        if blank(self.username.as_deref()) {
            missing.push("username");
        }
        if blank(self.password.as_ref().map(|p| p.expose_secret().as_str())) {
            missing.push("password");
        }
        if blank(self.remote_base_path.as_deref()) {
            missing.push("remoteBasePath");
        }
        if blank(self.public_url_base.as_deref()) {
            missing.push("publicUrlBase");
        }
        missing
    }
}

/// Tuning for the relay pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Minimum interval between progress edits of one status message (ms).
    pub progress_interval_ms: u64,
    /// Where downloaded files wait for upload. Defaults to the OS temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1500,
            scratch_dir: None,
        }
    }
}

impl RelaySettings {
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Local persistence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for the per-bot channel lists. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
}
