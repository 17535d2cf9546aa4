use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    tgrelay_config::DestinationConfig,
};

/// Required destination settings that were absent, in stable order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("destination is missing required settings: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// A fully specified upload destination.
///
/// Only obtainable through [`Destination::resolve`], so holding one proves the
/// configuration was complete.
#[derive(Clone)]
pub struct Destination {
    host: String,
    port: u16,
    username: String,
    password: Secret<String>,
    remote_base_path: String,
    public_url_base: String,
    timeout: Duration,
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Destination")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("remote_base_path", &self.remote_base_path)
            .field("public_url_base", &self.public_url_base)
            .finish_non_exhaustive()
    }
}

impl Destination {
    /// Check every required setting at once. Performs no I/O.
    pub fn resolve(config: &DestinationConfig) -> Result<Self, MissingFields> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(MissingFields(missing));
        }
        let text = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
        Ok(Self {
            host: text(&config.host),
            port: config.port,
            username: text(&config.username),
            password: Secret::new(
                config
                    .password
                    .as_ref()
                    .map(|p| p.expose_secret().clone())
                    .unwrap_or_default(),
            ),
            remote_base_path: text(&config.remote_base_path),
            public_url_base: text(&config.public_url_base),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute path of `file_name` on the host.
    #[must_use]
    pub fn remote_path(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.remote_base_path.trim_end_matches('/'))
    }

    /// Public download link for `file_name`; base and name are joined by
    /// exactly one `/` whatever the configured base ends with.
    #[must_use]
    pub fn public_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.public_url_base.trim_end_matches('/'),
            urlencoding::encode(file_name)
        )
    }
}
