use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::RelayConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "tgrelay.toml",
    "tgrelay.yaml",
    "tgrelay.yml",
    "tgrelay.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply environment
/// overrides.
///
/// Search order:
/// 1. `./tgrelay.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/tgrelay/tgrelay.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `RelayConfig::default()` when no file is found or the file
/// cannot be parsed; the environment can still supply everything.
pub fn discover_and_load() -> RelayConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            match load_config(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    RelayConfig::default()
                },
            }
        },
        None => {
            debug!("no config file found, using defaults");
            RelayConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/tgrelay/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tgrelay").map(|d| d.config_dir().to_path_buf())
}

/// Resolve the data directory: explicit setting, then the platform data dir,
/// then `./data`.
pub fn data_dir(config: &RelayConfig) -> PathBuf {
    if let Some(ref dir) = config.storage.data_dir {
        return dir.clone();
    }
    directories::ProjectDirs::from("", "", "tgrelay")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Overlay well-known environment variables onto a loaded config.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with an injectable lookup, so tests do not
/// have to mutate the process environment.
pub fn apply_env_overrides_with(config: &mut RelayConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = Secret::new(token);
    }
    if let Some(raw) = get("OWNER_ID") {
        match raw.trim().parse::<u64>() {
            Ok(id) => config.telegram.owner_id = Some(id),
            Err(e) => warn!(value = %raw, error = %e, "ignoring non-numeric OWNER_ID"),
        }
    }
    if let Some(host) = get("SFTP_HOST") {
        config.destination.host = Some(host);
    }
    if let Some(raw) = get("SFTP_PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) => config.destination.port = port,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid SFTP_PORT"),
        }
    }
    if let Some(user) = get("SFTP_USER") {
        config.destination.username = Some(user);
    }
    if let Some(password) = get("SFTP_PASSWORD") {
        config.destination.password = Some(Secret::new(password));
    }
    if let Some(path) = get("SFTP_REMOTE_PATH") {
        config.destination.remote_base_path = Some(path);
    }
    if let Some(base) = get("PUBLIC_URL_BASE") {
        config.destination.public_url_base = Some(base);
    }
    if let Some(dir) = get("TGRELAY_DATA_DIR") {
        config.storage.data_dir = Some(PathBuf::from(dir));
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RelayConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
