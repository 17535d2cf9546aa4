//! Configuration loading, env substitution and validation.
//!
//! Config files: `tgrelay.toml`, `tgrelay.yaml`, or `tgrelay.json`
//! Searched in `./` then `~/.config/tgrelay/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, apply_env_overrides_with, config_dir, data_dir, discover_and_load,
        find_config_file, load_config,
    },
    schema::{DestinationConfig, RelayConfig, RelaySettings, StorageConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
