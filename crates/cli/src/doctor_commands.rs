//! `tgrelay doctor`: configuration validation and environment audit.
//!
//! Runs a series of checks against the loaded configuration and the local
//! directories and prints a structured report with `[ok]`, `[warn]`,
//! `[fail]`, or `[info]` status indicators per item.

use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    tgrelay_channels::{ChannelStore, FileChannelStore},
    tgrelay_config::{RelayConfig, Severity, validate},
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Per-check result used to build the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor(config: &RelayConfig, config_path: Option<PathBuf>) -> Result<()> {
    eprintln!("{BOLD}tgrelay doctor{RESET}");
    eprintln!("{BOLD}=============={RESET}\n");

    let data_dir = tgrelay_config::data_dir(config);
    let store = FileChannelStore::new(data_dir.join("channels"));

    let sections = vec![
        check_config(config, config_path),
        check_directories(&data_dir, &config.relay.scratch_dir()),
        check_channels(&store, &config.telegram.account_id).await,
    ];

    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

// ── 1. Config validation ────────────────────────────────────────────────────

fn check_config(config: &RelayConfig, config_path: Option<PathBuf>) -> Section {
    let label = config_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults + environment".into());
    let mut section = Section::new(format!("Config ({label})"));

    let result = validate(config, config_path);

    if result.count(Severity::Error) == 0 {
        section.push(Status::Ok, "Bot token and upload destination are set");
    }
    for d in &result.diagnostics {
        let msg = if d.path.is_empty() {
            d.message.clone()
        } else {
            format!("{}: {}", d.path, d.message)
        };
        section.push(d.severity.into(), msg);
    }

    section
}

// ── 2. Directory health ─────────────────────────────────────────────────────

fn check_directories(data_dir: &Path, scratch_dir: &Path) -> Section {
    let mut section = Section::new("Directories");

    if data_dir.is_dir() {
        section.push(
            Status::Ok,
            format!("Data directory: {}", data_dir.display()),
        );
        check_writable(&mut section, data_dir, "Data directory");
    } else {
        section.push(
            Status::Info,
            format!(
                "Data directory {} not found (created on first channel change)",
                data_dir.display()
            ),
        );
    }

    if scratch_dir.is_dir() {
        section.push(
            Status::Ok,
            format!("Scratch directory: {}", scratch_dir.display()),
        );
        check_writable(&mut section, scratch_dir, "Scratch directory");
    } else {
        section.push(
            Status::Info,
            format!(
                "Scratch directory {} not found (created on first upload)",
                scratch_dir.display()
            ),
        );
    }

    section
}

fn check_writable(section: &mut Section, dir: &Path, label: &str) {
    let probe = dir.join(".tgrelay-doctor-probe");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
        },
        Err(e) => {
            section.push(Status::Fail, format!("{label} is not writable: {e}"));
        },
    }
}

// ── 3. Required channels ────────────────────────────────────────────────────

async fn check_channels(store: &FileChannelStore, account_id: &str) -> Section {
    let mut section = Section::new(format!("Required channels ({account_id})"));

    match store.list(account_id).await {
        Ok(channels) if channels.is_empty() => {
            section.push(Status::Info, "No required channels; every user is admitted");
        },
        Ok(channels) => {
            for channel in &channels {
                section.push(Status::Ok, channel.to_string());
            }
        },
        Err(e) => {
            section.push(
                Status::Fail,
                format!("Channel list is unreadable; uploads will be refused: {e}"),
            );
        },
    }

    section
}
