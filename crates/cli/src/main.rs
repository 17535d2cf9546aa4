mod channel_commands;
mod doctor_commands;
mod init_commands;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tgrelay_channels::FileChannelStore,
    tgrelay_config::RelayConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::channel_commands::ChannelAction;

#[derive(Parser)]
#[command(name = "tgrelay", about = "tgrelay: Telegram to SFTP file relay bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "TGRELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// Check the configuration and local directories.
    Doctor,
    /// Write a documented config template.
    Init {
        /// Where to write the template (defaults to ./tgrelay.toml).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Bot instance identifier written into the template.
        #[arg(long, default_value = "default")]
        account_id: String,
        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Required-channel management.
    Channels {
        #[command(subcommand)]
        action: ChannelAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the config named by `--config`, or discover one. Environment
/// overrides apply either way.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<(RelayConfig, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let mut config = tgrelay_config::load_config(path)?;
            tgrelay_config::apply_env_overrides(&mut config);
            Ok((config, Some(path.clone())))
        },
        None => Ok((
            tgrelay_config::discover_and_load(),
            tgrelay_config::find_config_file(),
        )),
    }
}

fn channel_store(config: &RelayConfig) -> FileChannelStore {
    FileChannelStore::new(tgrelay_config::data_dir(config).join("channels"))
}

async fn run(config: RelayConfig) -> anyhow::Result<()> {
    if !config.telegram.has_token() {
        anyhow::bail!("no bot token configured; set TELEGRAM_BOT_TOKEN or telegram.token");
    }
    let store = Arc::new(channel_store(&config));
    info!(channels_dir = %store.dir().display(), "channel store ready");

    let cancel = tgrelay_telegram::start_polling(Arc::new(config), store).await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutdown requested");
            cancel.cancel();
        },
        () = cancel.cancelled() => {
            info!("polling stopped");
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "tgrelay starting");

    match cli.command {
        None | Some(Commands::Run) => {
            let (config, _) = load_config(cli.config.as_ref())?;
            run(config).await
        },
        Some(Commands::Doctor) => {
            let (config, path) = load_config(cli.config.as_ref())?;
            doctor_commands::handle_doctor(&config, path).await
        },
        Some(Commands::Init {
            path,
            account_id,
            force,
        }) => {
            let path = path.unwrap_or_else(|| PathBuf::from("tgrelay.toml"));
            init_commands::handle_init(&path, &account_id, force)
        },
        Some(Commands::Channels { action }) => {
            let (config, _) = load_config(cli.config.as_ref())?;
            let store = channel_store(&config);
            channel_commands::handle_channels(action, &store, &config.telegram.account_id).await
        },
    }
}
