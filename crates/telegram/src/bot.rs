use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tgrelay_channels::ChannelStore,
    tgrelay_config::RelayConfig,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{error::Result, handlers, state::BotState};

/// Slash commands shown in Telegram's command menu.
#[must_use]
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("addchannel", "Add a force-sub channel (Admin)"),
        BotCommand::new("delchannel", "Remove a force-sub channel (Admin)"),
        BotCommand::new("listchannels", "List all required channels (Admin)"),
        BotCommand::new("env", "Show upload configuration (Admin)"),
    ]
}

pub async fn register_commands(bot: &Bot) -> Result<()> {
    bot.set_my_commands(bot_commands()).await?;
    Ok(())
}

/// Connect the bot and start long polling.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled.
pub async fn start_polling(
    config: Arc<RelayConfig>,
    store: Arc<dyn ChannelStore>,
) -> anyhow::Result<CancellationToken> {
    let poll_timeout = config.telegram.poll_timeout_secs;
    // Client timeout must outlast the long-poll or every idle poll errors out.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(poll_timeout) + 15))
        .build()?;
    let bot = Bot::with_client(config.telegram.token.expose_secret(), client);

    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;

    let account_id = config.telegram.account_id.clone();
    if config.telegram.register_commands {
        if let Err(e) = register_commands(&bot).await {
            warn!(account_id, "failed to register bot commands: {e}");
        }
    }
    if config.telegram.owner_id.is_none() {
        warn!(account_id, "telegram.owner_id is not set; admin commands are disabled");
    }

    info!(
        account_id,
        username = ?me.username,
        "telegram bot connected (webhook cleared)"
    );

    let state = Arc::new(BotState::new(bot.clone(), config, store).with_bot_user_id(me.id));
    let cancel = state.cancel.clone();

    tokio::spawn(async move {
        info!(account_id, "starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                () = state.cancel.cancelled() => {
                    info!(account_id, "telegram polling stopped");
                    break;
                },
                result = bot
                    .get_updates()
                    .offset(offset)
                    .timeout(poll_timeout)
                    .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(account_id, count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(account_id, chat_id = msg.chat.id.0, "received telegram message");
                                if let Err(e) = handlers::handle_message(msg, &state).await {
                                    error!(account_id, error = %e, "error handling telegram message");
                                }
                            },
                            UpdateKind::CallbackQuery(query) => {
                                debug!(account_id, callback_data = ?query.data, "received telegram callback query");
                                if let Err(e) = handlers::handle_callback_query(query, &state).await {
                                    error!(account_id, error = %e, "error handling telegram callback query");
                                }
                            },
                            other => {
                                debug!(account_id, "ignoring update: {other:?}");
                            },
                        }
                    }
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    warn!(
                        account_id,
                        "telegram bot stopped: another instance is already running with this token"
                    );
                    state.cancel.cancel();
                    break;
                },
                Err(e) => {
                    warn!(account_id, error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = state.cancel.cancelled() => break,
                        () = tokio::time::sleep(Duration::from_secs(5)) => {},
                    }
                },
            }
        }
    });

    Ok(cancel)
}
