use std::sync::Arc;

use {
    teloxide::Bot,
    tgrelay_channels::{ChannelStore, SubscriptionGate},
    tgrelay_common::UserId,
    tgrelay_config::RelayConfig,
    tgrelay_relay::FileRelayPipeline,
    tokio_util::sync::CancellationToken,
};

use crate::{membership::TelegramMembership, source::TelegramFileSource};

/// Runtime state shared by the polling loop, the handlers and every relay
/// task spawned from them.
pub struct BotState {
    pub bot: Bot,
    /// The bot's own user id, from `getMe`. Needed to verify admin rights in
    /// forwarded channels.
    pub bot_user_id: Option<teloxide::types::UserId>,
    pub account_id: String,
    pub owner_id: Option<UserId>,
    pub config: Arc<RelayConfig>,
    pub store: Arc<dyn ChannelStore>,
    pub gate: SubscriptionGate,
    pub pipeline: Arc<FileRelayPipeline>,
    pub cancel: CancellationToken,
}

impl BotState {
    /// Wire the production collaborators around `bot`.
    pub fn new(bot: Bot, config: Arc<RelayConfig>, store: Arc<dyn ChannelStore>) -> Self {
        let gate = SubscriptionGate::new(Arc::new(TelegramMembership::new(bot.clone())));
        let pipeline = Arc::new(FileRelayPipeline::from_config(
            &config,
            Arc::new(TelegramFileSource::new(bot.clone())),
        ));
        Self {
            bot_user_id: None,
            account_id: config.telegram.account_id.clone(),
            owner_id: config.telegram.owner_id.map(UserId),
            bot,
            config,
            store,
            gate,
            pipeline,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_pipeline(mut self, pipeline: FileRelayPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    #[must_use]
    pub fn with_bot_user_id(mut self, id: teloxide::types::UserId) -> Self {
        self.bot_user_id = Some(id);
        self
    }
}
