use {
    teloxide::{
        prelude::*,
        types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    },
    tgrelay_channels::{RequiredChannel, channel::ChannelRef},
    tracing::warn,
};

/// Callback payload of the "I have joined" button.
pub const CHECK_SUBSCRIPTION: &str = "check_subscription";

pub const JOIN_PROMPT: &str = "To use this bot, you must first join our channel(s):";

/// A blocking channel and, when one could be found, a link to join it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLink {
    pub channel: RequiredChannel,
    pub url: Option<reqwest::Url>,
}

/// Resolve a join link for every channel. Private channels need an invite
/// link exported by the bot; when that fails the channel is listed unlinked.
pub async fn resolve_join_links(bot: &Bot, channels: &[RequiredChannel]) -> Vec<JoinLink> {
    let mut links = Vec::with_capacity(channels.len());
    for channel in channels {
        let url = match channel.kind() {
            ChannelRef::Handle(_) => channel
                .join_url()
                .and_then(|u| reqwest::Url::parse(&u).ok()),
            ChannelRef::Id(id) => private_invite_link(bot, ChatId(id))
                .await
                .and_then(|u| reqwest::Url::parse(&u).ok()),
        };
        links.push(JoinLink {
            channel: channel.clone(),
            url,
        });
    }
    links
}

/// Existing primary invite link of a private channel. Exporting replaces the
/// primary link and revokes the old one, so it only happens when none exists.
async fn private_invite_link(bot: &Bot, chat_id: ChatId) -> Option<String> {
    match bot.get_chat(chat_id).await {
        Ok(chat) => {
            if let Some(link) = chat.invite_link() {
                return Some(link.to_string());
            }
        },
        Err(e) => {
            warn!(chat_id = chat_id.0, error = %e, "could not read channel info");
            return None;
        },
    }
    match bot.export_chat_invite_link(chat_id).await {
        Ok(link) => Some(link),
        Err(e) => {
            warn!(chat_id = chat_id.0, error = %e, "could not export invite link");
            None
        },
    }
}

/// Prompt text and keyboard: one join button per linked channel, then the
/// re-check button.
#[must_use]
pub fn join_prompt(links: &[JoinLink]) -> (String, InlineKeyboardMarkup) {
    let mut text = JOIN_PROMPT.to_string();
    let mut rows = Vec::with_capacity(links.len() + 1);
    for link in links {
        match &link.url {
            Some(url) => {
                let label = match link.channel.kind() {
                    ChannelRef::Handle(_) => format!("Join {}", link.channel),
                    ChannelRef::Id(_) => "Join private channel".to_string(),
                };
                rows.push(vec![InlineKeyboardButton::url(label, url.clone())]);
            },
            None => {
                text.push_str("\n• ");
                text.push_str(link.channel.as_str());
            },
        }
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "✅ I have joined",
        CHECK_SUBSCRIPTION,
    )]);
    (text, InlineKeyboardMarkup::new(rows))
}
