use {
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{ChatId, ChatMemberStatus, Recipient, UserId},
    },
    tgrelay_channels::{MemberStatus, MembershipLookup, RequiredChannel, channel::ChannelRef},
    tgrelay_common::UserId as RelayUserId,
};

/// Address a stored channel identifier the way the Bot API expects.
#[must_use]
pub fn recipient(channel: &RequiredChannel) -> Recipient {
    match channel.kind() {
        ChannelRef::Handle(handle) => Recipient::ChannelUsername(format!("@{handle}")),
        ChannelRef::Id(id) => Recipient::Id(ChatId(id)),
    }
}

#[must_use]
pub fn member_status(status: ChatMemberStatus) -> MemberStatus {
    match status {
        ChatMemberStatus::Owner => MemberStatus::Owner,
        ChatMemberStatus::Administrator => MemberStatus::Administrator,
        ChatMemberStatus::Member => MemberStatus::Member,
        ChatMemberStatus::Restricted => MemberStatus::Restricted,
        ChatMemberStatus::Left => MemberStatus::Left,
        ChatMemberStatus::Banned => MemberStatus::Banned,
    }
}

/// `getChatMember`-backed membership lookup. The bot must be an administrator
/// of each channel for Telegram to answer.
#[derive(Clone)]
pub struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipLookup for TelegramMembership {
    async fn member_status(
        &self,
        channel: &RequiredChannel,
        user_id: RelayUserId,
    ) -> anyhow::Result<MemberStatus> {
        let member = self
            .bot
            .get_chat_member(recipient(channel), UserId(user_id.0))
            .await?;
        Ok(member_status(member.kind.status()))
    }
}
