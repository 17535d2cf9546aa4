use std::sync::Arc;

use {async_trait::async_trait, tgrelay_common::UserId, tracing::{debug, warn}};

use crate::channel::RequiredChannel;

/// A user's standing in one channel, as reported by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// Whether this status admits the user through the gate.
    #[must_use]
    pub fn satisfies(self) -> bool {
        matches!(self, Self::Owner | Self::Administrator | Self::Member)
    }
}

/// Queries channel membership on the chat platform.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    async fn member_status(
        &self,
        channel: &RequiredChannel,
        user_id: UserId,
    ) -> anyhow::Result<MemberStatus>;
}

/// Outcome of a gate check. Built fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipResult {
    pub subscribed: bool,
    /// Channels still blocking the user, in list order.
    pub blocking_channels: Vec<RequiredChannel>,
}

impl MembershipResult {
    fn from_blocking(blocking_channels: Vec<RequiredChannel>) -> Self {
        Self {
            subscribed: blocking_channels.is_empty(),
            blocking_channels,
        }
    }
}

/// Admission control in front of the relay.
///
/// Every check re-queries every channel: membership changes outside the bot
/// and a cached answer could admit someone who already left.
#[derive(Clone)]
pub struct SubscriptionGate {
    lookup: Arc<dyn MembershipLookup>,
}

impl SubscriptionGate {
    pub fn new(lookup: Arc<dyn MembershipLookup>) -> Self {
        Self { lookup }
    }

    /// Determine whether `user_id` belongs to every channel in `channels`.
    ///
    /// A lookup failure blocks the channel in question; it is logged and never
    /// surfaced as an error.
    pub async fn check(&self, user_id: UserId, channels: &[RequiredChannel]) -> MembershipResult {
        if channels.is_empty() {
            return MembershipResult::from_blocking(Vec::new());
        }

        let mut blocking = Vec::new();
        for channel in channels {
            match self.lookup.member_status(channel, user_id).await {
                Ok(status) if status.satisfies() => {
                    debug!(%user_id, %channel, ?status, "membership satisfied");
                },
                Ok(status) => {
                    debug!(%user_id, %channel, ?status, "membership blocks");
                    blocking.push(channel.clone());
                },
                Err(e) => {
                    warn!(%user_id, %channel, error = %e, "could not check membership, treating as not subscribed");
                    blocking.push(channel.clone());
                },
            }
        }

        MembershipResult::from_blocking(blocking)
    }
}
