use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A channel a user must belong to before the bot relays their files.
///
/// Stored in normalized text form: `@handle` for public channels or the
/// signed numeric chat id (`-1001234567890`) for private ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequiredChannel(String);

/// Borrowed view of how a [`RequiredChannel`] is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRef<'a> {
    /// Public handle without the leading `@`.
    Handle(&'a str),
    /// Numeric chat id.
    Id(i64),
}

impl RequiredChannel {
    /// Parse operator input into a channel identifier.
    ///
    /// Accepts `@handle`, `https://t.me/handle`, `t.me/handle` and signed
    /// numeric chat ids.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::invalid_input("empty channel identifier"));
        }

        if let Ok(id) = raw.parse::<i64>() {
            if id == 0 {
                return Err(Error::invalid_input("chat id 0 is not a channel"));
            }
            return Ok(Self::from_chat_id(id));
        }

        let handle = raw
            .strip_prefix('@')
            .or_else(|| raw.strip_prefix("https://t.me/"))
            .or_else(|| raw.strip_prefix("http://t.me/"))
            .or_else(|| raw.strip_prefix("t.me/"))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "`{raw}` must be an @handle, a t.me link or a numeric chat id"
                ))
            })?;
        let handle = handle.trim_end_matches('/');

        if !is_valid_handle(handle) {
            return Err(Error::invalid_input(format!(
                "`{handle}` is not a valid channel handle"
            )));
        }
        Ok(Self(format!("@{handle}")))
    }

    #[must_use]
    pub fn from_chat_id(id: i64) -> Self {
        Self(id.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn kind(&self) -> ChannelRef<'_> {
        match self.0.strip_prefix('@') {
            Some(handle) => ChannelRef::Handle(handle),
            // Only constructed through `parse`/`from_chat_id`, so a non-handle
            // is always a valid integer.
            None => ChannelRef::Id(self.0.parse().unwrap_or_default()),
        }
    }

    /// Public join link, available only for handle-addressed channels.
    #[must_use]
    pub fn join_url(&self) -> Option<String> {
        match self.kind() {
            ChannelRef::Handle(handle) => Some(format!("https://t.me/{handle}")),
            ChannelRef::Id(_) => None,
        }
    }
}

fn is_valid_handle(handle: &str) -> bool {
    (1..=32).contains(&handle.len())
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl std::fmt::Display for RequiredChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RequiredChannel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RequiredChannel> for String {
    fn from(value: RequiredChannel) -> Self {
        value.0
    }
}
