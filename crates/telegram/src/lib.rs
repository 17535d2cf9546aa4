//! Telegram front end for the relay.
//!
//! Polls the Bot API, gates media submissions on channel membership and hands
//! admitted files to the relay pipeline, editing one status message per file
//! as the upload progresses.

pub mod access;
pub mod bot;
pub mod error;
pub mod handlers;
pub mod keyboard;
pub mod membership;
pub mod source;
pub mod state;
pub mod status;

#[cfg(test)]
mod mock_api;

pub use {
    bot::start_polling,
    error::{Error, Result},
    state::BotState,
};
