//! Shared types and error helpers used across the tgrelay crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::UserId,
};
