//! Required-channel bookkeeping and the subscription gate.
//!
//! The store persists which channels a bot instance requires; the gate asks a
//! [`MembershipLookup`] about every one of them and admits a user only when
//! none blocks.

pub mod channel;
pub mod error;
pub mod gate;
pub mod store;

pub use {
    channel::RequiredChannel,
    error::{Error, Result},
    gate::{MemberStatus, MembershipLookup, MembershipResult, SubscriptionGate},
    store::{ChannelStore, FileChannelStore},
};
