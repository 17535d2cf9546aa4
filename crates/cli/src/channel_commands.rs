//! CLI subcommands for the required-channel list.
//!
//! These edit the same file the running bot reads, so changes apply to the
//! next upload without a restart.

use {
    anyhow::Result,
    clap::Subcommand,
    tgrelay_channels::{ChannelStore, RequiredChannel},
};

#[derive(Subcommand)]
pub enum ChannelAction {
    /// Show the channels users must join.
    List,
    /// Require membership in a channel (`@handle`, `t.me/handle`, or numeric id).
    Add { channel: String },
    /// Stop requiring a channel.
    Remove { channel: String },
}

pub async fn handle_channels(
    action: ChannelAction,
    store: &dyn ChannelStore,
    account_id: &str,
) -> Result<()> {
    println!("{}", apply(action, store, account_id).await?);
    Ok(())
}

async fn apply(action: ChannelAction, store: &dyn ChannelStore, account_id: &str) -> Result<String> {
    let message = match action {
        ChannelAction::List => {
            let channels = store.list(account_id).await?;
            if channels.is_empty() {
                format!("No required channels for `{account_id}`.")
            } else {
                let lines: Vec<String> = channels.iter().map(|c| format!("  {c}")).collect();
                format!("Required channels for `{account_id}`:\n{}", lines.join("\n"))
            }
        },
        ChannelAction::Add { channel } => {
            let channel = RequiredChannel::parse(&channel)?;
            if store.add(account_id, channel.clone()).await? {
                format!("Added {channel}.")
            } else {
                format!("{channel} is already required.")
            }
        },
        ChannelAction::Remove { channel } => {
            let channel = RequiredChannel::parse(&channel)?;
            if store.remove(account_id, &channel).await? {
                format!("Removed {channel}.")
            } else {
                format!("{channel} was not in the list.")
            }
        },
    };
    Ok(message)
}
