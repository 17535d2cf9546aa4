use std::path::Path;

use {
    async_trait::async_trait,
    teloxide::{net::Download, prelude::*},
    tgrelay_relay::{FileSource, SourceHandle},
    tokio::io::AsyncWriteExt,
    tracing::debug,
};

use crate::error::Error;

/// Largest file the Bot API lets a bot download.
pub const MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Downloads Telegram-hosted files by `file_id`.
#[derive(Clone)]
pub struct TelegramFileSource {
    bot: Bot,
}

impl TelegramFileSource {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl FileSource for TelegramFileSource {
    async fn fetch(&self, source: &SourceHandle, dest: &Path) -> anyhow::Result<u64> {
        let file = self.bot.get_file(source.0.clone()).await?;
        let mut out = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::external(format!("create {}", dest.display()), e))?;
        self.bot
            .download_file(&file.path, &mut out)
            .await
            .map_err(|e| Error::external("download telegram file", e))?;
        out.flush().await?;
        let bytes = out.metadata().await?.len();
        debug!(file_id = %source.0, bytes, "telegram file downloaded");
        Ok(bytes)
    }
}
