use std::path::{Path, PathBuf};

use {async_trait::async_trait, tracing::debug};

use crate::{
    channel::RequiredChannel,
    error::{Error, Result},
};

/// Persistent list of required channels per bot instance.
///
/// Lists are read and written wholesale. Concurrent mutations race and the
/// last write wins; admin edits are rare and come from a single owner.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn list(&self, account_id: &str) -> Result<Vec<RequiredChannel>>;

    /// Append `channel`. Returns `false` when it was already present.
    async fn add(&self, account_id: &str, channel: RequiredChannel) -> Result<bool>;

    /// Remove `channel`. Returns `false` when it was not present.
    async fn remove(&self, account_id: &str, channel: &RequiredChannel) -> Result<bool>;
}

/// Stores each bot's list as a JSON array in `<dir>/<account_id>.json`.
#[derive(Debug, Clone)]
pub struct FileChannelStore {
    dir: PathBuf,
}

impl FileChannelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, account_id: &str) -> Result<PathBuf> {
        let valid = !account_id.is_empty()
            && account_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::invalid_input(format!(
                "account id `{account_id}` may only contain letters, digits, '-' and '_'"
            )));
        }
        Ok(self.dir.join(format!("{account_id}.json")))
    }

    async fn load(&self, path: &Path) -> Result<Vec<RequiredChannel>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(format!("read {}", path.display()), e)),
        };
        let mut channels: Vec<RequiredChannel> = serde_json::from_slice(&raw)?;
        // Hand-edited files may repeat entries; keep the first occurrence.
        let mut seen = std::collections::HashSet::new();
        channels.retain(|c| seen.insert(c.clone()));
        Ok(channels)
    }

    async fn save(&self, path: &Path, channels: &[RequiredChannel]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io(format!("create {}", self.dir.display()), e))?;
        let json = serde_json::to_vec_pretty(channels)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| Error::io(format!("write {}", path.display()), e))?;
        debug!(path = %path.display(), count = channels.len(), "saved channel list");
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for FileChannelStore {
    async fn list(&self, account_id: &str) -> Result<Vec<RequiredChannel>> {
        let path = self.path_for(account_id)?;
        self.load(&path).await
    }

    async fn add(&self, account_id: &str, channel: RequiredChannel) -> Result<bool> {
        let path = self.path_for(account_id)?;
        let mut channels = self.load(&path).await?;
        if channels.contains(&channel) {
            return Ok(false);
        }
        channels.push(channel);
        self.save(&path, &channels).await?;
        Ok(true)
    }

    async fn remove(&self, account_id: &str, channel: &RequiredChannel) -> Result<bool> {
        let path = self.path_for(account_id)?;
        let mut channels = self.load(&path).await?;
        let before = channels.len();
        channels.retain(|c| c != channel);
        if channels.len() == before {
            return Ok(false);
        }
        self.save(&path, &channels).await?;
        Ok(true)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn ch(raw: &str) -> RequiredChannel {
        RequiredChannel::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::new(dir.path().join("channels"));
        assert!(store.list("default").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_remove_preserves_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::new(dir.path());

        assert!(store.add("default", ch("@beta_news")).await.unwrap());
        assert!(store.add("default", ch("@alpha_news")).await.unwrap());
        assert!(store.add("default", ch("-1001")).await.unwrap());
        assert_eq!(store.list("default").await.unwrap(), vec![
            ch("@beta_news"),
            ch("@alpha_news"),
            ch("-1001")
        ]);

        assert!(store.remove("default", &ch("@alpha_news")).await.unwrap());
        assert_eq!(store.list("default").await.unwrap(), vec![
            ch("@beta_news"),
            ch("-1001")
        ]);
    }

    #[tokio::test]
    async fn duplicates_and_unknown_removals_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::new(dir.path());

        assert!(store.add("default", ch("@news_chan")).await.unwrap());
        assert!(!store.add("default", ch("t.me/news_chan")).await.unwrap());
        assert!(!store.remove("default", &ch("@other_chan")).await.unwrap());
        assert_eq!(store.list("default").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lists_are_kept_per_bot_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::new(dir.path());

        store.add("mirror-a", ch("@news_chan")).await.unwrap();
        assert!(store.list("mirror-b").await.unwrap().is_empty());
        assert!(dir.path().join("mirror-a.json").exists());
    }

    #[tokio::test]
    async fn persisted_as_flat_string_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::new(dir.path());
        store.add("default", ch("@news_chan")).await.unwrap();
        store.add("default", ch("-1001")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("default.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!(["@news_chan", "-1001"]));
    }

    #[tokio::test]
    async fn hand_edited_duplicates_collapse_on_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.json"),
            r#"["@news_chan", "@news_chan", "@other_chan"]"#,
        )
        .unwrap();
        let store = FileChannelStore::new(dir.path());
        assert_eq!(store.list("default").await.unwrap(), vec![
            ch("@news_chan"),
            ch("@other_chan")
        ]);
    }

    #[tokio::test]
    async fn rejects_path_like_account_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::new(dir.path());
        assert!(matches!(
            store.list("../etc").await,
            Err(Error::InvalidInput { .. })
        ));
    }
}
