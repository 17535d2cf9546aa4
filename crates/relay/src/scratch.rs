use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{Context, Result},
    naming::sanitize_file_name,
};

/// A per-relay scratch path that is deleted when the guard drops.
///
/// The file itself is created by whoever downloads into [`ScratchFile::path`];
/// the guard only owns its removal.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Reserve `<dir>/<uuid>_<name>` and make sure `dir` exists.
    pub fn create(dir: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create scratch dir {}", dir.display()))?;
        let name = sanitize_file_name(name).unwrap_or_else(|| "upload".into());
        let path = dir.join(format!("{}_{name}", uuid::Uuid::new_v4().simple()));
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "scratch file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove scratch file"),
        }
    }
}
