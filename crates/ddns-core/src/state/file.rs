// # File State Store
//
// Writes the configuration snapshot back to the config file.
//
// ## Purpose
//
// The config file doubles as the state file: after a confirmed update the
// IP pool, current address and update time are written back so the next
// start knows which addresses the provider already has.
//
// ## Write Semantics
//
// - Wholesale: every setting is rewritten as an aligned `key=value` line.
//   Comments or formatting in a hand-edited file do not survive the first
//   write.
// - Atomic: the text goes to `<file>.tmp` first and is renamed over the
//   target, so a crash mid-write never leaves a truncated config behind.
//
// ## File Format
//
// ```text
// login_token     =12345,abcdef
// sub_domain      =home
// domain          =example.com
// interval        =5
// ...
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::ConfigState;
use crate::traits::StateStore;

/// File-backed state store
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Store writing to `path`
    ///
    /// Nothing is touched on disk until the first [`StateStore::persist`].
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }

    async fn ensure_parent(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn persist(&self, state: &ConfigState) -> Result<(), Error> {
        self.ensure_parent().await?;

        let text = state.render();
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(text.as_bytes()).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            // Best effort, the rename error is what gets reported
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::persistence(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            )));
        }

        tracing::trace!("State written to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
