use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::models::ConversationStore;
use crate::core::HistoryError;

/// The chat history file. Every save rewrites the whole file with
/// all conversations.
#[derive(Clone, Debug)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the history file. A missing file is an empty store, a
    /// file that doesn't match the expected shape is an error.
    pub fn load(&self) -> Result<ConversationStore, HistoryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No chat history at {}", self.path.display());
                return Ok(ConversationStore::new());
            }
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let store: ConversationStore =
            serde_json::from_str(&contents).map_err(|source| HistoryError::Parse {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(
            "Loaded {} conversations from {}",
            store.len(),
            self.path.display()
        );
        Ok(store)
    }

    pub fn save(&self, store: &ConversationStore) -> Result<(), HistoryError> {
        let write_err = |source| HistoryError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = serde_json::to_string(store)
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        fs::write(&self.path, contents).map_err(write_err)?;

        tracing::debug!("Saved chat history to {}", self.path.display());
        Ok(())
    }

    /// Deletes the history file. Succeeds if there is nothing to
    /// delete.
    pub fn purge(&self) -> Result<(), HistoryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Deleted chat history {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(HistoryError::Delete {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
