use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;
use serde_json::Value;
use thiserror::Error;

use super::conversation::Conversation;

/// Key the conversation snapshot is stored under.
pub const STORAGE_KEY: &str = "messages";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Stored conversation has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// String key/value storage local to the client.
pub trait ConversationStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self { entries }
    }
}

impl ConversationStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ConversationStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// Reads the stored snapshot.
///
/// `Ok(None)` when nothing is stored, the stored text is not JSON, or it is
/// JSON `null`. Valid JSON that is not a message list is an error.
pub fn load_conversation<S: ConversationStore + ?Sized>(
    store: &S
) -> Result<Option<Conversation>, StorageError> {
    let raw = match store.get(STORAGE_KEY)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let value: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Discarding unreadable conversation snapshot: {}", e);
            return Ok(None);
        }
    };
    if value.is_null() {
        return Ok(None);
    }

    serde_json::from_value::<Conversation>(value)
        .map(Some)
        .map_err(StorageError::Shape)
}

pub fn save_conversation<S: ConversationStore + ?Sized>(
    store: &mut S,
    conversation: &Conversation
) -> Result<(), StorageError> {
    let snapshot = serde_json::to_string(conversation)?;
    store.set(STORAGE_KEY, &snapshot)
}
