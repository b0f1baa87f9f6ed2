//! FAQ store (spec §6): a flat `topic -> response` document persisted as a
//! single JSON file. Simplified from the reference `Store`'s labelled
//! `Collection` map down to one `HashMap`, since FAQ lookup never needs more
//! than a topic string.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::AppError;

pub struct FaqStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FaqStore {
    /// Loads `path` if it exists, otherwise starts from an empty document.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| AppError::Config(format!("faq store {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AppError::Io(e)),
        };
        Ok(Self { path, entries: RwLock::new(entries) })
    }

    pub fn get(&self, topic: &str) -> Result<Option<String>, AppError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| AppError::Internal("faq store lock poisoned (read)".into()))?;
        Ok(guard.get(&topic.to_lowercase()).cloned())
    }

    pub fn set(&self, topic: &str, response: &str) -> Result<(), AppError> {
        {
            let mut guard = self
                .entries
                .write()
                .map_err(|_| AppError::Internal("faq store lock poisoned (write)".into()))?;
            guard.insert(topic.to_lowercase(), response.to_string());
        }
        self.persist()
    }

    pub fn topics(&self) -> Result<Vec<String>, AppError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| AppError::Internal("faq store lock poisoned (read)".into()))?;
        Ok(guard.keys().cloned().collect())
    }

    fn persist(&self) -> Result<(), AppError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| AppError::Internal("faq store lock poisoned (read)".into()))?;
        let raw = serde_json::to_string_pretty(&*guard).map_err(|e| AppError::Internal(e.to_string()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).unwrap();
        assert!(store.topics().unwrap().is_empty());
    }

    #[test]
    fn set_then_get_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).unwrap();
        store.set("Beatmap Submission", "ask a bn").unwrap();
        assert_eq!(store.get("beatmap submission").unwrap().as_deref(), Some("ask a bn"));
    }

    #[test]
    fn persists_across_reloads() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        {
            let store = FaqStore::load(&path).unwrap();
            store.set("rules", "see the wiki").unwrap();
        }
        let reloaded = FaqStore::load(&path).unwrap();
        assert_eq!(reloaded.get("rules").unwrap().as_deref(), Some("see the wiki"));
    }

    #[test]
    fn unknown_topic_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).unwrap();
        assert!(store.get("nonexistent").unwrap().is_none());
    }
}
