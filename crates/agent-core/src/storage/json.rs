use crate::agent::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredConversation {
    pub id: String,
    pub messages: Vec<Message>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    async fn save_conversation(
        &self,
        id: &str,
        messages: &[Message],
        updated_at: DateTime<Utc>,
    ) -> std::io::Result<()>;
    async fn load_conversation(&self, id: &str) -> std::io::Result<Option<StoredConversation>>;
    async fn delete_conversation(&self, id: &str) -> std::io::Result<bool>;
}

/// One `<id>.json` document per conversation.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    base_path: PathBuf,
}

impl JsonStorage {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub async fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.base_path).await
    }

    pub async fn list_conversations(&self) -> std::io::Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(error) => return Err(error),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Ids name a file directly under `base_path`; separators and `..` are refused.
    fn conversation_path(&self, id: &str) -> std::io::Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid conversation id '{}'", id),
            ));
        }
        Ok(self.base_path.join(format!("{}.json", id)))
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_conversation(
        &self,
        id: &str,
        messages: &[Message],
        updated_at: DateTime<Utc>,
    ) -> std::io::Result<()> {
        let path = self.conversation_path(id)?;
        self.init().await?;
        let stored = StoredConversation {
            id: id.to_string(),
            messages: messages.to_vec(),
            updated_at,
        };
        let json = serde_json::to_string(&stored)?;
        fs::write(path, json).await?;
        log::debug!("[{}] Saved {} messages", id, messages.len());
        Ok(())
    }

    async fn load_conversation(&self, id: &str) -> std::io::Result<Option<StoredConversation>> {
        let path = self.conversation_path(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).await?;
        let stored = serde_json::from_str(&content)?;
        Ok(Some(stored))
    }

    async fn delete_conversation(&self, id: &str) -> std::io::Result<bool> {
        match fs::remove_file(self.conversation_path(id)?).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolCallRef;
    use std::io;

    #[tokio::test]
    async fn save_then_load_keeps_messages_and_timestamp() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = JsonStorage::new(dir.path().join("conversations"));
        let messages = vec![
            Message::user("open example.com"),
            Message::assistant(
                "",
                Some(vec![ToolCallRef::new("call_1", "list_tabs", "{}")]),
            ),
            Message::tool_result("call_1", "list_tabs", "Title: x\nURL: y\nTabID: 1"),
        ];
        let updated_at = Utc::now();

        storage
            .save_conversation("conv-1", &messages, updated_at)
            .await?;
        let loaded = storage
            .load_conversation("conv-1")
            .await?
            .expect("conversation should exist");

        assert_eq!(loaded.id, "conv-1");
        assert_eq!(loaded.messages, messages);
        assert_eq!(loaded.updated_at, updated_at);
        assert!(loaded.messages[1].hidden);
        assert!(loaded.messages[2].hidden);
        Ok(())
    }

    #[tokio::test]
    async fn load_missing_conversation_returns_none() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = JsonStorage::new(dir.path());

        assert!(storage.load_conversation("missing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_conversation_reports_whether_file_existed() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = JsonStorage::new(dir.path());
        storage
            .save_conversation("conv-1", &[Message::user("hi")], Utc::now())
            .await?;

        assert!(storage.delete_conversation("conv-1").await?);
        assert!(!storage.delete_conversation("conv-1").await?);
        assert!(storage.load_conversation("conv-1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn list_conversations_returns_sorted_ids() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = JsonStorage::new(dir.path().join("nested"));
        assert!(storage.list_conversations().await?.is_empty());

        for id in ["b", "a"] {
            storage
                .save_conversation(id, &[Message::user("hi")], Utc::now())
                .await?;
        }

        assert_eq!(storage.list_conversations().await?, vec!["a", "b"]);
        Ok(())
    }

    #[tokio::test]
    async fn ids_cannot_escape_the_storage_directory() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = JsonStorage::new(dir.path().join("conversations"));

        for id in ["../outside", "a/b", "a\\b", "..", ""] {
            let err = storage
                .save_conversation(id, &[Message::user("hi")], Utc::now())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "id {:?}", id);
            assert_eq!(
                storage.load_conversation(id).await.unwrap_err().kind(),
                io::ErrorKind::InvalidInput
            );
            assert_eq!(
                storage.delete_conversation(id).await.unwrap_err().kind(),
                io::ErrorKind::InvalidInput
            );
        }

        assert!(!dir.path().join("outside.json").exists());
        assert!(!dir.path().join("conversations").exists());
        Ok(())
    }
}
