//! Interactive chat with persisted history.
//!
//! Each session's messages are stored as JSON under the chat directory and
//! reloaded on the next run, so a conversation survives restarts.

use crate::error::{RagbookError, Result};
use crate::generation::{ChatMessage, Generator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Stored conversation for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    pub session: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// File holding a session's history.
    pub fn path_for(dir: &Path, session: &str) -> PathBuf {
        dir.join(format!("{}.json", session))
    }

    /// Load a session, or start an empty one if none is stored.
    pub fn load(dir: &Path, session: &str) -> Result<Self> {
        validate_session(session)?;
        let path = Self::path_for(dir, session);
        if !path.exists() {
            return Ok(Self {
                session: session.to_string(),
                messages: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let history: ChatHistory = serde_json::from_str(&content)?;
        debug!("Loaded {} messages for session {}", history.messages.len(), session);
        Ok(history)
    }

    /// Write the session to disk.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path_for(dir, &self.session), content)?;
        Ok(())
    }
}

/// Session ids become file names, so only a safe character set is allowed.
fn validate_session(session: &str) -> Result<()> {
    let valid = !session.is_empty()
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RagbookError::InvalidParameter(format!(
            "session id must be non-empty and use only letters, digits, '-' or '_': {:?}",
            session
        )))
    }
}

/// A chat session bound to a generator and a history file.
pub struct ChatSession {
    generator: Arc<dyn Generator>,
    history: ChatHistory,
    dir: PathBuf,
    system_prompt: String,
    max_history: usize,
}

impl ChatSession {
    /// Open a session, loading any stored history.
    pub fn open(
        generator: Arc<dyn Generator>,
        dir: &Path,
        session: &str,
        system_prompt: &str,
        max_history: usize,
    ) -> Result<Self> {
        Ok(Self {
            generator,
            history: ChatHistory::load(dir, session)?,
            dir: dir.to_path_buf(),
            system_prompt: system_prompt.to_string(),
            max_history: max_history.max(1),
        })
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history.messages
    }

    /// Send a user message and return the reply. Both are persisted.
    ///
    /// A failed call leaves the stored history unchanged.
    #[instrument(skip(self, input), fields(session = %self.history.session))]
    pub async fn send(&mut self, input: &str) -> Result<String> {
        if input.trim().is_empty() {
            return Err(RagbookError::InvalidParameter("message must not be empty".to_string()));
        }

        self.history.messages.push(ChatMessage::user(input));

        let start = self.history.messages.len().saturating_sub(self.max_history);
        let mut messages = Vec::with_capacity(self.history.messages.len() - start + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(self.history.messages[start..].iter().cloned());

        let reply = match self.generator.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                self.history.messages.pop();
                return Err(e);
            }
        };

        self.history.messages.push(ChatMessage::assistant(reply.clone()));
        self.history.save(&self.dir)?;
        Ok(reply)
    }

    /// Forget the conversation, on disk as well.
    pub fn clear(&mut self) -> Result<()> {
        self.history.messages.clear();
        self.history.save(&self.dir)?;
        info!("Cleared chat session {}", self.history.session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Role;
    use crate::testing::RecordingGenerator;

    #[tokio::test]
    async fn test_history_persists_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(RecordingGenerator::with(|messages| {
            Ok(format!("seen {}", messages.len()))
        }));

        {
            let mut session =
                ChatSession::open(generator.clone(), dir.path(), "Testing", "be nice", 10).unwrap();
            assert_eq!(session.send("hello").await.unwrap(), "seen 2");
        }

        let mut session =
            ChatSession::open(generator.clone(), dir.path(), "Testing", "be nice", 10).unwrap();
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.send("again").await.unwrap(), "seen 4");

        let last_call = generator.calls().pop().unwrap();
        assert_eq!(last_call[0].role, Role::System);
        assert_eq!(last_call[1].content, "hello");
        assert_eq!(last_call[2].content, "seen 2");
        assert_eq!(last_call[3].content, "again");
    }

    #[tokio::test]
    async fn test_history_is_trimmed_for_requests() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(RecordingGenerator::replying("ok"));
        let mut session = ChatSession::open(generator.clone(), dir.path(), "s", "sys", 3).unwrap();

        for i in 0..4 {
            session.send(&format!("m{}", i)).await.unwrap();
        }

        let last_call = generator.calls().pop().unwrap();
        // system prompt + the three most recent messages
        assert_eq!(last_call.len(), 4);
        assert_eq!(last_call[3].content, "m3");
        assert_eq!(session.history().len(), 8);
    }

    #[tokio::test]
    async fn test_failed_reply_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(RecordingGenerator::failing("offline"));
        let mut session = ChatSession::open(generator, dir.path(), "s", "sys", 5).unwrap();

        assert!(matches!(
            session.send("hi").await,
            Err(RagbookError::Generation(_))
        ));
        assert!(session.history().is_empty());
        assert!(!ChatHistory::path_for(dir.path(), "s").exists());
    }

    #[tokio::test]
    async fn test_clear_wipes_stored_history() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(RecordingGenerator::replying("ok"));
        let mut session = ChatSession::open(generator.clone(), dir.path(), "s", "sys", 5).unwrap();
        session.send("hi").await.unwrap();
        session.clear().unwrap();

        let reopened = ChatSession::open(generator, dir.path(), "s", "sys", 5).unwrap();
        assert!(reopened.history().is_empty());
    }

    #[test]
    fn test_session_ids_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["", "../etc", "a b", "x/y"] {
            assert!(matches!(
                ChatHistory::load(dir.path(), bad),
                Err(RagbookError::InvalidParameter(_))
            ));
        }
        assert!(ChatHistory::load(dir.path(), "team-notes_2").is_ok());
    }
}
