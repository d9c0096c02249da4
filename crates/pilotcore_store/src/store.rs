//! Append-only session persistence (§4.1).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use pilotcore_core::{ForDisplay, Message, Session, SessionUpdate};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::layout;

/// Filesystem-backed `Session Store`. One directory per session under `root`.
///
/// Concurrent appends to the same session are serialized with a per-session
/// in-process lock (§4.1, §5 "serialized externally" — here, externally to the
/// agent loop but within one process, matching the "at most one active session
/// per controlled machine" resource model of §5).
pub struct SessionStore {
    root: PathBuf,
    locks: std::sync::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub async fn create(&self, session: &Session) -> Result<()> {
        let dir = layout::session_dir(&self.root, &session.id);
        if fs::metadata(&dir).await.is_ok() {
            return Err(StoreError::AlreadyExists(session.id.clone()));
        }
        fs::create_dir_all(&dir).await?;
        fs::create_dir_all(layout::images_dir(&self.root, &session.id)).await?;
        self.write_metadata(session).await?;
        fs::File::create(layout::messages_path(&self.root, &session.id)).await?;
        Ok(())
    }

    pub async fn get(&self, session_id: &str) -> Result<Session> {
        let path = layout::metadata_path(&self.root, session_id);
        let bytes = fs::read(&path)
            .await
            .map_err(|_| StoreError::NotFound(session_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Lists all session metadata. Entries whose metadata cannot be read or
    /// parsed are silently skipped (logged), per §4.1.
    pub async fn list(&self) -> Result<Vec<Session>> {
        let mut out = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            match self.get(&id).await {
                Ok(session) => out.push(session),
                Err(e) => warn!("skipping unreadable session metadata for `{id}`: {e}"),
            }
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    pub async fn update(&self, session_id: &str, update: SessionUpdate) -> Result<Session> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;
        let mut session = self.get(session_id).await?;
        session.apply_update(update);
        self.write_metadata(&session).await?;
        Ok(session)
    }

    async fn write_metadata(&self, session: &Session) -> Result<()> {
        let path = layout::metadata_path(&self.root, &session.id);
        let bytes = serde_json::to_vec_pretty(session)?;
        fs::write(path, bytes).await?;
        Ok(())
    }

    /// Atomically extends the message log with zero or more messages (§4.1).
    /// Each message is one self-contained JSON line; the write is serialized
    /// against other appends to the same session.
    pub async fn append_messages(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;

        let path = layout::messages_path(&self.root, session_id);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let mut buf = Vec::new();
        for message in messages {
            serde_json::to_writer(&mut buf, message)?;
            buf.push(b'\n');
        }
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(())
    }

    /// Returns the full log, filtered to `for_display != VisibleOnly`-excluded...
    /// concretely: when `include_hidden` is false, only messages meant for the
    /// human-facing view are returned (§4.1). Append order is preserved. A
    /// partial line at end-of-file (a crash mid-write) is treated as absent.
    pub async fn get_messages(&self, session_id: &str, include_hidden: bool) -> Result<Vec<Message>> {
        let path = layout::messages_path(&self.root, session_id);
        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(session_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        let mut lines = contents.split('\n').peekable();
        while let Some(line) = lines.next() {
            if line.is_empty() {
                continue;
            }
            let is_last = lines.peek().is_none();
            match serde_json::from_str::<Message>(line) {
                Ok(message) => out.push(message),
                Err(e) if is_last => {
                    warn!("dropping truncated trailing message line for `{session_id}`: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        if !include_hidden {
            out.retain(|m| m.for_display.is_visible());
        }
        Ok(out)
    }

    pub async fn put_image(&self, session_id: &str, file_name: &str, bytes: &[u8]) -> Result<String> {
        let sanitized = layout::sanitize_file_name(file_name)
            .ok_or_else(|| StoreError::InvalidFileName(file_name.to_string()))?;
        let dir = layout::images_dir(&self.root, session_id);
        fs::create_dir_all(&dir).await?;
        let path = dir.join(&sanitized);
        fs::write(&path, bytes).await?;
        Ok(sanitized)
    }

    pub async fn get_image(&self, session_id: &str, file_name: &str) -> Result<Vec<u8>> {
        let sanitized = layout::sanitize_file_name(file_name)
            .ok_or_else(|| StoreError::InvalidFileName(file_name.to_string()))?;
        let path = layout::image_path(&self.root, session_id, &sanitized);
        fs::read(&path)
            .await
            .map_err(|_| StoreError::ImageNotFound(sanitized, session_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilotcore_core::{ContentBlock, Role, SessionStatus};

    fn test_session() -> Session {
        Session::new("Test Session", "gemini-2.5-pro")
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();

        let fetched = store.get(&session.id).await.unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.display_name, "Test Session");
    }

    #[tokio::test]
    async fn create_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();
        let err = store.create(&session).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn get_unknown_session_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn append_is_append_only_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();

        let m1 = Message::new(&session.id, Role::User).with_block(ContentBlock::text("one"));
        let m2 = Message::new(&session.id, Role::Model).with_block(ContentBlock::text("two"));
        store.append_messages(&session.id, &[m1.clone()]).await.unwrap();
        store.append_messages(&session.id, &[m2.clone()]).await.unwrap();

        let all = store.get_messages(&session.id, true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, m1.id);
        assert_eq!(all[1].id, m2.id);
    }

    #[tokio::test]
    async fn get_messages_filters_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();

        let visible = Message::new(&session.id, Role::User).with_block(ContentBlock::text("seen"));
        let hidden = Message::new(&session.id, Role::Workflow)
            .with_block(ContentBlock::text("tiles"))
            .hidden();
        store
            .append_messages(&session.id, &[visible.clone(), hidden.clone()])
            .await
            .unwrap();

        let displayed = store.get_messages(&session.id, false).await.unwrap();
        assert_eq!(displayed.len(), 1);
        assert_eq!(displayed[0].id, visible.id);

        let full = store.get_messages(&session.id, true).await.unwrap();
        assert_eq!(full.len(), 2);
    }

    #[tokio::test]
    async fn truncated_trailing_line_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();

        let good = Message::new(&session.id, Role::User).with_block(ContentBlock::text("ok"));
        store.append_messages(&session.id, &[good.clone()]).await.unwrap();

        // Simulate a crash mid-write: append a partial JSON line with no trailing newline.
        let path = layout::messages_path(dir.path(), &session.id);
        let mut file = fs::OpenOptions::new().append(true).open(&path).await.unwrap();
        file.write_all(b"{\"id\":\"trunc").await.unwrap();

        let messages = store.get_messages(&session.id, true).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, good.id);
    }

    #[tokio::test]
    async fn update_merges_and_preserves_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();

        let updated = store
            .update(&session.id, SessionUpdate::status(SessionStatus::Pending, None))
            .await
            .unwrap();
        assert_eq!(updated.id, session.id);
        assert_eq!(updated.status, SessionStatus::Pending);

        let refetched = store.get(&session.id).await.unwrap();
        assert_eq!(refetched.status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn image_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();

        store.put_image(&session.id, "shot.png", b"PNGDATA").await.unwrap();
        let bytes = store.get_image(&session.id, "shot.png").await.unwrap();
        assert_eq!(bytes, b"PNGDATA");
    }

    #[tokio::test]
    async fn image_name_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = test_session();
        store.create(&session).await.unwrap();

        store
            .put_image(&session.id, "../../escape.png", b"X")
            .await
            .unwrap();
        let path = layout::image_path(dir.path(), &session.id, "escape.png");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn list_skips_unreadable_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let good = test_session();
        store.create(&good).await.unwrap();

        let broken_dir = dir.path().join("broken-session");
        fs::create_dir_all(&broken_dir).await.unwrap();
        fs::write(broken_dir.join(layout::METADATA_FILE), b"not json")
            .await
            .unwrap();

        let sessions = store.list().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, good.id);
    }
}
