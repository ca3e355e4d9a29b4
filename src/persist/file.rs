//! File-backed session store
//!
//! One pretty-printed JSON document per namespace at `<dir>/<namespace>.json`.

use super::{PersistedSession, SessionStore, StoredDocument, STORAGE_VERSION};
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    namespace: String,
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store for `namespace` inside `dir`. The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let path = dir.as_ref().join(format!("{}.json", namespace));
        Self { namespace, path }
    }

    /// Location of the session document
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn load(&self) -> Result<Option<PersistedSession>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let doc: StoredDocument = serde_json::from_str(&content)?;
        if doc.version != STORAGE_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                version = doc.version,
                expected = STORAGE_VERSION,
                "Ignoring session stored with unknown version"
            );
            return Ok(None);
        }

        Ok(Some(doc.state))
    }

    async fn save(&self, session: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&StoredDocument::new(session.clone()))?;

        // Write then rename so a crash never leaves a half-written document
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
