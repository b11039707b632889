//! services/client/src/adapters/token_store.rs
//!
//! Adapters for the `CredentialStore` port: a file-backed store for the binary and an
//! in-memory one for embedding and tests.

use async_trait::async_trait;
use mail_router_core::ports::{CredentialStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Persists the credential token as a single-line file.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileTokenStore {
    async fn load_token(&self) -> PortResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save_token(&self, token: &str) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        tokio::fs::write(&self.path, format!("{}\n", token.trim()))
            .await
            .map_err(|e| {
                PortError::Unexpected(format!("failed to write {}: {}", self.path.display(), e))
            })
    }

    async fn clear_token(&self) -> PortResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Keeps the token in process memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> PortResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| PortError::Unexpected("token store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for MemoryTokenStore {
    async fn load_token(&self) -> PortResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    async fn save_token(&self, token: &str) -> PortResult<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    async fn clear_token(&self) -> PortResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}
