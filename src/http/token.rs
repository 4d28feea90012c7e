//! Bearer token persistence.
//!
//! The token is opaque, written only by the auth session (and the
//! transport's forced sign-out path) and read per-request by the
//! transport. Storage mirrors the dashboard's local-storage slot: a single
//! document holding one key.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Storage key for the persisted bearer token.
pub const AUTH_TOKEN_KEY: &str = "admin_auth_token";

/// Pluggable token storage backend.
///
/// Mirrors local-storage semantics: operations do not fail loudly; a
/// backend that cannot persist logs and behaves as empty.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    fn load(&self) -> Option<String>;

    /// Persists a token, replacing any existing one.
    fn store(&self, token: &str);

    /// Removes the stored token.
    fn clear(&self);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenDocument {
    admin_auth_token: Option<String>,
}

/// File-backed token store writing a small JSON document.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> TokenDocument {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "token file is corrupt, treating as empty");
                TokenDocument::default()
            }),
            Err(_) => TokenDocument::default(),
        }
    }

    fn write_document(&self, doc: &TokenDocument) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "failed to create token directory");
                return;
            }
        }
        match serde_json::to_string_pretty(doc) {
            Ok(contents) => {
                if let Err(e) = fs::write(&self.path, contents) {
                    warn!(path = %self.path.display(), error = %e, "failed to write token file");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize token document"),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        self.read_document().admin_auth_token
    }

    fn store(&self, token: &str) {
        self.write_document(&TokenDocument {
            admin_auth_token: Some(token.to_string()),
        });
    }

    fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove token file");
            }
        }
    }
}

/// In-memory token store for tests and embedding without persistence.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn store(&self, token: &str) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}
