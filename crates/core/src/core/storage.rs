//! Credential persistence.
//!
//! The bearer token is the only client state that survives a restart. It lives
//! under a single key; absence means logged out.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::StorageError;

/// Key the token is stored under (browser `localStorage`, token file name stem).
pub const TOKEN_KEY: &str = "token";

/// Durable slot for the bearer token.
///
/// Only [`crate::session::SessionStore`] writes through this trait.
pub trait CredentialStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, token: &str) -> Result<(), StorageError>;
    fn clear(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCredentials {
    token: Option<String>,
}

impl MemoryCredentials {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl CredentialStore for MemoryCredentials {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) {
        self.token = None;
    }
}

/// Token kept in a single file; used by the terminal client.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CredentialStore for FileCredentials {
    fn load(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove token file {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token_path(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("nirmaan-test-{}-{}", tag, std::process::id()))
            .join(TOKEN_KEY)
    }

    #[test]
    fn memory_store_save_load_clear() {
        let mut s = MemoryCredentials::default();
        assert_eq!(s.load(), None);
        s.save("abc").unwrap();
        assert_eq!(s.load().as_deref(), Some("abc"));
        s.clear();
        assert_eq!(s.load(), None);
    }

    #[test]
    fn file_store_persists_and_clears() {
        let path = temp_token_path("persist");
        let mut s = FileCredentials::new(&path);
        s.clear();
        assert_eq!(s.load(), None);

        s.save("tok-1").unwrap();
        assert_eq!(FileCredentials::new(&path).load().as_deref(), Some("tok-1"));

        s.clear();
        assert_eq!(s.load(), None);
        // Clearing twice is fine.
        s.clear();
    }

    #[test]
    fn blank_token_file_reads_as_logged_out() {
        let path = temp_token_path("blank");
        let mut s = FileCredentials::new(&path);
        s.save("   \n").unwrap();
        assert_eq!(s.load(), None);
        s.clear();
    }
}
