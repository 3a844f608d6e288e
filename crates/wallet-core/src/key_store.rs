//! Persistence of the initialized wallet's public key.
//!
//! Only the hex public key is ever stored; private keys stay in memory for
//! the duration of a single command.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::WalletError;

/// "Get or fail" access to the stored public key.
pub trait PublicKeyStore: Send + Sync {
    /// The stored hex public key, or `None` if no wallet was initialized.
    fn load(&self) -> Result<Option<String>, WalletError>;

    /// Replace the stored public key.
    fn save(&self, public_key_hex: &str) -> Result<(), WalletError>;
}

/// Stores the key as a single text file.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PublicKeyStore for FileKeyStore {
    fn load(&self) -> Result<Option<String>, WalletError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WalletError::KeyStore(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, public_key_hex: &str) -> Result<(), WalletError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                WalletError::KeyStore(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, public_key_hex).map_err(|e| {
            WalletError::KeyStore(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    key: Mutex<Option<String>>,
}

impl MemoryKeyStore {
    pub fn with_key(public_key_hex: &str) -> Self {
        Self {
            key: Mutex::new(Some(public_key_hex.to_string())),
        }
    }
}

impl PublicKeyStore for MemoryKeyStore {
    fn load(&self) -> Result<Option<String>, WalletError> {
        self.key
            .lock()
            .map(|k| k.clone())
            .map_err(|_| WalletError::KeyStore("memory store poisoned".into()))
    }

    fn save(&self, public_key_hex: &str) -> Result<(), WalletError> {
        let mut key = self
            .key
            .lock()
            .map_err(|_| WalletError::KeyStore("memory store poisoned".into()))?;
        *key = Some(public_key_hex.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join(".public_key"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join(".public_key"));
        store.save(PUBKEY).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(PUBKEY));
    }

    #[test]
    fn load_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".public_key");
        std::fs::write(&path, format!("{PUBKEY}\n")).unwrap();
        assert_eq!(FileKeyStore::new(path).load().unwrap().as_deref(), Some(PUBKEY));
    }

    #[test]
    fn blank_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".public_key");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(FileKeyStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("nested/dir/key"));
        store.save(PUBKEY).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn directory_path_is_key_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        assert!(matches!(store.load(), Err(WalletError::KeyStore(_))));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryKeyStore::default();
        assert_eq!(store.load().unwrap(), None);
        store.save(PUBKEY).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(PUBKEY));
        assert_eq!(MemoryKeyStore::with_key("ab").load().unwrap().as_deref(), Some("ab"));
    }
}
