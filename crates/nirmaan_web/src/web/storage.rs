use nirmaan::error::StorageError;
use nirmaan::storage::CredentialStore;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(super) fn local_storage_get_string(key: &str) -> Option<String> {
    local_storage().and_then(|s| s.get_item(key).ok().flatten())
}

pub(super) fn local_storage_set_string(key: &str, value: &str) -> Result<(), StorageError> {
    let s = local_storage().ok_or(StorageError::Unavailable)?;
    // Quota exceeded and private-mode failures both surface here.
    s.set_item(key, value).map_err(|_| StorageError::Unavailable)
}

pub(super) fn local_storage_remove(key: &str) {
    if let Some(s) = local_storage() {
        let _ = s.remove_item(key);
    }
}

/// Bearer token in `localStorage[key]`.
#[derive(Debug, Clone, Copy)]
pub(super) struct LocalStorageCredentials {
    key: &'static str,
}

impl LocalStorageCredentials {
    pub(super) fn new(key: &'static str) -> Self {
        Self { key }
    }
}

impl CredentialStore for LocalStorageCredentials {
    fn load(&self) -> Option<String> {
        local_storage_get_string(self.key).filter(|t| !t.trim().is_empty())
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        local_storage_set_string(self.key, token)
    }

    fn clear(&mut self) {
        local_storage_remove(self.key);
    }
}
