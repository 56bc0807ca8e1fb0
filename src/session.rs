//! Persistent storage for the backend-assigned dataset session.
//!
//! The store keeps an in-memory copy for fast reads and mirrors every write to
//! a durable backend (browser `localStorage` in the app) so a page reload
//! picks the session back up. The durable copy is written first. When that
//! write fails the old durable copy is dropped, so a reload never restores a
//! session other than the cached one.

use crate::config::SESSION_STORAGE_KEY;
use crate::error::{AppError, AppResult};
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::Rc;

/// Durable key/value slot the session id is persisted to.
pub trait SessionBackend {
    fn load(&self) -> Option<String>;
    fn store(&self, id: &str) -> AppResult<()>;
    fn remove(&self);
}

/// Backend over `window.localStorage`.
pub struct LocalStorageBackend {
    storage: web_sys::Storage,
    key: &'static str,
}

impl LocalStorageBackend {
    /// Returns `None` when the browser exposes no local storage (private mode,
    /// sandboxed iframes, non-browser targets).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self {
            storage,
            key: SESSION_STORAGE_KEY,
        })
    }
}

impl SessionBackend for LocalStorageBackend {
    fn load(&self) -> Option<String> {
        self.storage.get_item(self.key).ok().flatten()
    }

    fn store(&self, id: &str) -> AppResult<()> {
        self.storage
            .set_item(self.key, id)
            .map_err(|_| AppError::storage("localStorage rejected the write"))
    }

    fn remove(&self) {
        if self.storage.remove_item(self.key).is_err() {
            warn!("Failed to remove session id from localStorage");
        }
    }
}

/// In-memory backend. Clones share the same slot, which lets tests reopen a
/// store "after a reload".
#[derive(Clone, Default)]
pub struct MemoryBackend {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(id: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(id.into()))),
        }
    }

    pub fn peek(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> Option<String> {
        self.peek()
    }

    fn store(&self, id: &str) -> AppResult<()> {
        *self.slot.borrow_mut() = Some(id.to_string());
        Ok(())
    }

    fn remove(&self) {
        *self.slot.borrow_mut() = None;
    }
}

pub struct SessionStore {
    cached: Option<String>,
    backend: Box<dyn SessionBackend>,
}

impl SessionStore {
    /// Opens the store and restores any session persisted by a previous page view.
    pub fn open(backend: Box<dyn SessionBackend>) -> Self {
        let cached = backend.load().filter(|id| !id.is_empty());
        if let Some(id) = &cached {
            debug!("Restored session {}", id);
        }
        Self { cached, backend }
    }

    /// Opens over `localStorage`, falling back to memory when it is unavailable.
    pub fn browser() -> Self {
        match LocalStorageBackend::open() {
            Some(backend) => Self::open(Box::new(backend)),
            None => {
                warn!("localStorage unavailable, session will not survive a reload");
                Self::open(Box::new(MemoryBackend::new()))
            }
        }
    }

    /// Caches `id` even when persisting it fails; the backend issued it and
    /// later requests must use it. The error is returned for display.
    pub fn set(&mut self, id: impl Into<String>) -> AppResult<()> {
        let id = id.into();
        let persisted = self.backend.store(&id);
        if let Err(err) = &persisted {
            warn!("Session {} kept in memory only: {}", id, err);
            self.backend.remove();
        }
        self.cached = Some(id);
        persisted
    }

    pub fn get(&self) -> Option<&str> {
        self.cached.as_deref()
    }

    pub fn clear(&mut self) {
        self.backend.remove();
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RejectingBackend;

    #[test]
    fn set_writes_through_to_backend() {
        let backend = MemoryBackend::new();
        let mut store = SessionStore::open(Box::new(backend.clone()));
        assert_eq!(store.get(), None);

        store.set("abc-123").unwrap();
        assert_eq!(store.get(), Some("abc-123"));
        assert_eq!(backend.peek().as_deref(), Some("abc-123"));

        store.set("def-456").unwrap();
        assert_eq!(backend.peek().as_deref(), Some("def-456"));
    }

    #[test]
    fn reopened_store_restores_persisted_session() {
        let backend = MemoryBackend::new();
        SessionStore::open(Box::new(backend.clone()))
            .set("persisted")
            .unwrap();

        let reopened = SessionStore::open(Box::new(backend));
        assert_eq!(reopened.get(), Some("persisted"));
    }

    #[test]
    fn clear_removes_both_copies() {
        let backend = MemoryBackend::with_value("old");
        let mut store = SessionStore::open(Box::new(backend.clone()));
        store.clear();
        assert_eq!(store.get(), None);
        assert_eq!(backend.peek(), None);
    }

    #[test]
    fn rejected_write_never_restores_an_older_session() {
        let backend = RejectingBackend::with_value("old");
        let mut store = SessionStore::open(Box::new(backend.clone()));
        assert_eq!(store.get(), Some("old"));

        let err = store.set("new").unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(store.get(), Some("new"));

        let reopened = SessionStore::open(Box::new(backend));
        assert_eq!(reopened.get(), None);
    }

    #[test]
    fn empty_persisted_value_is_no_session() {
        let store = SessionStore::open(Box::new(MemoryBackend::with_value("")));
        assert_eq!(store.get(), None);
    }
}
