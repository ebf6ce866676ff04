//! Whole-list session storage.
//!
//! Sessions are never updated in place: every reader loads the entire list,
//! mutates its copy and writes the entire list back. Two writers that
//! interleave between load and save lose one of their updates. The tick and
//! the connection tasks accept that race; build with the `cas` feature to
//! have [`SessionStore::modify`] retry on conflicting writes instead.

use crate::error::StoreError;
use crate::session::Session;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Key holding the serialized session list.
pub const SESSIONS_KEY: &str = "games";

/// A get/set key-value store holding opaque blobs.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Writes `value` only if the stored blob still equals `expected`.
    /// Returns false without writing when it does not.
    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> Result<bool, StoreError>;
}

/// Process-local blob store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> Result<bool, StoreError> {
        let mut values = self.lock()?;
        if values.get(key).map(Vec::as_slice) != expected {
            return Ok(false);
        }
        values.insert(key.to_string(), value);
        Ok(true)
    }
}

/// Typed access to the session list inside a [`BlobStore`].
#[derive(Clone)]
pub struct SessionStore {
    blobs: Arc<dyn BlobStore>,
}

impl SessionStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Loads the full list. A missing key reads as no sessions.
    pub fn load(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.load_raw()?.1)
    }

    pub fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        self.blobs.set(SESSIONS_KEY, bincode::serialize(sessions)?)
    }

    /// Empties the list.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.save(&[])
    }

    /// Load, apply `f`, save.
    ///
    /// Without the `cas` feature a concurrent writer between the load and
    /// the save is silently overwritten. With it, the save only lands if the
    /// list is unchanged since the load; otherwise `f` runs again on a fresh
    /// copy.
    pub fn modify<R>(&self, mut f: impl FnMut(&mut Vec<Session>) -> R) -> Result<R, StoreError> {
        if cfg!(feature = "cas") {
            loop {
                let (raw, mut sessions) = self.load_raw()?;
                let result = f(&mut sessions);
                let encoded = bincode::serialize(&sessions)?;
                if self
                    .blobs
                    .compare_and_set(SESSIONS_KEY, raw.as_deref(), encoded)?
                {
                    return Ok(result);
                }
                debug!("Session list changed during update, retrying");
            }
        }

        let mut sessions = self.load()?;
        let result = f(&mut sessions);
        self.save(&sessions)?;
        Ok(result)
    }

    fn load_raw(&self) -> Result<(Option<Vec<u8>>, Vec<Session>), StoreError> {
        let raw = self.blobs.get(SESSIONS_KEY)?;
        let sessions = match &raw {
            Some(bytes) => bincode::deserialize(bytes)?,
            None => Vec::new(),
        };
        Ok((raw, sessions))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::OfflineStore;
    use super::*;
    use shared::ClientId;

    fn session_with_player() -> Session {
        let mut session = Session::new();
        session.players[0].id = Some(ClientId::random());
        session.players[0].active = true;
        session.puck.x = 123.25;
        session.update_time = 99.5;
        session
    }

    #[test]
    fn test_missing_key_is_empty() {
        let store = SessionStore::in_memory();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let store = SessionStore::in_memory();
        let sessions = vec![session_with_player(), Session::new()];
        store.save(&sessions).unwrap();
        assert_eq!(store.load().unwrap(), sessions);
    }

    #[test]
    fn test_modify_persists_changes() {
        let store = SessionStore::in_memory();
        store.reset().unwrap();

        let count = store
            .modify(|sessions| {
                sessions.push(session_with_player());
                sessions.len()
            })
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_blob() {
        let blobs = Arc::new(MemoryStore::new());
        blobs.set(SESSIONS_KEY, vec![0xFF; 3]).unwrap();
        let store = SessionStore::new(blobs);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_unavailable_backend() {
        let store = SessionStore::new(Arc::new(OfflineStore));
        assert!(matches!(store.load(), Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.modify(|sessions| sessions.clear()),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_compare_and_set() {
        let store = MemoryStore::new();
        assert!(store.compare_and_set("k", None, vec![1]).unwrap());
        assert!(!store.compare_and_set("k", None, vec![2]).unwrap());
        assert!(!store.compare_and_set("k", Some(&[9u8][..]), vec![2]).unwrap());
        assert!(store.compare_and_set("k", Some(&[1u8][..]), vec![2]).unwrap());
        assert_eq!(store.get("k").unwrap(), Some(vec![2]));
    }

    #[cfg(feature = "cas")]
    mod compare_and_swap {
        use super::session_with_player;
        use crate::error::StoreError;
        use crate::session::Session;
        use crate::store::{BlobStore, MemoryStore, SessionStore};
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        /// Memory backend that sneaks one extra session into the list right
        /// before the first compare-and-set lands.
        #[derive(Default)]
        struct RacingStore {
            inner: MemoryStore,
            raced: AtomicBool,
        }

        impl BlobStore for RacingStore {
            fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
                self.inner.get(key)
            }

            fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
                self.inner.set(key, value)
            }

            fn compare_and_set(
                &self,
                key: &str,
                expected: Option<&[u8]>,
                value: Vec<u8>,
            ) -> Result<bool, StoreError> {
                if !self.raced.swap(true, Ordering::SeqCst) {
                    let mut sessions: Vec<Session> = match self.inner.get(key)? {
                        Some(bytes) => bincode::deserialize(&bytes)?,
                        None => Vec::new(),
                    };
                    sessions.push(Session::new());
                    self.inner.set(key, bincode::serialize(&sessions)?)?;
                }
                self.inner.compare_and_set(key, expected, value)
            }
        }

        #[test]
        fn test_modify_retries_after_concurrent_write() {
            let store = SessionStore::new(Arc::new(RacingStore::default()));
            store.reset().unwrap();

            let mut calls = 0;
            store
                .modify(|sessions| {
                    calls += 1;
                    sessions.push(session_with_player());
                })
                .unwrap();

            assert_eq!(calls, 2);
            let sessions = store.load().unwrap();
            assert_eq!(sessions.len(), 2);
            assert_eq!(sessions[0], Session::new());
            assert_eq!(sessions[1].active_players(), 1);
        }
    }
}
