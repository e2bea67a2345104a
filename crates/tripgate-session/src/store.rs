//! The session store: one cached principal, mirrored to durable storage.
//!
//! ```text
//!              set(Some(p))                      set(None)
//!   cache ◄──────────────────── p       cache ◄────────── None
//!     │                                   │
//!     ▼ one batch                         ▼ one batch
//!   storage[record_key] = encode(p)     delete record_key
//!   storage[token_key]  = p.token       delete token_key
//! ```
//!
//! The two durable keys are always written and cleared together, so there
//! is never a moment where a token exists without the record it belongs
//! to (or the reverse). `load()` repairs storage left behind by older
//! clients that didn't keep that promise.
//!
//! The store is plain data with `&mut self` setters. The controller keeps
//! it behind its own lock, which makes "update cache + write storage" one
//! critical section.

use tripgate_protocol::{Codec, JsonCodec};

use crate::{Principal, SessionConfig, Storage, StorageError, StorageOp};

pub struct SessionStore<S, C = JsonCodec> {
    storage: S,
    codec: C,
    record_key: String,
    token_key: String,
    cached: Option<Principal>,
}

impl<S: Storage> SessionStore<S> {
    /// Creates an empty store that persists JSON records into `storage`.
    ///
    /// Nothing is read until [`load`](Self::load) is called.
    pub fn new(storage: S, config: &SessionConfig) -> Self {
        Self::with_codec(storage, JsonCodec, config)
    }
}

impl<S: Storage, C: Codec> SessionStore<S, C> {
    pub fn with_codec(storage: S, codec: C, config: &SessionConfig) -> Self {
        Self {
            storage,
            codec,
            record_key: config.record_key.clone(),
            token_key: config.token_key.clone(),
            cached: None,
        }
    }

    /// The cached principal, if any. Never touches storage.
    pub fn get(&self) -> Option<&Principal> {
        self.cached.as_ref()
    }

    /// Replaces the cached principal and its durable copy.
    ///
    /// `Some` is a full overwrite of both keys. If the write fails the
    /// cache keeps its previous value, so memory never claims a session
    /// that storage doesn't have.
    ///
    /// `None` always clears the cache, even when deleting from storage
    /// fails: signing out must not depend on the disk.
    ///
    /// # Errors
    /// Returns the [`StorageError`] from the failed batch.
    pub fn set(&mut self, principal: Option<Principal>) -> Result<(), StorageError> {
        match principal {
            Some(principal) => {
                let record = self
                    .codec
                    .encode(&principal)
                    .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
                self.storage.apply(&[
                    StorageOp::put(&self.record_key, record),
                    StorageOp::put(&self.token_key, &principal.session_token),
                ])?;
                self.cached = Some(principal);
                Ok(())
            }
            None => {
                self.cached = None;
                self.clear_storage()
            }
        }
    }

    /// Hydrates the cache from storage. Never fails.
    ///
    /// - missing record → no session (a leftover token is purged)
    /// - unreadable storage or unparsable record → both keys purged, no
    ///   session, logged at `warn`
    /// - valid record with a missing or different token mirror → the
    ///   mirror is rewritten from the record
    pub fn load(&mut self) -> Option<&Principal> {
        self.cached = None;

        let record = match self.storage.get(&self.record_key) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "session storage unreadable; starting signed out");
                self.purge();
                return None;
            }
        };

        let Some(record) = record else {
            if let Ok(Some(_)) = self.storage.get(&self.token_key) {
                tracing::warn!(key = %self.token_key, "purging session token with no record");
                self.purge();
            }
            return None;
        };

        let principal = match self.codec.decode::<Principal>(&record) {
            Ok(p) if !p.session_token.is_empty() => p,
            Ok(_) => {
                tracing::warn!("stored session has an empty token; discarding");
                self.purge();
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored session is corrupt; discarding");
                self.purge();
                return None;
            }
        };

        let mirror = self.storage.get(&self.token_key).ok().flatten();
        if mirror.as_deref() != Some(principal.session_token.as_str()) {
            tracing::warn!(
                principal_id = %principal.id,
                "session token mirror out of sync; rewriting"
            );
            let repair = self
                .storage
                .apply(&[StorageOp::put(&self.token_key, &principal.session_token)]);
            if let Err(e) = repair {
                tracing::warn!(error = %e, "could not repair session token mirror");
            }
        }

        self.cached = Some(principal);
        self.cached.as_ref()
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn clear_storage(&self) -> Result<(), StorageError> {
        self.storage.apply(&[
            StorageOp::delete(&self.record_key),
            StorageOp::delete(&self.token_key),
        ])
    }

    fn purge(&self) {
        if let Err(e) = self.clear_storage() {
            tracing::warn!(error = %e, "could not purge session storage");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tripgate_protocol::{PrincipalId, Role, Specialization, VerificationStatus};

    use super::*;
    use crate::MemoryStorage;

    /// Storage whose writes always fail; reads see whatever was seeded.
    struct ReadOnly(MemoryStorage);

    impl Storage for ReadOnly {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn apply(&self, _batch: &[StorageOp]) -> Result<(), StorageError> {
            Err(StorageError::WriteFailed("read-only".into()))
        }
    }

    fn principal(token: &str) -> Principal {
        Principal {
            id: PrincipalId::from("u-1"),
            name: "Ana".into(),
            email: "a@b.com".into(),
            role: Role::Agent,
            specialization: Some(Specialization::Tour),
            verification_status: VerificationStatus::Unverified,
            session_token: token.into(),
        }
    }

    fn store() -> (Arc<MemoryStorage>, SessionStore<Arc<MemoryStorage>>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(Arc::clone(&storage), &SessionConfig::default());
        (storage, store)
    }

    #[test]
    fn test_set_some_writes_record_and_token_together() {
        let (storage, mut store) = store();

        store.set(Some(principal("t-1"))).unwrap();

        assert_eq!(store.get(), Some(&principal("t-1")));
        assert_eq!(storage.raw("token").as_deref(), Some("t-1"));
        let record: Principal =
            serde_json::from_str(&storage.raw("tripgate.session").unwrap()).unwrap();
        assert_eq!(record, principal("t-1"));
    }

    #[test]
    fn test_set_none_clears_both_keys() {
        let (storage, mut store) = store();
        store.set(Some(principal("t-1"))).unwrap();

        store.set(None).unwrap();

        assert_eq!(store.get(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_set_some_write_failure_leaves_cache_unchanged() {
        let mut store =
            SessionStore::new(ReadOnly(MemoryStorage::new()), &SessionConfig::default());

        let err = store.set(Some(principal("t-1"))).unwrap_err();

        assert!(matches!(err, StorageError::WriteFailed(_)));
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_set_none_write_failure_still_clears_cache() {
        let seeded = MemoryStorage::new();
        seeded.insert("token", "t-1");
        let mut store = SessionStore::new(ReadOnly(seeded), &SessionConfig::default());
        store.cached = Some(principal("t-1"));

        assert!(store.set(None).is_err());
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_load_round_trips_what_set_wrote() {
        let (storage, mut store) = store();
        store.set(Some(principal("t-1"))).unwrap();

        let mut reopened = SessionStore::new(storage, &SessionConfig::default());
        assert_eq!(reopened.load(), Some(&principal("t-1")));
    }

    #[test]
    fn test_load_missing_record_is_none() {
        let (_, mut store) = store();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_corrupt_record_purges_both_keys() {
        let (storage, mut store) = store();
        storage.insert("tripgate.session", "{not json");
        storage.insert("token", "t-1");

        assert_eq!(store.load(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_load_record_with_wrong_shape_is_corrupt() {
        let (storage, mut store) = store();
        storage.insert("tripgate.session", r#"{"id":"u-1","role":"PIRATE"}"#);

        assert_eq!(store.load(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_load_orphan_token_is_purged() {
        let (storage, mut store) = store();
        storage.insert("token", "t-orphan");

        assert_eq!(store.load(), None);
        assert_eq!(storage.raw("token"), None);
    }

    #[test]
    fn test_load_repairs_diverged_token_mirror() {
        let (storage, mut store) = store();
        storage.insert(
            "tripgate.session",
            serde_json::to_string(&principal("t-1")).unwrap(),
        );
        storage.insert("token", "t-stale");

        assert_eq!(store.load().map(|p| p.session_token.as_str()), Some("t-1"));
        assert_eq!(storage.raw("token").as_deref(), Some("t-1"));
    }

    #[test]
    fn test_load_empty_token_is_discarded() {
        let (storage, mut store) = store();
        storage.insert(
            "tripgate.session",
            serde_json::to_string(&principal("")).unwrap(),
        );

        assert_eq!(store.load(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_custom_keys_from_config() {
        let storage = Arc::new(MemoryStorage::new());
        let config = SessionConfig {
            record_key: "app.user".into(),
            token_key: "auth_token".into(),
            ..SessionConfig::default()
        };
        let mut store = SessionStore::new(Arc::clone(&storage), &config);

        store.set(Some(principal("t-9"))).unwrap();

        assert!(storage.raw("app.user").is_some());
        assert_eq!(storage.raw("auth_token").as_deref(), Some("t-9"));
        assert_eq!(storage.raw("token"), None);
    }
}
