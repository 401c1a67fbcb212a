use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::error::{SessionError, StorageError};
use super::storage::TokenStorage;

/// Holds the bearer token and mirrors every change to a persistent slot.
///
/// Two states only: anonymous (`token == None`) and authenticated. A storage
/// failure never fails a login or logout; the store logs it and stops
/// touching the slot for the rest of the process. Unreadable slot contents
/// are not a failure: the store starts anonymous and overwrites them later.
pub struct SessionStore {
    token: Option<String>,
    stored_at: Option<DateTime<Utc>>,
    storage: Box<dyn TokenStorage>,
    persistent: bool,
}

impl SessionStore {
    /// Open a session over `storage`, reading whatever an earlier run left
    /// in the slot.
    pub fn open(storage: impl TokenStorage + 'static) -> Self {
        Self::open_boxed(Box::new(storage))
    }

    pub fn open_boxed(storage: Box<dyn TokenStorage>) -> Self {
        let mut store = Self {
            token: None,
            stored_at: None,
            storage,
            persistent: true,
        };

        match store.storage.load() {
            Ok(Some(record)) if !record.token.is_empty() => {
                debug!(storage = %store.storage.describe(), "Session restored from slot");
                store.token = Some(record.token);
                store.stored_at = record.stored_at;
            }
            Ok(_) => {
                debug!(storage = %store.storage.describe(), "No saved session");
            }
            // The next login or logout overwrites a garbled slot
            Err(StorageError::Malformed(e)) => {
                warn!(
                    storage = %store.storage.describe(),
                    error = %e,
                    "Saved session is unreadable, starting anonymous"
                );
            }
            Err(e) => store.degrade("load", &e),
        }

        store
    }

    /// Current token, if signed in.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// When the current token was written to the slot, if known.
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.stored_at
    }

    /// Whether changes still reach the persistent slot.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn storage_name(&self) -> String {
        self.storage.describe()
    }

    /// Sign in with a token obtained by the login view.
    pub fn login(&mut self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let saved = self.persistent
            && match self.storage.save(&token) {
                Ok(()) => true,
                Err(e) => {
                    self.degrade("save", &e);
                    false
                }
            };

        self.token = Some(token);
        self.stored_at = saved.then(Utc::now);
        info!(persistent = self.persistent, "Signed in");
        Ok(())
    }

    /// Sign out. Safe to call when already signed out.
    pub fn logout(&mut self) {
        let was_signed_in = self.token.take().is_some();
        self.stored_at = None;

        if self.persistent {
            if let Err(e) = self.storage.clear() {
                self.degrade("clear", &e);
            }
        }

        if was_signed_in {
            info!("Signed out");
        }
    }

    fn degrade(&mut self, op: &str, error: &StorageError) {
        warn!(
            op,
            storage = %self.storage.describe(),
            error = %error,
            "Token slot unavailable, keeping session in memory only"
        );
        self.persistent = false;
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token itself
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.persistent)
            .field("storage", &self.storage.describe())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;
    use crate::auth::storage::{FileStorage, MemoryStorage, SlotRecord};

    /// Slot whose every operation fails, counting how often it was touched.
    #[derive(Clone, Default)]
    struct BrokenStorage {
        calls: Rc<Cell<usize>>,
    }

    impl BrokenStorage {
        fn fail(&self) -> StorageError {
            self.calls.set(self.calls.get() + 1);
            StorageError::io(
                "/unwritable/token.json",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            )
        }
    }

    impl TokenStorage for BrokenStorage {
        fn load(&self) -> Result<Option<SlotRecord>, StorageError> {
            Err(self.fail())
        }
        fn save(&self, _token: &str) -> Result<(), StorageError> {
            Err(self.fail())
        }
        fn clear(&self) -> Result<(), StorageError> {
            Err(self.fail())
        }
        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    #[test]
    fn test_starts_anonymous_with_empty_slot() {
        let session = SessionStore::open(MemoryStorage::new());
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert!(session.is_persistent());
    }

    #[test]
    fn test_login_then_authenticated() {
        let storage = MemoryStorage::new();
        let mut session = SessionStore::open(storage.clone());
        session.login("abc123").unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("abc123"));
        assert_eq!(storage.peek(), Some("abc123".to_string()));
        assert!(session.stored_at().is_some());
    }

    #[test]
    fn test_logout_then_anonymous() {
        let storage = MemoryStorage::new();
        let mut session = SessionStore::open(storage.clone());
        session.login("abc123").unwrap();
        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut session = SessionStore::open(MemoryStorage::new());
        session.logout();
        assert_eq!(session.token(), None);
        session.logout();
        assert_eq!(session.token(), None);
        assert!(session.is_persistent());
    }

    #[test]
    fn test_empty_token_rejected() {
        let storage = MemoryStorage::new();
        let mut session = SessionStore::open(storage.clone());
        assert_eq!(session.login(""), Err(SessionError::EmptyToken));
        assert!(!session.is_authenticated());
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn test_empty_token_keeps_existing_session() {
        let mut session = SessionStore::open(MemoryStorage::with_token("abc123"));
        assert!(session.login(String::new()).is_err());
        assert_eq!(session.token(), Some("abc123"));
    }

    #[test]
    fn test_restores_token_across_restart() {
        let storage = MemoryStorage::new();
        {
            let mut first = SessionStore::open(storage.clone());
            first.login("abc123").unwrap();
        }
        let second = SessionStore::open(storage);
        assert_eq!(second.token(), Some("abc123"));
        assert!(second.is_authenticated());
    }

    #[test]
    fn test_restores_token_across_restart_from_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut first = SessionStore::open(FileStorage::new(dir.path()));
            first.login("abc123").unwrap();
        }
        let second = SessionStore::open(FileStorage::new(dir.path()));
        assert_eq!(second.token(), Some("abc123"));
    }

    #[test]
    fn test_logout_survives_restart() {
        let storage = MemoryStorage::with_token("abc123");
        let mut first = SessionStore::open(storage.clone());
        first.logout();
        let second = SessionStore::open(storage);
        assert!(!second.is_authenticated());
    }

    #[test]
    fn test_empty_persisted_token_is_anonymous() {
        let storage = MemoryStorage::with_token("");
        let session = SessionStore::open(storage);
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_malformed_slot_is_repaired_by_login() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "{").unwrap();

        let mut session = SessionStore::open(storage);
        assert!(!session.is_authenticated());
        assert!(session.is_persistent());

        session.login("abc123").unwrap();
        assert!(session.is_authenticated());

        let reopened = SessionStore::open(FileStorage::new(dir.path()));
        assert!(reopened.is_persistent());
        assert_eq!(reopened.token(), Some("abc123"));
    }

    #[test]
    fn test_malformed_slot_is_removed_by_logout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "not json").unwrap();

        let mut session = SessionStore::open(storage.clone());
        session.logout();
        assert!(session.is_persistent());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_stored_at_only_when_saved() {
        let mut session = SessionStore::open(BrokenStorage::default());
        session.login("abc123").unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.stored_at(), None);
    }

    #[test]
    fn test_broken_storage_never_surfaces() {
        let storage = BrokenStorage::default();
        let calls = storage.calls.clone();

        let mut session = SessionStore::open(storage);
        assert!(!session.is_persistent());
        assert_eq!(calls.get(), 1);

        session.login("abc123").unwrap();
        assert!(session.is_authenticated());
        session.logout();
        assert!(!session.is_authenticated());

        // Once degraded, the slot is left alone
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_debug_hides_token() {
        let session = SessionStore::open(MemoryStorage::with_token("s3cr3t"));
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("authenticated: true"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Login(String),
        Logout,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-zA-Z0-9._-]{0,16}".prop_map(Op::Login),
            Just(Op::Logout),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn authenticated_iff_token_present(ops in proptest::collection::vec(op_strategy(), 0..24)) {
            let storage = MemoryStorage::new();
            let mut session = SessionStore::open(storage.clone());
            for op in ops {
                match op {
                    Op::Login(token) => { let _ = session.login(token); }
                    Op::Logout => session.logout(),
                }
                prop_assert_eq!(session.is_authenticated(), session.token().is_some());
                prop_assert_eq!(session.token().map(str::to_string), storage.peek());
            }
        }

        #[test]
        fn login_with_any_non_empty_token(token in "[^\\x00]{1,64}") {
            let mut session = SessionStore::open(MemoryStorage::new());
            session.login(token.clone()).unwrap();
            prop_assert!(session.is_authenticated());
            prop_assert_eq!(session.token(), Some(token.as_str()));
        }
    }
}
