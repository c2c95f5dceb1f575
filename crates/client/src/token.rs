//! In-memory store for the bearer credential.
//!
//! The access token is short-lived and exists only in process memory; it is
//! set on successful login or refresh and cleared on logout or a failed
//! refresh. Nothing is ever written to durable storage, so a fresh process
//! always starts unauthenticated.
//!
//! The store is an explicit, injectable handle rather than process-global
//! state so independent sessions (and tests) cannot cross-contaminate.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};

/// Shared handle to the current bearer credential.
///
/// Clones share the same underlying slot. At most one credential is held at
/// a time; setting replaces the previous one.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<SecretString>>>,
}

impl TokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held credential.
    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(SecretString::from(token.into()));
    }

    /// The held credential, if any.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The held credential as a plain string, for header construction.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.get().map(|t| t.expose_secret().to_string())
    }

    /// Drop the held credential.
    pub fn clear(&self) {
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Whether a credential is currently held.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("token", &self.is_set().then_some("[REDACTED]"))
            .finish()
    }
}
