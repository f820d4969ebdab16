//! Process-wide authentication state.
//!
//! `SessionStore` is the only writer of the durable credential. Every
//! transition re-derives the identity and writes storage in the same call,
//! so memory and storage never disagree.

use std::sync::{Arc, Mutex};

use crawldeck_logging::{deck_debug, deck_info, deck_warn};

use crate::token::{self, Identity};

/// Durable storage holding the raw credential under a single key.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, credential: &str);
    fn clear(&self);
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, credential: &str) {
        (**self).save(credential)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// In-memory store; a clone shares the same slot, which lets tests
/// "reload" by opening a new session over the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: impl Into<String>) -> Self {
        let store = Self::new();
        store.save(&credential.into());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn save(&self, credential: &str) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(credential.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

/// Immutable view of the session handed to the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub credential: Option<String>,
    pub identity: Option<Identity>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

pub struct SessionStore<S: CredentialStore> {
    storage: S,
    credential: Option<String>,
    identity: Option<Identity>,
}

impl<S: CredentialStore> SessionStore<S> {
    /// Restores the session from storage, dropping a credential that no
    /// longer decodes.
    pub fn open(storage: S) -> Self {
        let persisted = storage.load();
        let mut store = Self {
            storage,
            credential: None,
            identity: None,
        };
        match persisted {
            Some(token) => {
                deck_debug!("Restoring persisted credential");
                store.apply(Some(token));
            }
            None => store.storage.clear(),
        }
        store
    }

    /// Installs `token`; returns the derived identity, or `None` if the token
    /// was rejected and the session collapsed to logged-out.
    pub fn login(&mut self, token: impl Into<String>) -> Option<&Identity> {
        self.apply(Some(token.into()));
        self.identity.as_ref()
    }

    pub fn logout(&mut self) {
        deck_info!("Session ended");
        self.apply(None);
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            credential: self.credential.clone(),
            identity: self.identity.clone(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn apply(&mut self, token: Option<String>) {
        let identity = token::decode(token.as_deref());
        match (token, identity) {
            (Some(token), Some(identity)) => {
                deck_info!(
                    "Session established for {} (role {})",
                    identity.email,
                    identity.role.as_str()
                );
                self.storage.save(&token);
                self.credential = Some(token);
                self.identity = Some(identity);
            }
            (Some(_), None) => {
                deck_warn!("Discarding invalid or expired credential");
                self.storage.clear();
                self.credential = None;
                self.identity = None;
            }
            (None, _) => {
                self.storage.clear();
                self.credential = None;
                self.identity = None;
            }
        }
    }
}
