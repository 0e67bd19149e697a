//! Process-wide holder for the bearer credential.
//!
//! Exactly one credential is held at a time. It is obtained and refreshed
//! by whatever signs the operator in; this crate only reads it and forwards
//! it with every backend request.

use std::sync::{Arc, LazyLock, RwLock};

static GLOBAL: LazyLock<Arc<SessionStore>> = LazyLock::new(|| Arc::new(SessionStore::new()));

#[derive(Debug, Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared store used by the binary.
    pub fn global() -> Arc<SessionStore> {
        Arc::clone(&GLOBAL)
    }

    pub fn get(&self) -> Option<String> {
        // A poisoned lock still holds a complete value.
        let guard = self.token.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Stores `token`, replacing any previous one. Blank tokens clear the
    /// session.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.trim().to_string()).filter(|t| !t.is_empty());
    }

    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}
