//! Authenticated session state, written through to storage on every change.

use std::sync::{Arc, PoisonError, RwLock};

use platformops_core::auth::UserInfo;

use crate::storage::{KeyValueStore, StorageError};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "access_token";

/// Storage key of the JSON-encoded user profile.
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserInfo>,
}

/// Session holder shared by the HTTP client and the views.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<Session>,
}

impl SessionStore {
    /// Restore the session persisted in `storage`.
    ///
    /// An unreadable user profile is dropped (with a warning) rather than
    /// failing startup; the token is kept.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let token = storage.get(TOKEN_KEY)?;
        let user = match storage.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<UserInfo>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable stored user profile");
                    None
                }
            },
            None => None,
        };

        tracing::debug!(authenticated = token.is_some(), "Session loaded");

        Ok(Self {
            storage,
            state: RwLock::new(Session { token, user }),
        })
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .is_some()
    }

    /// Replace the session and persist both token and user.
    ///
    /// When the user cannot be written the stored token is restored, so a
    /// failed call leaves storage and memory as they were.
    pub fn set_session(&self, token: String, user: UserInfo) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&user).map_err(|source| StorageError::Corrupt {
            path: USER_KEY.into(),
            source,
        })?;
        let previous = self.storage.get(TOKEN_KEY)?;
        self.storage.set(TOKEN_KEY, &token)?;
        if let Err(e) = self.storage.set(USER_KEY, &user_json) {
            // Put the old token back so storage still matches memory.
            let restored = match &previous {
                Some(old) => self.storage.set(TOKEN_KEY, old),
                None => self.storage.remove(TOKEN_KEY),
            };
            if let Err(restore) = restored {
                tracing::warn!(error = %restore, "Failed to restore stored token");
            }
            return Err(e);
        }

        tracing::info!(username = %user.username, "Session established");

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Session {
            token: Some(token),
            user: Some(user),
        };
        Ok(())
    }

    /// Forget the session in memory and in storage.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;

        tracing::info!("Session cleared");

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Session::default();
        Ok(())
    }
}
