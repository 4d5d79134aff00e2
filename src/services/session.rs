use std::sync::{Arc, PoisonError, RwLock};
use crate::errors::ClientResult;
use crate::models::{AuthResponse, UserId, UserRecord};
use super::storage::{get_json, set_json, KeyValueStore};
use super::token_store::{TokenStore, ACCESS_TOKEN};

pub const USER_KEY: &str = "taskManager_user";
pub const TASKS_KEY: &str = "taskManager_tasks";

/// The signed-in user and their tokens, passed explicitly to whatever needs
/// them. Clones share state.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    tokens: TokenStore,
    user: Arc<RwLock<Option<UserRecord>>>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let tokens = TokenStore::new(Arc::clone(&store));
        Self {
            store,
            tokens,
            user: Arc::new(RwLock::new(None)),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Reloads the persisted user. A token with no user behind it is a
    /// half-written session and is discarded.
    pub fn restore(&self) -> ClientResult<Option<UserRecord>> {
        let user = match get_json::<UserRecord>(self.store.as_ref(), USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Discarding unreadable user record: {}", e);
                self.store.remove(USER_KEY)?;
                None
            }
        };

        if user.is_none() && self.tokens.get(ACCESS_TOKEN).is_some() {
            tracing::warn!("Stored access token has no user, clearing tokens");
            self.tokens.clear_all();
        }

        if let Some(user) = &user {
            tracing::debug!("Restored session for user {}", user.id);
        }
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user.clone();
        Ok(user)
    }

    /// Starts a session from a successful login or registration. The user is
    /// written before the tokens so a token never exists without its user.
    pub fn begin(&self, auth: &AuthResponse) -> ClientResult<()> {
        set_json(self.store.as_ref(), USER_KEY, &auth.user)?;
        self.tokens.store_pair(&auth.access, &auth.refresh);
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(auth.user.clone());
        tracing::info!("Session started for user {}", auth.user.id);
        Ok(())
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|user| user.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some() && self.tokens.access_token().is_some()
    }

    /// Replaces the stored user record, e.g. after a profile edit.
    pub fn update_user(&self, user: UserRecord) -> ClientResult<()> {
        set_json(self.store.as_ref(), USER_KEY, &user)?;
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
        Ok(())
    }

    /// Clears both tokens and every persisted blob belonging to the session.
    pub fn logout(&self) -> ClientResult<()> {
        let previous = self.user.write().unwrap_or_else(PoisonError::into_inner).take();
        self.tokens.clear_all();

        // Attempt every removal even when one fails, then report the first failure
        let removed: Vec<_> = [USER_KEY, TASKS_KEY]
            .into_iter()
            .map(|key| {
                self.store
                    .remove(key)
                    .inspect_err(|e| tracing::warn!("Failed to remove {} on logout: {}", key, e))
            })
            .collect();

        match previous {
            Some(user) => tracing::info!("Logged out user {}", user.id),
            None => tracing::debug!("Logout without an active session"),
        }
        removed.into_iter().collect::<Result<(), _>>()?;
        Ok(())
    }
}
