use std::sync::Arc;
use super::storage::KeyValueStore;

pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Bearer token slots over the shared key-value store.
///
/// Storage failures never reach callers: a failed read reads as absent and a
/// failed write keeps the previous value. Both are logged. Expiry is not
/// tracked here; it is discovered when the server answers 401.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        match self.store.get(name) {
            Ok(value) => value.filter(|token| !token.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read {} from storage: {}", name, e);
                None
            }
        }
    }

    pub fn set(&self, name: &str, value: &str) {
        if let Err(e) = self.store.set(name, value) {
            tracing::warn!("Failed to store {}: {}", name, e);
        }
    }

    pub fn clear(&self, name: &str) {
        if let Err(e) = self.store.remove(name) {
            tracing::warn!("Failed to clear {}: {}", name, e);
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN)
    }

    pub fn store_pair(&self, access: &str, refresh: &str) {
        self.set(ACCESS_TOKEN, access);
        self.set(REFRESH_TOKEN, refresh);
    }

    pub fn clear_all(&self) {
        self.clear(ACCESS_TOKEN);
        self.clear(REFRESH_TOKEN);
    }
}
