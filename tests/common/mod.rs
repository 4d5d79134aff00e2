//! Shared setup for the integration tests: configuration pointing at a
//! wiremock server, pre-seeded stores, and server-side JSON fixtures.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use serde_json::{json, Value};
use taskflow::{
    config::{ApiConfig, Config, LogConfig, StorageConfig, StorageMode},
    services::{storage::set_json, KeyValueStore, MemoryStore},
    models::UserRecord,
    App,
};
use wiremock::{MockServer, ResponseTemplate};

pub fn config_for(server: &MockServer) -> Config {
    config_at(server.uri())
}

pub fn config_at(base_url: String) -> Config {
    Config {
        api: ApiConfig {
            base_url,
            request_timeout_secs: 5,
            refresh_timeout_secs: 5,
        },
        storage: StorageConfig {
            path: PathBuf::from("unused.json"),
            mode: StorageMode::Remote,
        },
        log: LogConfig {
            level: "debug".to_string(),
        },
    }
}

pub fn alice() -> UserRecord {
    UserRecord {
        id: 1,
        name: "alice".to_string(),
        email: "alice@example.com".to_string(),
    }
}

/// A store holding a saved session for alice with the given tokens.
pub fn signed_in_store(access: Option<&str>, refresh: Option<&str>) -> Arc<dyn KeyValueStore> {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    set_json(store.as_ref(), "taskManager_user", &alice()).unwrap();
    if let Some(access) = access {
        store.set("access_token", access).unwrap();
    }
    if let Some(refresh) = refresh {
        store.set("refresh_token", refresh).unwrap();
    }
    store
}

pub fn app_with(server: &MockServer, store: Arc<dyn KeyValueStore>) -> App {
    App::with_store(&config_for(server), store).unwrap()
}

pub fn task_json(id: i64, title: &str, owner: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "priority": "medium",
        "status": "todo",
        "due_date": null,
        "created_at": "2024-06-01T09:00:00Z",
        "updated_at": "2024-06-01T09:00:00Z",
        "user": owner
    })
}

pub fn login_json(access: &str, refresh: &str) -> Value {
    json!({
        "user": { "id": 1, "username": "alice", "email": "alice@example.com" },
        "access": access,
        "refresh": refresh
    })
}

pub fn token_expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid"
    }))
}
