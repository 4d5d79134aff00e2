//! Session and data-access layer for the TaskFlow task manager.
//!
//! The pieces, leaf first: a persistent key-value store ([`services::storage`]),
//! the bearer token slots over it ([`services::TokenStore`]), an HTTP client
//! that attaches and refreshes tokens ([`services::ApiClient`]), the auth and
//! task operations built on that client, the explicit [`services::Session`],
//! and the dashboard/profile controllers in [`handlers`].

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use std::sync::Arc;
use crate::config::{Config, StorageMode};
use crate::errors::ClientResult;
use crate::services::{
    ApiClient, AuthService, FileStore, KeyValueStore, LocalTaskRepository, RemoteTaskRepository,
    Session, TaskRepository,
};

/// Everything a front end needs, wired from one configuration.
#[derive(Clone)]
pub struct App {
    pub session: Session,
    pub client: ApiClient,
    pub auth: AuthService,
    pub tasks: Arc<dyn TaskRepository>,
}

impl App {
    /// Opens the state file named in the configuration and restores any saved session.
    pub fn open(config: &Config) -> ClientResult<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.storage.path)?);
        Self::with_store(config, store)
    }

    pub fn with_store(config: &Config, store: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        let session = Session::new(store);
        session.restore()?;

        let client = ApiClient::new(&config.api, session.tokens().clone())?;
        let auth = AuthService::new(client.clone());
        let tasks: Arc<dyn TaskRepository> = match config.storage.mode {
            StorageMode::Remote => Arc::new(RemoteTaskRepository::new(client.clone())),
            StorageMode::Local => Arc::new(LocalTaskRepository::new(session.clone())),
        };

        Ok(Self {
            session,
            client,
            auth,
            tasks,
        })
    }

    pub fn dashboard(&self) -> handlers::Dashboard {
        handlers::Dashboard::new(Arc::clone(&self.tasks), self.session.clone())
    }

    pub fn profile_editor(&self) -> handlers::ProfileEditor {
        handlers::ProfileEditor::new(self.auth.clone(), self.session.clone())
    }
}
