pub mod storage;
pub mod token_store;
pub mod api_client;
pub mod auth;
pub mod session;
pub mod tasks;

pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use token_store::TokenStore;
pub use api_client::{ApiClient, ApiRequest};
pub use auth::AuthService;
pub use session::Session;
pub use tasks::{LocalTaskRepository, RemoteTaskRepository, TaskRepository};
