mod auth;
mod dashboard;
mod profile;

pub use auth::{handle_login, handle_logout, handle_register};
pub use dashboard::Dashboard;
pub use profile::{ProfileEditor, MIN_PASSWORD_LEN};
