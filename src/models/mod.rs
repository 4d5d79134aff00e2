mod user;
mod forms;
mod task;
mod auth;
mod stats;

pub use user::{UserId, UserRecord};
pub use forms::{LoginForm, PasswordChangeForm, ProfileForm, RefreshForm, RegisterForm};
pub use task::{Priority, StatusFilter, Task, TaskFields, TaskId, TaskStatus};
pub use auth::{AuthResponse, RefreshResponse, RegisterResponse};
pub use stats::TaskStats;
