use serde::Deserialize;
use super::user::UserRecord;

/// Token material plus identity, as returned by the login endpoint.
#[derive(Deserialize, Clone)]
pub struct AuthResponse {
    pub user: UserRecord,
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Registration either signs the user in directly or only echoes the created account.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RegisterResponse {
    Authenticated(AuthResponse),
    Created(UserRecord),
}

#[derive(Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    // Present only when the server rotates refresh tokens
    #[serde(default)]
    pub refresh: Option<String>,
}
