use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// The signed-in user as the client knows it. Persisted as a JSON blob and
/// not revalidated against the server after login.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(alias = "username")]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl UserRecord {
    /// Initials shown in place of an avatar, e.g. "Alice Smith" -> "AS".
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}
