use crate::errors::{ClientError, ClientResult};
use crate::models::{PasswordChangeForm, ProfileForm, UserRecord};
use crate::services::{AuthService, Session};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Edits the signed-in user's profile. Name and email changes are kept in
/// local storage only.
pub struct ProfileEditor {
    auth: AuthService,
    session: Session,
}

impl ProfileEditor {
    pub fn new(auth: AuthService, session: Session) -> Self {
        Self { auth, session }
    }

    pub fn user(&self) -> ClientResult<UserRecord> {
        self.session
            .current_user()
            .ok_or_else(|| ClientError::Auth("Not authenticated".into()))
    }

    pub fn update_profile(&self, form: ProfileForm) -> ClientResult<UserRecord> {
        let mut user = self.user()?;

        let name = form.name.trim();
        if name.is_empty() {
            return Err(ClientError::invalid_field("name", "Name is required"));
        }
        let email = form.email.trim();
        if !is_plausible_email(email) {
            return Err(ClientError::invalid_field("email", "Enter a valid email address"));
        }

        user.name = name.to_string();
        user.email = email.to_string();
        self.session.update_user(user.clone())?;
        tracing::info!("Profile updated for user {}", user.id);
        Ok(user)
    }

    /// Replaces the locally stored record with the server's.
    pub async fn refresh_profile(&self) -> ClientResult<UserRecord> {
        let user = self.auth.fetch_profile().await?;
        self.session.update_user(user.clone())?;
        Ok(user)
    }

    /// Checks a password change request. The API exposes no password
    /// endpoint, so a valid request is not sent anywhere.
    pub fn validate_password_change(form: &PasswordChangeForm) -> ClientResult<()> {
        if form.current_password.is_empty() {
            return Err(ClientError::invalid_field("current_password", "Current password is required"));
        }
        if form.new_password != form.confirm_password {
            return Err(ClientError::invalid_field("confirm_password", "New passwords do not match"));
        }
        if form.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::invalid_field(
                "new_password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
