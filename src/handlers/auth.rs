use crate::errors::ClientResult;
use crate::models::{LoginForm, RegisterForm, UserRecord};
use crate::services::{AuthService, Session};

/// Logs in and persists the resulting session.
pub async fn handle_login(
    auth: &AuthService,
    session: &Session,
    form: LoginForm,
) -> ClientResult<UserRecord> {
    let result = auth.login(&form.username, &form.password).await?;
    session.begin(&result)?;
    Ok(result.user)
}

/// Registers, then signs the new account in.
pub async fn handle_register(
    auth: &AuthService,
    session: &Session,
    form: RegisterForm,
) -> ClientResult<UserRecord> {
    let result = auth.register(&form.username, &form.email, &form.password).await?;
    session.begin(&result)?;
    tracing::info!("Registration successful for user: {}", result.user.name);
    Ok(result.user)
}

pub fn handle_logout(session: &Session) -> ClientResult<()> {
    session.logout()
}
