use crate::errors::ClientResult;
use crate::models::{AuthResponse, LoginForm, RegisterForm, RegisterResponse, UserRecord};
use super::api_client::{endpoints, ApiClient, ApiRequest};

/// Credential exchanges against the auth endpoints. Nothing here writes the
/// session; persisting the result is the caller's job.
///
/// Calls are not deduplicated: submitting twice hits the server twice.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AuthResponse> {
        tracing::info!("Login attempt for user: {}", username);

        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .client
            .public_json(ApiRequest::post(endpoints::LOGIN, &form)?)
            .await
            .inspect_err(|e| tracing::warn!("Login failed for user {}: {}", username, e))?;

        tracing::info!("Logged in as {} (id {})", auth.user.name, auth.user.id);
        Ok(auth)
    }

    /// Creates the account and returns a signed-in result. When the server
    /// only echoes the created user, the same credentials are used to log in.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<AuthResponse> {
        tracing::info!("Registering user: {}", username);

        let form = RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let created: RegisterResponse = self
            .client
            .public_json(ApiRequest::post(endpoints::REGISTER, &form)?)
            .await
            .inspect_err(|e| tracing::warn!("Registration failed for user {}: {}", username, e))?;

        match created {
            RegisterResponse::Authenticated(auth) => Ok(auth),
            RegisterResponse::Created(user) => {
                tracing::debug!("Account {} created without tokens, logging in", user.id);
                self.login(username, password).await
            }
        }
    }

    /// The server's view of the signed-in user.
    pub async fn fetch_profile(&self) -> ClientResult<UserRecord> {
        self.client.send_json(ApiRequest::get(endpoints::PROFILE)).await
    }
}
