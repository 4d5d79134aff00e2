//! Authorized HTTP access to the task API.
//!
//! Every request carries the stored access token as a bearer credential. A
//! 401 triggers at most one refresh followed by one retry of the identical
//! request; a second 401 is surfaced as [`ClientError::Auth`]. Concurrent
//! refreshes are coalesced behind a single in-flight future so two requests
//! failing together never race their token writes.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use crate::config::ApiConfig;
use crate::errors::{response::error_from_response, ClientError, ClientResult};
use crate::models::{RefreshForm, RefreshResponse};
use super::token_store::{TokenStore, ACCESS_TOKEN, REFRESH_TOKEN};

pub mod endpoints {
    use crate::models::TaskId;

    pub const LOGIN: &str = "/api/auth/login/";
    pub const REGISTER: &str = "/api/auth/register/";
    pub const TOKEN_REFRESH: &str = "/api/auth/token/refresh/";
    pub const PROFILE: &str = "/api/auth/profile/";
    pub const TASKS: &str = "/api/tasks/";

    pub fn task(id: TaskId) -> String {
        format!("{}{}/", TASKS, id)
    }
}

type PendingRefresh = Shared<BoxFuture<'static, Option<String>>>;

/// One logical request. The body is serialized up front so a retry sends
/// exactly the same bytes.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: Method::DELETE, path: path.into(), body: None }
    }

    pub fn post<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> ClientResult<Self> {
        Self::with_body(Method::POST, path, body)
    }

    pub fn put<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> ClientResult<Self> {
        Self::with_body(Method::PUT, path, body)
    }

    fn with_body<B: Serialize + ?Sized>(method: Method, path: impl Into<String>, body: &B) -> ClientResult<Self> {
        Ok(Self {
            method,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// A response read to the end. The body is buffered inside the request
/// timeout, so a server that stalls mid-body cannot hang the caller.
struct Reply {
    status: StatusCode,
    body: Bytes,
}

impl Reply {
    async fn read(response: reqwest::Response) -> ClientResult<Self> {
        let status = response.status();
        let body = response.bytes().await?;
        Ok(Self { status, body })
    }

    fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    fn into_result(self) -> ClientResult<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(error_from_response(self.status, &self.body))
        }
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    request_timeout: Duration,
    refresh_timeout: Duration,
    pending_refresh: Mutex<Option<PendingRefresh>>,
}

/// Cheap to clone; clones share the HTTP pool, the token store and the
/// pending refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
    cancel: CancellationToken,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, tokens: TokenStore) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("taskflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                tokens,
                request_timeout: config.request_timeout(),
                refresh_timeout: config.refresh_timeout(),
                pending_refresh: Mutex::new(None),
            }),
            cancel: CancellationToken::new(),
        })
    }

    /// A handle whose operations abort with [`ClientError::Cancelled`] once
    /// `cancel` fires. Used to tie in-flight calls to the lifetime of a view.
    pub fn scoped(&self, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel,
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Sends an authorized request and decodes the successful body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        self.cancellable(self.inner.execute_authorized(&request))
            .await?
            .json()
    }

    /// For calls whose success carries no useful body, such as DELETE.
    pub async fn send_empty(&self, request: ApiRequest) -> ClientResult<()> {
        self.cancellable(self.inner.execute_authorized(&request)).await.map(drop)
    }

    /// Sends without credentials and without the refresh-and-retry. Used by
    /// login and registration.
    pub async fn public_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        self.cancellable(self.inner.dispatch(&request, None, Uuid::new_v4()))
            .await?
            .into_result()?
            .json()
    }

    /// Exchanges the stored refresh token for a new access token. `None` means
    /// the session can no longer be renewed and the caller should treat the
    /// user as logged out.
    pub async fn refresh_access_token(&self) -> Option<String> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            token = self.inner.refresh_access_token() => token,
        }
    }

    async fn cancellable<T>(&self, operation: impl Future<Output = ClientResult<T>>) -> ClientResult<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = operation => result,
        }
    }
}

impl Inner {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute_authorized(self: &Arc<Self>, request: &ApiRequest) -> ClientResult<Reply> {
        let request_id = Uuid::new_v4();
        let mut token = self.tokens.access_token();
        let mut retried = false;

        loop {
            let reply = self.dispatch(request, token.as_deref(), request_id).await?;
            let status = reply.status;
            let failure = match reply.into_result() {
                Ok(reply) => return Ok(reply),
                Err(failure) => failure,
            };
            if status != StatusCode::UNAUTHORIZED || retried {
                tracing::debug!("Request {} failed with {}: {}", request_id, status, failure);
                return Err(failure);
            }

            retried = true;
            tracing::debug!("Request {} got 401, attempting token refresh", request_id);
            match self.recover_token(token.as_deref()).await {
                Some(fresh) => token = Some(fresh),
                None => return Err(failure),
            }
        }
    }

    // Someone else may already have replaced the rejected token while this
    // request was in flight; reuse theirs instead of refreshing again.
    async fn recover_token(self: &Arc<Self>, rejected: Option<&str>) -> Option<String> {
        if let Some(current) = self.tokens.access_token() {
            if Some(current.as_str()) != rejected {
                return Some(current);
            }
        }
        self.refresh_access_token().await
    }

    async fn refresh_access_token(self: &Arc<Self>) -> Option<String> {
        let pending = {
            let mut slot = match self.pending_refresh.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let inner = Arc::clone(self);
                    let refresh = async move {
                        let token = inner.run_refresh().await;
                        inner.clear_pending_refresh();
                        token
                    }
                    .boxed()
                    .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };
        pending.await
    }

    fn clear_pending_refresh(&self) {
        match self.pending_refresh.lock() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    async fn run_refresh(&self) -> Option<String> {
        let Some(refresh) = self.tokens.refresh_token() else {
            tracing::debug!("No refresh token stored, skipping refresh");
            return None;
        };

        let outcome = tokio::time::timeout(self.refresh_timeout, self.exchange_refresh_token(&refresh)).await;

        match outcome {
            Ok(Ok(body)) if !body.access.is_empty() => {
                self.tokens.set(ACCESS_TOKEN, &body.access);
                if let Some(rotated) = body.refresh.as_deref().filter(|r| !r.is_empty()) {
                    self.tokens.set(REFRESH_TOKEN, rotated);
                }
                tracing::info!("Access token refreshed");
                Some(body.access)
            }
            Ok(Ok(_)) => {
                tracing::warn!("Refresh failed: server returned an empty access token");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("Refresh failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("Refresh timed out after {} seconds", self.refresh_timeout.as_secs());
                None
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh: &str) -> ClientResult<RefreshResponse> {
        let response = self
            .http
            .post(self.url(endpoints::TOKEN_REFRESH))
            .json(&RefreshForm { refresh })
            .send()
            .await?;
        Reply::read(response).await?.into_result()?.json()
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        request_id: Uuid,
    ) -> ClientResult<Reply> {
        let mut builder = self.http.request(request.method.clone(), self.url(&request.path));
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            "Request {}: {} {} (authorized: {})",
            request_id,
            request.method,
            request.path,
            token.is_some()
        );

        let exchange = async { Reply::read(builder.send().await?).await };
        match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Request {} timed out: {} {}", request_id, request.method, request.path);
                Err(ClientError::Timeout(self.request_timeout.as_secs()))
            }
        }
    }
}
