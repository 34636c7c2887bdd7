//! Image API Client
//!
//! Async client for the image backend. Every request goes through the same
//! pipeline:
//!
//! 1. The request is attempted under the configured [`RetryPolicy`]; only
//!    failures before a response arrives are retried.
//! 2. A non-2xx response becomes [`ApiError::Terminal`] with the body's
//!    `message` when there is one.
//! 3. A body that is not JSON becomes [`ApiError::MalformedResponse`].
//! 4. The JSON envelope is converted into its typed payload via [`Envelope`].
//!
//! The sync engine talks to the backend through the [`ImageBackend`] trait so
//! it can be driven by a scripted backend in tests.

use crate::client::config::Config;
use crate::client::retry::RetryPolicy;
use crate::client::state::Flag;
use crate::shared::api::{
    AckResponse, AuthResponse, AuthSession, Envelope, GenerateRequest, GenerateResponse,
    GeneratedImage, ImageFilter, ImageListResponse, LoginRequest, LoveRequest, PasswordRequest,
    ProfileResponse, ResetPasswordConfirmRequest, ResetPasswordRequest, SaveRequest, SignupRequest,
};
use crate::shared::error::ApiError;
use crate::shared::image::RemoteImage;
use crate::shared::profile::{ProfileUpdate, UserProfile};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use std::future::Future;

/// Remote collection store as seen by the sync engine
pub trait ImageBackend: Send + Sync {
    /// Set the loved/saved flag of an image
    fn set_flag(
        &self,
        id: &str,
        flag: Flag,
        value: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// List images, optionally filtered by flag
    fn list_images(
        &self,
        filter: ImageFilter,
    ) -> impl Future<Output = Result<Vec<RemoteImage>, ApiError>> + Send;

    /// Delete the image resource itself
    fn delete_image(&self, id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Generate a new image from a prompt
    fn generate_image(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<GeneratedImage, ApiError>> + Send;
}

/// Body of an error response; only the message matters
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// REST client for the image backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Config,
    client: Client,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: Config) -> Self {
        let retry = config.retry_policy();
        tracing::debug!(server_url = config.server_url(), "api client initialized");
        Self {
            config,
            client: Client::new(),
            retry,
        }
    }

    /// Override the retry policy taken from the configuration
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Underlying HTTP client, shared with image downloads
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.config.set_token(token);
    }

    /// `/api/images/{id}[/{action}]` with the id as a single escaped segment
    fn image_url(&self, id: &str, action: Option<&str>) -> Result<Url, ApiError> {
        let invalid = || ApiError::terminal(None, Some("Invalid server URL".to_string()));
        let mut url = Url::parse(self.config.server_url()).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty().extend(["api", "images", id]);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.config
            .get_token()
            .map(|token| format!("Bearer {}", token))
            .ok_or(ApiError::NotAuthenticated)
    }

    /// Send a request built by `build` and decode its envelope
    async fn execute<E, F>(&self, label: &str, build: F) -> Result<E::Payload, ApiError>
    where
        E: Envelope,
        F: Fn() -> RequestBuilder,
    {
        let response = self
            .retry
            .run(label, || build().send())
            .await
            .map_err(|exhausted| {
                ApiError::transport(exhausted.attempts, exhausted.last_error.to_string())
            })?;

        Self::read_envelope::<E>(label, response).await
    }

    async fn read_envelope<E: Envelope>(label: &str, response: Response) -> Result<E::Payload, ApiError> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let is_json = content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"));

        if !status.is_success() {
            let body = if is_json {
                response.json::<ErrorBody>().await.unwrap_or_default()
            } else {
                ErrorBody::default()
            };
            let message = body.message.unwrap_or_else(|| {
                format!(
                    "HTTP error {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )
            });
            tracing::debug!(request = label, status = status.as_u16(), %message, "request failed");
            return Err(ApiError::terminal(Some(status.as_u16()), Some(message)));
        }

        if !is_json {
            tracing::warn!(request = label, ?content_type, "non-JSON response");
            return Err(ApiError::malformed(content_type));
        }

        let envelope: E = response.json().await.map_err(|e| {
            tracing::warn!(request = label, error = %e, "failed to decode response body");
            ApiError::malformed(content_type.clone())
        })?;
        envelope.into_result()
    }

    /// Log in with email and password; the token is kept for later calls
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let url = self.config.api_url("/api/auth/login");
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = self
            .execute::<AuthResponse, _>("POST /api/auth/login", || {
                self.client.post(&url).json(&request)
            })
            .await?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    /// Create an account; the token is kept for later calls
    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let url = self.config.api_url("/api/auth/signup");
        let request = SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = self
            .execute::<AuthResponse, _>("POST /api/auth/signup", || {
                self.client.post(&url).json(&request)
            })
            .await?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        let url = self.config.api_url("/api/user/profile");
        let auth = self.bearer()?;
        self.execute::<ProfileResponse, _>("GET /api/user/profile", || {
            self.client.get(&url).header("Authorization", &auth)
        })
        .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let url = self.config.api_url("/api/user/profile");
        let auth = self.bearer()?;
        self.execute::<AckResponse, _>("PUT /api/user/profile", || {
            self.client.put(&url).header("Authorization", &auth).json(update)
        })
        .await
    }

    pub async fn update_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        let url = self.config.api_url("/api/user/password");
        let auth = self.bearer()?;
        let request = PasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        self.execute::<AckResponse, _>("PUT /api/user/password", || {
            self.client.put(&url).header("Authorization", &auth).json(&request)
        })
        .await
    }

    /// Ask the backend to email reset instructions; no token required
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let url = self.config.api_url("/api/auth/reset-password");
        let request = ResetPasswordRequest {
            email: email.to_string(),
        };
        self.execute::<AckResponse, _>("POST /api/auth/reset-password", || {
            self.client.post(&url).json(&request)
        })
        .await
    }

    /// Set a new password using the token from a reset email
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let url = self.config.api_url("/api/auth/reset-password-confirm");
        let request = ResetPasswordConfirmRequest {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.execute::<AckResponse, _>("POST /api/auth/reset-password-confirm", || {
            self.client.post(&url).json(&request)
        })
        .await
    }

    pub async fn delete_account(&self) -> Result<(), ApiError> {
        let url = self.config.api_url("/api/user/account");
        let auth = self.bearer()?;
        self.execute::<AckResponse, _>("DELETE /api/user/account", || {
            self.client.delete(&url).header("Authorization", &auth)
        })
        .await
    }
}

impl ImageBackend for ApiClient {
    async fn set_flag(&self, id: &str, flag: Flag, value: bool) -> Result<(), ApiError> {
        let auth = self.bearer()?;
        let url = self.image_url(id, Some(flag.endpoint()))?;
        let label = format!("PUT {}", url.path());

        match flag {
            Flag::Love => {
                let body = LoveRequest { is_loved: value };
                self.execute::<AckResponse, _>(&label, || {
                    self.client.put(url.clone()).header("Authorization", &auth).json(&body)
                })
                .await
            }
            Flag::Save => {
                let body = SaveRequest { is_saved: value };
                self.execute::<AckResponse, _>(&label, || {
                    self.client.put(url.clone()).header("Authorization", &auth).json(&body)
                })
                .await
            }
        }
    }

    async fn list_images(&self, filter: ImageFilter) -> Result<Vec<RemoteImage>, ApiError> {
        let url = self.config.api_url(filter.path());
        let auth = self.bearer()?;
        let label = format!("GET {}", filter.path());
        self.execute::<ImageListResponse, _>(&label, || {
            self.client.get(&url).header("Authorization", &auth)
        })
        .await
    }

    async fn delete_image(&self, id: &str) -> Result<(), ApiError> {
        let auth = self.bearer()?;
        let url = self.image_url(id, None)?;
        let label = format!("DELETE {}", url.path());
        self.execute::<AckResponse, _>(&label, || {
            self.client.delete(url.clone()).header("Authorization", &auth)
        })
        .await
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ApiError> {
        let url = self.config.api_url("/api/images/generate");
        let auth = self.bearer()?;
        let request = GenerateRequest {
            prompt: prompt.to_string(),
        };
        self.execute::<GenerateResponse, _>("POST /api/images/generate", || {
            self.client.post(&url).header("Authorization", &auth).json(&request)
        })
        .await
    }
}
