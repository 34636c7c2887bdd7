//! # Session Lifecycle
//!
//! A [`Session`] owns everything tied to one signed-in user: the API client
//! carrying the bearer token, the persisted store, and the [`SyncEngine`]
//! holding the local mirror.
//!
//! - `open` restores the token and mirror from the store. Without a token
//!   there is no engine and image operations report `NotAuthenticated`.
//! - `login` / `signup` authenticate and build the engine.
//! - `logout` drops the engine and wipes every persisted key.
//! - Password reset works without a session: request instructions by email,
//!   then confirm with the emailed token.

use crate::client::api::ApiClient;
use crate::client::config::Config;
use crate::client::download;
use crate::client::notify::{Notification, Notifier};
use crate::client::share::{self, ShareOutcome, ShareTarget};
use crate::client::storage::{self, KeyValueStore};
use crate::client::sync::SyncEngine;
use crate::shared::api::AuthSession;
use crate::shared::error::{ApiError, ClientError, SharedError};
use crate::shared::image::ImageRecord;
use crate::shared::profile::{ProfileUpdate, UserProfile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Shortest password accepted by a reset
pub const MIN_PASSWORD_LEN: usize = 8;

pub struct Session {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    notifier: Notifier,
    engine: Option<SyncEngine<ApiClient>>,
}

impl Session {
    /// Open a session, restoring any persisted token and collections
    pub async fn open(config: Config, store: Arc<dyn KeyValueStore>) -> (Self, UnboundedReceiver<Notification>) {
        Self::with_client(ApiClient::new(config), store).await
    }

    /// Open a session around an already configured client
    pub async fn with_client(mut api: ApiClient, store: Arc<dyn KeyValueStore>) -> (Self, UnboundedReceiver<Notification>) {
        let (notifier, rx) = Notifier::channel();

        if let Some(token) = storage::load_token(store.as_ref()).await {
            api.set_token(Some(token));
        }

        let mut session = Self {
            api,
            store,
            notifier,
            engine: None,
        };
        if session.api.config().get_token().is_some() {
            session.start_engine().await;
            tracing::info!("session restored from local state");
        }
        (session, rx)
    }

    async fn start_engine(&mut self) {
        let mirror = storage::load_mirror(self.store.as_ref()).await;
        self.engine = Some(SyncEngine::new(
            self.api.clone(),
            mirror,
            Arc::clone(&self.store),
            self.notifier.clone(),
        ));
    }

    pub fn is_authenticated(&self) -> bool {
        self.engine.is_some()
    }

    /// The sync engine, if signed in
    pub fn engine(&self) -> Result<&SyncEngine<ApiClient>, ApiError> {
        self.engine.as_ref().ok_or(ApiError::NotAuthenticated)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    async fn begin(&mut self, auth: AuthSession) {
        if let Err(e) = storage::save_token(self.store.as_ref(), &auth.token).await {
            tracing::warn!(error = %e, "failed to persist token");
        }
        self.start_engine().await;
        if let (Some(profile), Some(engine)) = (auth.profile, &self.engine) {
            engine.set_profile(profile).await;
        }
        tracing::info!("session started");
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ApiError> {
        match self.api.login(email, password).await {
            Ok(auth) => {
                self.begin(auth).await;
                self.notifier
                    .notify(Notification::success("Success", "Logged in successfully"));
                Ok(())
            }
            Err(error) => {
                self.notifier
                    .notify(Notification::error(error.user_message("Login failed")));
                Err(error)
            }
        }
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        match self.api.signup(name, email, password).await {
            Ok(auth) => {
                self.begin(auth).await;
                self.notifier
                    .notify(Notification::success("Success", "Account created successfully"));
                Ok(())
            }
            Err(error) => {
                self.notifier
                    .notify(Notification::error(error.user_message("Signup failed")));
                Err(error)
            }
        }
    }

    /// Tear down the session and wipe local state
    pub async fn logout(&mut self) -> Result<(), SharedError> {
        self.api.set_token(None);
        self.engine = None;
        storage::wipe(self.store.as_ref()).await?;
        tracing::info!("session ended");
        Ok(())
    }

    /// Delete the account remotely, then tear down like `logout`
    pub async fn delete_account(&mut self) -> Result<(), ApiError> {
        if let Err(error) = self.api.delete_account().await {
            self.notifier
                .notify(Notification::error(error.user_message("Failed to delete account")));
            return Err(error);
        }
        if let Err(e) = self.logout().await {
            tracing::warn!(error = %e, "failed to wipe local state after account deletion");
        }
        self.notifier.notify(Notification::success(
            "Account deleted",
            "Your account has been permanently deleted",
        ));
        Ok(())
    }

    /// Fetch the profile from the backend into the mirror
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let engine = self.engine()?;
        let profile = self.api.get_profile().await?;
        engine.set_profile(profile.clone()).await;
        Ok(profile)
    }

    /// Push a profile change; the mirror is updated once the backend accepts it.
    ///
    /// Returns whether the local profile changed.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<bool, ApiError> {
        let engine = self.engine()?;
        if let Err(error) = self.api.update_profile(update).await {
            self.notifier
                .notify(Notification::error(error.user_message("Failed to update profile")));
            return Err(error);
        }
        let changed = engine.merge_profile(update).await;
        self.notifier
            .notify(Notification::success("Success", "Profile updated successfully"));
        Ok(changed)
    }

    pub async fn update_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        self.engine()?;
        match self.api.update_password(current, new).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::success("Success", "Password updated successfully"));
                Ok(())
            }
            Err(error) => {
                self.notifier
                    .notify(Notification::error(error.user_message("Failed to update password")));
                Err(error)
            }
        }
    }

    /// Email reset instructions for `email`
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ClientError> {
        let email = email.trim();
        if email.is_empty() {
            self.notifier.notify(Notification::error("Please enter your email address"));
            return Err(SharedError::validation("email", "Please enter your email address").into());
        }

        match self.api.request_password_reset(email).await {
            Ok(()) => {
                self.notifier.notify(Notification::success(
                    "Success",
                    "Password reset instructions have been sent to your email",
                ));
                Ok(())
            }
            Err(error) => {
                self.notifier.notify(Notification::error(
                    error.user_message("Failed to request password reset"),
                ));
                Err(error.into())
            }
        }
    }

    /// Set a new password with the token from a reset email
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<(), ClientError> {
        let rejection = if token.trim().is_empty() {
            Some(("token", "Invalid or missing reset token. Please request a new password reset link."))
        } else if new_password.is_empty() {
            Some(("new_password", "Please enter a new password"))
        } else if new_password.chars().count() < MIN_PASSWORD_LEN {
            Some(("new_password", "Password must be at least 8 characters long"))
        } else {
            None
        };
        if let Some((field, message)) = rejection {
            self.notifier.notify(Notification::error(message));
            return Err(SharedError::validation(field, message).into());
        }

        match self.api.confirm_password_reset(token.trim(), new_password).await {
            Ok(()) => {
                self.notifier.notify(Notification::success(
                    "Success",
                    "Your password has been reset successfully",
                ));
                Ok(())
            }
            Err(error) => {
                self.notifier
                    .notify(Notification::error(error.user_message("Failed to reset password")));
                Err(error.into())
            }
        }
    }

    /// Share an image through `target`, copying its link as a fallback
    pub fn share(&self, target: &dyn ShareTarget, record: &ImageRecord) -> ShareOutcome {
        share::share_and_notify(target, record, &self.notifier)
    }

    /// Download an image into `dir`
    pub async fn download(&self, image_url: &str, dir: &Path) -> Option<PathBuf> {
        download::download_and_notify(self.api.http(), image_url, dir, &self.notifier).await
    }
}
