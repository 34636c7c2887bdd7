//! REST Wire Types
//!
//! Request and response bodies for the image backend. Every response shares
//! the same envelope (`success` plus an optional `message`); the
//! [`Envelope`] trait turns each one into a typed `Result` so callers never
//! inspect `success` by hand.
//!
//! # Endpoints
//!
//! | Method | Path                      | Request            | Payload              |
//! |--------|---------------------------|--------------------|----------------------|
//! | PUT    | `/api/images/{id}/love`   | [`LoveRequest`]    | `()`                 |
//! | PUT    | `/api/images/{id}/save`   | [`SaveRequest`]    | `()`                 |
//! | GET    | `/api/images[?filter=]`   | -                  | `Vec<RemoteImage>`   |
//! | DELETE | `/api/images/{id}`        | -                  | `()`                 |
//! | POST   | `/api/images/generate`    | [`GenerateRequest`]| [`GeneratedImage`]   |
//! | POST   | `/api/auth/login`         | [`LoginRequest`]   | [`AuthSession`]      |
//! | POST   | `/api/auth/signup`        | [`SignupRequest`]  | [`AuthSession`]      |
//! | POST   | `/api/auth/reset-password` | [`ResetPasswordRequest`] | `()`          |
//! | POST   | `/api/auth/reset-password-confirm` | [`ResetPasswordConfirmRequest`] | `()` |
//! | GET    | `/api/user/profile`       | -                  | [`UserProfile`]      |
//! | PUT    | `/api/user/profile`       | `ProfileUpdate`    | `()`                 |
//! | PUT    | `/api/user/password`      | [`PasswordRequest`]| `()`                 |
//! | DELETE | `/api/user/account`       | -                  | `()`                 |

use crate::shared::error::ApiError;
use crate::shared::image::RemoteImage;
use crate::shared::profile::{Role, UserProfile};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A response body that reports success or failure in-band
pub trait Envelope: DeserializeOwned {
    /// Typed payload of a successful response
    type Payload;

    /// Convert into the payload, or a terminal error carrying the backend message
    fn into_result(self) -> Result<Self::Payload, ApiError>;
}

/// Body of `PUT /api/images/{id}/love`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoveRequest {
    pub is_loved: bool,
}

/// Body of `PUT /api/images/{id}/save`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub is_saved: bool,
}

/// Response carrying nothing but the outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope for AckResponse {
    type Payload = ();

    fn into_result(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::terminal(None, self.message))
        }
    }
}

/// Listing filter for `GET /api/images`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// Every image the user has generated (history)
    All,
    Loved,
    Saved,
}

impl ImageFilter {
    /// Path and query for the listing endpoint
    pub fn path(&self) -> &'static str {
        match self {
            ImageFilter::All => "/api/images",
            ImageFilter::Loved => "/api/images?filter=loved",
            ImageFilter::Saved => "/api/images?filter=saved",
        }
    }
}

/// Response of `GET /api/images`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub images: Vec<RemoteImage>,
}

impl Envelope for ImageListResponse {
    type Payload = Vec<RemoteImage>;

    fn into_result(self) -> Result<Vec<RemoteImage>, ApiError> {
        if self.success {
            Ok(self.images)
        } else {
            Err(ApiError::terminal(None, self.message))
        }
    }
}

/// Body of `POST /api/images/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// Response of `POST /api/images/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
}

/// A successfully generated image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub image_url: String,
    /// Backend id; absent when the backend did not assign one
    pub image_id: Option<String>,
}

impl Envelope for GenerateResponse {
    type Payload = GeneratedImage;

    fn into_result(self) -> Result<GeneratedImage, ApiError> {
        if !self.success {
            return Err(ApiError::terminal(None, self.message));
        }
        match self.image_url {
            Some(image_url) if !image_url.is_empty() => Ok(GeneratedImage {
                image_url,
                image_id: self.image_id.filter(|id| !id.is_empty()),
            }),
            _ => Err(ApiError::terminal(
                None,
                Some("No image URL returned from the server".to_string()),
            )),
        }
    }
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User as serialized by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl From<RemoteUser> for UserProfile {
    fn from(user: RemoteUser) -> Self {
        let mut profile = UserProfile {
            name: user.name,
            email: user.email,
            role: user.role,
            ..UserProfile::default()
        };
        if let Some(avatar_url) = user.avatar_url.filter(|url| !url.is_empty()) {
            profile.avatar_url = avatar_url;
        }
        profile
    }
}

/// Response of the login and signup endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<RemoteUser>,
}

/// An authenticated session handed back by the backend
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub profile: Option<UserProfile>,
}

impl Envelope for AuthResponse {
    type Payload = AuthSession;

    fn into_result(self) -> Result<AuthSession, ApiError> {
        match (self.success, self.token) {
            (true, Some(token)) if !token.is_empty() => Ok(AuthSession {
                token,
                profile: self.user.map(UserProfile::from),
            }),
            (true, _) => Err(ApiError::terminal(
                None,
                Some("No token returned from the server".to_string()),
            )),
            (false, _) => Err(ApiError::terminal(None, self.message)),
        }
    }
}

/// Response of `GET /api/user/profile`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<RemoteUser>,
}

impl Envelope for ProfileResponse {
    type Payload = UserProfile;

    fn into_result(self) -> Result<UserProfile, ApiError> {
        match (self.success, self.user) {
            (true, Some(user)) => Ok(user.into()),
            (true, None) => Err(ApiError::terminal(None, Some("No user in response".to_string()))),
            (false, _) => Err(ApiError::terminal(None, self.message)),
        }
    }
}

/// Body of `PUT /api/user/password`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Body of `POST /api/auth/reset-password`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Body of `POST /api/auth/reset-password-confirm`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordConfirmRequest {
    pub token: String,
    pub new_password: String,
}
