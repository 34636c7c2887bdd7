//! Image Records
//!
//! An [`ImageRecord`] is the unit held by every collection: one generated
//! image, identified by an opaque string id. Records are immutable once
//! created; the same id refers to the same image in Saved, Loved and History.
//!
//! The backend lists images in snake_case ([`RemoteImage`]); locally they are
//! stored camelCase. [`From<RemoteImage>`] is the only schema mapping.

use serde::{Deserialize, Serialize};

/// A generated image as held in local collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique opaque id, stable across collections
    pub id: String,
    /// Where the image bytes live
    pub image_url: String,
    /// Prompt the image was generated from
    pub prompt: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

impl ImageRecord {
    /// Create a record stamped with the current time
    pub fn new(id: impl Into<String>, image_url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_url: image_url.into(),
            prompt: prompt.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// An image as returned by `GET /api/images`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImage {
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub created_at: String,
}

impl From<RemoteImage> for ImageRecord {
    fn from(remote: RemoteImage) -> Self {
        Self {
            id: remote.id,
            image_url: remote.image_url,
            prompt: remote.prompt,
            created_at: remote.created_at,
        }
    }
}
