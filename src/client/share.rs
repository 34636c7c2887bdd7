//! # Sharing
//!
//! Hands an image link to whatever sharing facility the host offers. If the
//! share sheet is missing or refuses, the link is copied instead and the user
//! is told so.

use crate::client::notify::{Notification, Notifier};
use crate::shared::image::ImageRecord;
use thiserror::Error;

/// Title attached to every shared image
pub const SHARE_TITLE: &str = "AI Generated Image";

/// What gets shared for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    /// The prompt the image was generated from
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_record(record: &ImageRecord) -> Self {
        Self {
            title: SHARE_TITLE.to_string(),
            text: record.prompt.clone(),
            url: record.image_url.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShareError {
    /// The host has no such facility
    #[error("sharing is not available")]
    Unavailable,

    #[error("share failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Host facilities for sharing a link
pub trait ShareTarget {
    /// Open the native share sheet
    fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;

    /// Put the link on the clipboard
    fn copy_link(&self, url: &str) -> Result<(), ShareError>;
}

/// How a share request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    LinkCopied,
    Failed,
}

/// Share `record`, falling back to copying its link
pub fn share_and_notify(target: &dyn ShareTarget, record: &ImageRecord, notifier: &Notifier) -> ShareOutcome {
    let payload = SharePayload::for_record(record);

    match target.share(&payload) {
        Ok(()) => return ShareOutcome::Shared,
        Err(e) => tracing::debug!(id = %record.id, error = %e, "share sheet unavailable, copying link"),
    }

    match target.copy_link(&payload.url) {
        Ok(()) => {
            notifier.notify(Notification::success("Link copied", "Image URL copied to clipboard"));
            ShareOutcome::LinkCopied
        }
        Err(e) => {
            tracing::warn!(id = %record.id, error = %e, "failed to copy image link");
            notifier.notify(Notification::error("Failed to share image"));
            ShareOutcome::Failed
        }
    }
}
