//! # Sync Engine
//!
//! Keeps the [`LocalMirror`] consistent with the remote collection store.
//!
//! ## Optimistic toggles
//!
//! Loving or saving an image is applied locally first so the UI reflects the
//! new state immediately, then confirmed with the backend:
//!
//! 1. Add or remove it locally and persist.
//! 2. `PUT /api/images/{id}/love|save` with the target state.
//! 3. On success keep the local state and notify.
//! 4. On failure restore the last membership the backend confirmed and
//!    notify with the backend's message, or a generic one.
//!
//! Each mutation carries a sequence number per `(flag, id)`; a response that
//! is no longer the latest for its key is dropped (see [`sequence`]).
//!
//! ## Best-effort operations
//!
//! Removing from a collection and removing from History (which cascades to
//! Saved and Loved, then deletes the image) are applied locally and never
//! rolled back. Remote failures are logged only.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use artline::client::{ApiClient, Config, Notifier, SyncEngine};
//! use artline::client::state::{Flag, LocalMirror};
//! use artline::client::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example(record: artline::shared::ImageRecord) {
//! let (notifier, mut toasts) = Notifier::channel();
//! let engine = SyncEngine::new(
//!     ApiClient::new(Config::new()),
//!     LocalMirror::new(),
//!     Arc::new(MemoryStore::new()),
//!     notifier,
//! );
//!
//! engine.toggle(Flag::Love, &record).await;
//! while let Ok(toast) = toasts.try_recv() {
//!     println!("{}", toast);
//! }
//! # }
//! ```

pub mod sequence;

use crate::client::api::ImageBackend;
use crate::client::notify::{Notification, Notifier};
use crate::client::state::{CollectionKind, Flag, LocalMirror};
use crate::client::storage::{self, KeyValueStore};
use crate::shared::api::ImageFilter;
use crate::shared::error::{ApiError, ClientError, SharedError, UNEXPECTED_FORMAT_MESSAGE};
use crate::shared::image::ImageRecord;
use crate::shared::profile::{ProfileUpdate, UserProfile};
use sequence::{SequenceTracker, Settlement};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use uuid::Uuid;

/// How an optimistic toggle settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Backend confirmed; local state kept
    Confirmed,
    /// Backend failed; local state restored
    RolledBack(ApiError),
    /// A newer mutation of the same flag was issued; response ignored
    Superseded,
}

/// Where a generated record's id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Assigned by the backend
    Remote,
    /// Backend omitted the id; a local UUID was used and cannot be
    /// correlated with any later remote id
    LocalFallback,
}

/// A newly generated image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRecord {
    pub record: ImageRecord,
    pub id_source: IdSource,
    /// `false` when the backend returned an id already in History or removed
    /// from it earlier; the record was not added.
    pub appended: bool,
}

/// Remote results of a History removal; the local side always succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    /// Unsave result, if the image was saved
    pub saved: Option<Result<(), ApiError>>,
    /// Unlove result, if the image was loved
    pub loved: Option<Result<(), ApiError>>,
    /// Result of deleting the image resource
    pub deleted: Result<(), ApiError>,
}

/// Notification copy for a flag
struct FlagCopy {
    added: (&'static str, &'static str),
    removed: (&'static str, &'static str),
    failed: &'static str,
}

const LOVE_COPY: FlagCopy = FlagCopy {
    added: ("Added to favorites", "Image added to your favorites"),
    removed: ("Removed from favorites", "Image removed from your favorites"),
    failed: "Failed to update favorite status",
};

const SAVE_COPY: FlagCopy = FlagCopy {
    added: ("Added to collection", "Image added to your collection"),
    removed: ("Removed from collection", "Image removed from your collection"),
    failed: "Failed to update saved status",
};

fn copy_for(flag: Flag) -> &'static FlagCopy {
    match flag {
        Flag::Love => &LOVE_COPY,
        Flag::Save => &SAVE_COPY,
    }
}

/// Text shown when generation fails
fn generation_error_message(error: &ApiError) -> String {
    match error {
        ApiError::Transport { .. } => {
            "Network error. Please check your internet connection and try again.".to_string()
        }
        ApiError::Terminal { status: Some(500), .. } => {
            "Server error. The image generation service might be temporarily unavailable. Please try again later."
                .to_string()
        }
        ApiError::MalformedResponse { .. } => UNEXPECTED_FORMAT_MESSAGE.to_string(),
        _ => error.user_message("Failed to generate image. Please try again later."),
    }
}

/// Optimistic sync between the local mirror and the backend
pub struct SyncEngine<B> {
    backend: B,
    mirror: RwLock<LocalMirror>,
    store: Arc<dyn KeyValueStore>,
    sequences: SequenceTracker,
    notifier: Notifier,
}

impl<B: ImageBackend> SyncEngine<B> {
    pub fn new(
        backend: B,
        mirror: LocalMirror,
        store: Arc<dyn KeyValueStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            backend,
            mirror: RwLock::new(mirror),
            store,
            sequences: SequenceTracker::new(),
            notifier,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read access for rendering
    pub async fn mirror(&self) -> RwLockReadGuard<'_, LocalMirror> {
        self.mirror.read().await
    }

    pub async fn contains(&self, kind: CollectionKind, id: &str) -> bool {
        self.mirror.read().await.contains(kind, id)
    }

    /// Snapshot of one collection, in display order
    pub async fn records(&self, kind: CollectionKind) -> Vec<ImageRecord> {
        self.mirror.read().await.set(kind).records().to_vec()
    }

    async fn persist(&self, mirror: &LocalMirror, kind: CollectionKind) {
        if let Err(e) = storage::save_collection(self.store.as_ref(), mirror, kind).await {
            tracing::warn!(collection = %kind, error = %e, "failed to persist collection");
        }
    }

    fn apply(mirror: &mut LocalMirror, kind: CollectionKind, record: &ImageRecord, present: bool) {
        if present {
            mirror.add(kind, record.clone());
        } else {
            mirror.remove(kind, &record.id);
        }
    }

    /// Flip the flag based on current membership
    pub async fn toggle(&self, flag: Flag, record: &ImageRecord) -> ToggleOutcome {
        let target = !self.contains(flag.collection(), &record.id).await;
        self.toggle_flag(flag, record, target).await
    }

    /// Optimistically set `flag` on `record` to `target`, rolling back on failure
    pub async fn toggle_flag(&self, flag: Flag, record: &ImageRecord, target: bool) -> ToggleOutcome {
        let kind = flag.collection();

        // Optimistic step
        let seq = {
            let mut mirror = self.mirror.write().await;
            let present = mirror.contains(kind, &record.id);
            let seq = self.sequences.issue(flag, &record.id, present).await;
            Self::apply(&mut mirror, kind, record, target);
            self.persist(&mirror, kind).await;
            seq
        };
        tracing::debug!(id = %record.id, %flag, target, seq, "optimistic update applied");

        let result = self.backend.set_flag(&record.id, flag, target).await;
        let accepted = result.as_ref().ok().map(|_| target);

        // Settle and roll back under one guard so no newer request can be
        // issued in between
        let mut mirror = self.mirror.write().await;
        let confirmed = match self.sequences.settle(flag, &record.id, seq, accepted).await {
            Settlement::Latest { confirmed } => confirmed,
            Settlement::Stale => {
                tracing::debug!(id = %record.id, %flag, seq, "response superseded by newer request");
                return ToggleOutcome::Superseded;
            }
        };

        let copy = copy_for(flag);
        match result {
            Ok(()) => {
                drop(mirror);
                let (title, description) = if target { copy.added } else { copy.removed };
                self.notifier.notify(Notification::success(title, description));
                ToggleOutcome::Confirmed
            }
            Err(error) => {
                Self::apply(&mut mirror, kind, record, confirmed);
                self.persist(&mirror, kind).await;
                drop(mirror);
                tracing::warn!(id = %record.id, %flag, target, confirmed, %error, "flag update failed, rolled back");
                self.notifier
                    .notify(Notification::error(error.user_message(copy.failed)));
                ToggleOutcome::RolledBack(error)
            }
        }
    }

    /// Local removal plus remote unflag, without rollback
    async fn unflag_best_effort(&self, flag: Flag, id: &str) -> Result<(), ApiError> {
        let kind = flag.collection();
        let seq = {
            let mut mirror = self.mirror.write().await;
            let seq = self.sequences.issue(flag, id, mirror.contains(kind, id)).await;
            mirror.remove(kind, id);
            self.persist(&mirror, kind).await;
            seq
        };

        let result = self.backend.set_flag(id, flag, false).await;
        {
            let _mirror = self.mirror.write().await;
            let accepted = result.as_ref().ok().map(|_| false);
            self.sequences.settle(flag, id, seq, accepted).await;
        }

        if let Err(error) = &result {
            tracing::warn!(%id, %flag, %error, "best-effort unflag failed; local removal kept");
        }
        result
    }

    /// Remove an image from Saved or Loved (best effort).
    ///
    /// History is not flag-backed; use [`Self::remove_from_history`] for it.
    pub async fn remove_from_collection(&self, kind: CollectionKind, id: &str) -> Result<(), ApiError> {
        let Some(flag) = kind.flag() else {
            tracing::warn!(%id, "remove_from_collection called for history");
            return Ok(());
        };

        let result = self.unflag_best_effort(flag, id).await;
        let description = match flag {
            Flag::Love => "Image removed from your favorites",
            Flag::Save => "Image removed from your collection",
        };
        self.notifier.notify(Notification::success("Removed", description));
        result
    }

    /// Remove from History, cascading to Saved and Loved, then delete the image
    pub async fn remove_from_history(&self, id: &str) -> CascadeReport {
        let (in_saved, in_loved) = {
            let mut mirror = self.mirror.write().await;
            mirror.remove(CollectionKind::History, id);
            self.persist(&mirror, CollectionKind::History).await;
            (
                mirror.contains(CollectionKind::Saved, id),
                mirror.contains(CollectionKind::Loved, id),
            )
        };

        let saved = match in_saved {
            true => Some(self.unflag_best_effort(Flag::Save, id).await),
            false => None,
        };
        let loved = match in_loved {
            true => Some(self.unflag_best_effort(Flag::Love, id).await),
            false => None,
        };

        let deleted = self.backend.delete_image(id).await;
        if let Err(error) = &deleted {
            tracing::warn!(%id, %error, "remote image delete failed");
        }

        self.notifier
            .notify(Notification::success("Removed", "Image removed from your history"));

        CascadeReport { saved, loved, deleted }
    }

    /// Generate an image and put it at the front of History
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedRecord, ClientError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.notifier.notify(Notification::error("Please enter a prompt"));
            return Err(SharedError::validation("prompt", "Please enter a prompt").into());
        }

        let generated = match self.backend.generate_image(prompt).await {
            Ok(generated) => generated,
            Err(error) => {
                tracing::warn!(%error, "image generation failed");
                self.notifier
                    .notify(Notification::error(generation_error_message(&error)));
                return Err(error.into());
            }
        };

        let (id, id_source) = match generated.image_id {
            Some(id) => (id, IdSource::Remote),
            None => {
                let id = Uuid::new_v4().to_string();
                tracing::warn!(
                    %id,
                    image_url = %generated.image_url,
                    "backend returned no image id; using local fallback id"
                );
                (id, IdSource::LocalFallback)
            }
        };

        let record = ImageRecord::new(id, generated.image_url, prompt);
        let appended = {
            let mut mirror = self.mirror.write().await;
            let appended = mirror.add(CollectionKind::History, record.clone());
            if appended {
                self.persist(&mirror, CollectionKind::History).await;
            }
            appended
        };
        if !appended {
            tracing::warn!(
                id = %record.id,
                "backend returned an id already known to history; not added"
            );
        }

        self.notifier
            .notify(Notification::success("Success", "Image generated successfully!"));
        Ok(GeneratedRecord {
            record,
            id_source,
            appended,
        })
    }

    /// Replace one collection with the backend's listing.
    ///
    /// On failure the collection is left as it was.
    pub async fn refresh(&self, kind: CollectionKind) -> Result<usize, ApiError> {
        let filter = match kind {
            CollectionKind::Saved => ImageFilter::Saved,
            CollectionKind::Loved => ImageFilter::Loved,
            CollectionKind::History => ImageFilter::All,
        };

        match self.backend.list_images(filter).await {
            Ok(images) => {
                let count = images.len();
                let mut mirror = self.mirror.write().await;
                mirror.hydrate(kind, images);
                self.persist(&mirror, kind).await;
                tracing::debug!(collection = %kind, count, "collection hydrated");
                Ok(count)
            }
            Err(error) => {
                tracing::error!(collection = %kind, %error, "failed to fetch collection");
                Err(error)
            }
        }
    }

    /// Refresh Loved, Saved and History; each independently
    pub async fn refresh_all(&self) {
        for kind in [CollectionKind::Loved, CollectionKind::Saved, CollectionKind::History] {
            let _ = self.refresh(kind).await;
        }
    }

    pub async fn profile(&self) -> UserProfile {
        self.mirror.read().await.profile().clone()
    }

    /// Replace the profile and persist it
    pub async fn set_profile(&self, profile: UserProfile) {
        let mut mirror = self.mirror.write().await;
        *mirror.profile_mut() = profile;
        if let Err(e) = storage::save_profile(self.store.as_ref(), mirror.profile()).await {
            tracing::warn!(error = %e, "failed to persist profile");
        }
    }

    /// Merge a partial update; persists only when something changed
    pub async fn merge_profile(&self, update: &ProfileUpdate) -> bool {
        let mut mirror = self.mirror.write().await;
        let changed = mirror.profile_mut().merge(update);
        if changed {
            if let Err(e) = storage::save_profile(self.store.as_ref(), mirror.profile()).await {
                tracing::warn!(error = %e, "failed to persist profile");
            }
        }
        changed
    }
}
