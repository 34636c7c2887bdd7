//! # Local Mirror State
//!
//! In-memory mirror of the user's three image collections plus their profile.
//!
//! - **Saved** and **Loved** mirror per-image boolean flags on the backend;
//!   membership ("is this id in the set?") drives toggle buttons and decides
//!   the direction of a toggle.
//! - **History** lists generated images newest-first.
//!
//! Each [`CollectionSet`] is ordered and unique by id, with an id index so
//! membership checks do not scan the sequence.
//!
//! The mirror is only mutated by the sync engine; the presentation layer reads
//! it through [`crate::client::sync::SyncEngine::mirror`].

mod collection;

pub use collection::CollectionSet;

use crate::shared::image::{ImageRecord, RemoteImage};
use crate::shared::profile::UserProfile;
use std::collections::HashSet;
use std::fmt;

/// One of the three collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Saved,
    Loved,
    History,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Saved,
        CollectionKind::Loved,
        CollectionKind::History,
    ];

    /// Key under which the collection is persisted
    pub fn storage_key(&self) -> &'static str {
        match self {
            CollectionKind::Saved => "savedImages",
            CollectionKind::Loved => "lovedImages",
            CollectionKind::History => "historyImages",
        }
    }

    /// The backend flag backing this collection, if any
    pub fn flag(&self) -> Option<Flag> {
        match self {
            CollectionKind::Saved => Some(Flag::Save),
            CollectionKind::Loved => Some(Flag::Love),
            CollectionKind::History => None,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Saved => write!(f, "saved"),
            CollectionKind::Loved => write!(f, "loved"),
            CollectionKind::History => write!(f, "history"),
        }
    }
}

/// Boolean per-image flag stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Love,
    Save,
}

impl Flag {
    /// Collection mirroring this flag
    pub fn collection(&self) -> CollectionKind {
        match self {
            Flag::Love => CollectionKind::Loved,
            Flag::Save => CollectionKind::Saved,
        }
    }

    /// Last path segment of the flag endpoint
    pub fn endpoint(&self) -> &'static str {
        match self {
            Flag::Love => "love",
            Flag::Save => "save",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Saved, Loved and History collections plus the user profile
#[derive(Debug, Clone, Default)]
pub struct LocalMirror {
    saved: CollectionSet,
    loved: CollectionSet,
    history: CollectionSet,
    profile: UserProfile,
    /// Ids removed from History during this session
    retired: HashSet<String>,
}

impl LocalMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mirror from previously persisted collections
    pub fn from_parts(
        saved: Vec<ImageRecord>,
        loved: Vec<ImageRecord>,
        history: Vec<ImageRecord>,
        profile: UserProfile,
    ) -> Self {
        Self {
            saved: CollectionSet::from_records(saved),
            loved: CollectionSet::from_records(loved),
            history: CollectionSet::from_records(history),
            profile,
            retired: HashSet::new(),
        }
    }

    pub fn set(&self, kind: CollectionKind) -> &CollectionSet {
        match kind {
            CollectionKind::Saved => &self.saved,
            CollectionKind::Loved => &self.loved,
            CollectionKind::History => &self.history,
        }
    }

    fn set_mut(&mut self, kind: CollectionKind) -> &mut CollectionSet {
        match kind {
            CollectionKind::Saved => &mut self.saved,
            CollectionKind::Loved => &mut self.loved,
            CollectionKind::History => &mut self.history,
        }
    }

    /// Insert a record unless its id is already present.
    ///
    /// Saved and Loved append; History prepends. An id removed from History
    /// during this session is not re-added. Returns whether the set changed.
    pub fn add(&mut self, kind: CollectionKind, record: ImageRecord) -> bool {
        match kind {
            CollectionKind::History => {
                if self.retired.contains(&record.id) {
                    return false;
                }
                self.history.push_front(record)
            }
            _ => self.set_mut(kind).push_back(record),
        }
    }

    /// Remove the record with `id`, returning it if it was present
    pub fn remove(&mut self, kind: CollectionKind, id: &str) -> Option<ImageRecord> {
        let removed = self.set_mut(kind).remove(id);
        if kind == CollectionKind::History && removed.is_some() {
            self.retired.insert(id.to_string());
        }
        removed
    }

    pub fn contains(&self, kind: CollectionKind, id: &str) -> bool {
        self.set(kind).contains(id)
    }

    /// Replace a collection with a freshly fetched listing
    pub fn hydrate(&mut self, kind: CollectionKind, records: Vec<RemoteImage>) {
        let records = records.into_iter().map(ImageRecord::from).collect();
        *self.set_mut(kind) = CollectionSet::from_records(records);
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut UserProfile {
        &mut self.profile
    }

    /// Find a record by id in any collection
    pub fn find(&self, id: &str) -> Option<&ImageRecord> {
        CollectionKind::ALL
            .iter()
            .find_map(|kind| self.set(*kind).get(id))
    }

    /// Drop every collection and reset the profile
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
