//! Client Module
//!
//! The client side of the image app: the REST client, the local mirror of the
//! user's collections and the sync engine that keeps the two consistent.
//!
//! # Architecture
//!
//! - **`config`** - Server URL, retry budget and bearer token
//! - **`retry`** - Retry policy for transport failures
//! - **`api`** - REST client and the [`ImageBackend`] seam
//! - **`state`** - Saved, Loved and History collections plus the profile
//! - **`storage`** - Key-value persistence of the mirror (SQLite)
//! - **`notify`** - Notifications surfaced to the user
//! - **`sync`** - Optimistic toggles, cascading delete, generation
//! - **`session`** - Login/logout lifecycle around the engine
//! - **`download`** - Saving images to disk
//! - **`share`** - Sharing image links, with a copy-link fallback
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs        - Module exports and documentation
//! ├── main.rs       - Command line entry point (binary)
//! ├── config.rs     - Configuration management
//! ├── retry.rs      - Retry policy
//! ├── api.rs        - REST client
//! ├── state/        - Local mirror
//! ├── storage.rs    - Persistence
//! ├── notify.rs     - Notifications
//! ├── sync/         - Sync engine and request sequencing
//! ├── session.rs    - Session lifecycle
//! ├── download.rs   - Image download
//! └── share.rs      - Link sharing
//! ```

pub mod api;
pub mod config;
pub mod download;
pub mod notify;
pub mod retry;
pub mod session;
pub mod share;
pub mod state;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use api::{ApiClient, ImageBackend};
pub use config::Config;
pub use notify::{Notification, Notifier};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use session::Session;
pub use sync::{SyncEngine, ToggleOutcome};
