//! Artline - Client Library
//!
//! Artline is the client side of an AI image generation app. Users generate
//! images from prompts, and every generated image lands in their History. From
//! there they can love an image (Loved) or save it (Saved).
//!
//! # Overview
//!
//! The client keeps a local mirror of the three collections and updates it
//! optimistically: a love or save shows up immediately, is confirmed with the
//! backend in the background and is rolled back if the backend refuses.
//!
//! # Module Structure
//!
//! - **`shared`** - Plain data shared with the backend
//!   - Image and profile records, REST bodies
//!   - Error types and configuration
//!
//! - **`client`** - Runtime side
//!   - REST client with retry
//!   - Local mirror and its persistence
//!   - Sync engine and session lifecycle
//!
//! # Usage
//!
//! ```rust,no_run
//! use artline::client::storage::{SqliteStore, DATABASE_FILE};
//! use artline::client::{Config, Session};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let store = Arc::new(SqliteStore::open(&config.data_dir().join(DATABASE_FILE)).await?);
//! let (mut session, mut notifications) = Session::open(config, store).await;
//!
//! session.login("ada@example.com", "secret").await?;
//! let engine = session.engine()?;
//! engine.generate("a lighthouse at dusk").await?;
//!
//! while let Ok(notification) = notifications.try_recv() {
//!     println!("{}", notification);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The mirror lives behind a `tokio::sync::RwLock` inside the engine, so
//! toggles on different images may run concurrently. The lock is never held
//! across a network call.
//!
//! # Error Handling
//!
//! - [`shared::error::ApiError`] for remote failures
//! - [`shared::error::SharedError`] for local faults
//! - [`shared::config::ConfigError`] for configuration

/// Shared types and data structures
pub mod shared;

/// Client runtime: API client, local mirror, sync engine
pub mod client;
