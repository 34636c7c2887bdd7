//! Shared Module
//!
//! Types that do not depend on the client runtime: the image and profile
//! records, REST wire bodies, error types and configuration.
//!
//! # Overview
//!
//! Everything here is plain data plus conversions. The sync engine in
//! [`crate::client`] builds on these types; nothing in this module performs I/O
//! except [`config::AppConfig::load`].

/// Image records and their remote representation
pub mod image;

/// User profile
pub mod profile;

/// REST request/response bodies
pub mod api;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

pub use api::{Envelope, GeneratedImage, ImageFilter};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::{ApiError, ClientError, SharedError};
pub use image::{ImageRecord, RemoteImage};
pub use profile::{ProfileUpdate, Role, UserProfile};
