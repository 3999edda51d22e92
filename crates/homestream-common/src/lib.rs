//! Homestream-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across homestream:
//!
//! - **Typed IDs**: Newtype wrappers for folder, media and collection ids
//! - **Core Types**: Enums for media kinds and image kinds
//! - **Path Utilities**: Video file detection by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use homestream_common::{MediaId, MediaKind, Error, Result};
//! use homestream_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let id = MediaId::from(157336);
//! assert_eq!(id.to_string(), "157336");
//!
//! let kind = MediaKind::Movie;
//! assert_eq!(kind.to_string(), "movie");
//!
//! assert!(is_video_file(Path::new("movie.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("item"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
