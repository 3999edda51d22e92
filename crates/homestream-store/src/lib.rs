//! Homestream-Store: the persistent catalog.
//!
//! Records are YAML documents laid out by provider id, so every record has
//! exactly one deterministic location and re-writing it is idempotent:
//!
//! ```text
//! <data>/libraries/<folder-id>/<item-id>/metadata.yml
//! <data>/libraries/<folder-id>/<show-id>/<season>/metadata.yml
//! <data>/libraries/<folder-id>/<show-id>/<season>/<episode>/metadata.yml
//! <data>/collections/<collection-id>/metadata.yml
//! ```
//!
//! # Modules
//!
//! - `models` - Catalog record types
//! - `layout` - Directory layout of the catalog
//! - `store` - Read/write operations
//!
//! # Example
//!
//! ```no_run
//! use homestream_common::FolderId;
//! use homestream_store::CatalogStore;
//!
//! let store = CatalogStore::new("/var/lib/homestream");
//! for entry in store.list(FolderId::from(1)) {
//!     println!("{} {}", entry.record.id(), entry.record.title());
//! }
//! ```

pub mod layout;
pub mod models;
pub mod store;

pub use layout::CatalogLayout;
pub use models::*;
pub use store::CatalogStore;
