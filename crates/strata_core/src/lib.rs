//! Strata attribute storage
//!
//! Columnar storage for mesh-style data:
//! - named, typed columns sharing one row space
//! - chunked growth, no row ever relocates
//! - O(1) amortized insert/remove with smallest-index slot reuse
//! - hole-skipping row iteration
//! - bit-packed marker columns with a deferred clear path for
//!   concurrent marking
//! - a runtime type registry so importers can declare attributes by
//!   name

pub mod boolean;
pub mod chunk;
pub mod column;
pub mod config;
pub mod container;
pub mod error;
pub mod registry;
pub mod rowset;

pub use glam;

pub use boolean::{MarkColumn, MARK_TYPE_NAME};
pub use column::{Column, ColumnOps, Element, DEFAULT_ROWS_PER_CHUNK};
pub use config::StoreConfig;
pub use container::{AttrHandle, AttributeStore, MarkHandle, RowRef};
pub use error::{ColumnError, RegistryError, StoreError};
pub use registry::TypeRegistry;
pub use rowset::RowSet;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
