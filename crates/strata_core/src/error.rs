//! Error types for store-level operations, plus re-exports of the
//! per-module error enums.

pub use crate::column::ColumnError;
pub use crate::registry::RegistryError;

use thiserror::Error;

/// Errors from [`AttributeStore`](crate::container::AttributeStore)
/// operations. All variants are caller-recoverable; the one fatal
/// condition, a column found shorter than the store's row capacity
/// after growth, is a programming error and panics instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("an attribute named `{name}` already exists")]
    DuplicateAttributeName { name: String },

    #[error("no attribute named `{name}`")]
    UnknownAttribute { name: String },

    #[error("attribute `{name}` holds `{expected}` elements, not `{requested}`")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        requested: &'static str,
    },

    #[error("row {row} is not occupied")]
    RowNotOccupied { row: u32 },

    #[error("row reference to {row} is stale, the row was freed or reused")]
    StaleRowRef { row: u32 },

    #[error(transparent)]
    Column(#[from] ColumnError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
