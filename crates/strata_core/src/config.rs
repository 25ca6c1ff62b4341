//! Store configuration

use crate::column::DEFAULT_ROWS_PER_CHUNK;
use serde::{Deserialize, Serialize};

/// Tuning knobs for an attribute store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Rows per storage chunk. Must be a power of two and at least 32
    /// so marker columns can pack whole words per chunk.
    pub rows_per_chunk: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            rows_per_chunk: DEFAULT_ROWS_PER_CHUNK,
        }
    }
}
