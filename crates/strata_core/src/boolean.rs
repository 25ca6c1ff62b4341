// boolean.rs - bit-packed marker column with a deferred clear path

use crate::column::{ColumnError, ColumnOps, DEFAULT_ROWS_PER_CHUNK};
use std::any::Any;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Type name marker columns report through [`ColumnOps`].
pub const MARK_TYPE_NAME: &str = "bool";

const WORD_BITS: usize = u32::BITS as usize;

/// Shards of the pending-clear staging area. Power of two.
const DIRTY_SHARDS: usize = 16;

static NEXT_SHARD: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    // Round-robin shard assignment over every thread that ever stages
    // a dirty clear; a thread keeps its shard for its lifetime.
    static THREAD_SHARD: usize =
        NEXT_SHARD.fetch_add(1, Ordering::Relaxed) & (DIRTY_SHARDS - 1);
}

/// Bit-packed boolean column for marking algorithms.
///
/// Bits live in 32-bit atomic words, so concurrent markers touching
/// the same packed word are safe without external locking. For the
/// hottest path, clearing marks from many worker threads at once,
/// [`set_false_dirty`](Self::set_false_dirty) records the row in a
/// per-thread staging shard instead of touching the shared word; a
/// later [`cleanup`](Self::cleanup) pass applies the staged clears.
/// After cleanup the column state is identical to having called
/// [`set_false`](Self::set_false) on exactly the staged rows.
pub struct MarkColumn {
    rows_per_chunk: usize,
    shift: u32,
    mask: usize,
    chunks: Vec<Box<[AtomicU32]>>,
    pending: [Mutex<Vec<u32>>; DIRTY_SHARDS],
}

impl MarkColumn {
    pub fn new() -> Self {
        Self::with_rows_per_chunk(DEFAULT_ROWS_PER_CHUNK)
    }

    /// `rows_per_chunk` must be a power of two no smaller than one
    /// packed word (32 rows).
    pub fn with_rows_per_chunk(rows_per_chunk: usize) -> Self {
        assert!(rows_per_chunk.is_power_of_two() && rows_per_chunk >= WORD_BITS);
        Self {
            rows_per_chunk,
            shift: rows_per_chunk.trailing_zeros(),
            mask: rows_per_chunk - 1,
            chunks: Vec::new(),
            pending: std::array::from_fn(|_| Mutex::new(Vec::new())),
        }
    }

    #[inline]
    pub fn rows_per_chunk(&self) -> usize {
        self.rows_per_chunk
    }

    /// Allocated capacity in rows.
    #[inline]
    pub fn capacity(&self) -> u32 {
        (self.chunks.len() << self.shift) as u32
    }

    #[inline]
    fn locate(&self, row: u32) -> (usize, usize, u32) {
        let chunk = row as usize >> self.shift;
        let local = row as usize & self.mask;
        (chunk, local / WORD_BITS, 1u32 << (local % WORD_BITS))
    }

    #[inline]
    fn check(&self, row: u32) -> Result<(), ColumnError> {
        if row >= self.capacity() {
            return Err(ColumnError::OutOfCapacity {
                index: row,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    pub fn get(&self, row: u32) -> Result<bool, ColumnError> {
        self.check(row)?;
        let (chunk, word, bit) = self.locate(row);
        Ok(self.chunks[chunk][word].load(Ordering::Relaxed) & bit != 0)
    }

    /// Set or clear the bit for `row` immediately. Safe to call from
    /// several threads at once, including on the same packed word.
    pub fn set(&self, row: u32, value: bool) -> Result<(), ColumnError> {
        self.check(row)?;
        let (chunk, word, bit) = self.locate(row);
        if value {
            self.chunks[chunk][word].fetch_or(bit, Ordering::Relaxed);
        } else {
            self.chunks[chunk][word].fetch_and(!bit, Ordering::Relaxed);
        }
        Ok(())
    }

    pub fn set_true(&self, row: u32) -> Result<(), ColumnError> {
        self.set(row, true)
    }

    /// Immediate clear, equivalent to `set(row, false)`.
    pub fn set_false(&self, row: u32) -> Result<(), ColumnError> {
        self.set(row, false)
    }

    /// Record `row` for a deferred clear instead of touching the shared
    /// packed word. Threads stage into disjoint shards, so many workers
    /// clearing marks at once do not serialize on word updates. The
    /// clear becomes visible only after [`cleanup`](Self::cleanup).
    pub fn set_false_dirty(&self, row: u32) -> Result<(), ColumnError> {
        self.check(row)?;
        THREAD_SHARD.with(|&shard| {
            self.pending[shard].lock().unwrap().push(row);
        });
        Ok(())
    }

    /// Apply every staged clear. Rows staged more than once clear once;
    /// rows whose chunk was dropped by a shrink in the meantime are
    /// discarded.
    pub fn cleanup(&mut self) {
        let capacity = self.capacity();
        for shard in &self.pending {
            let mut staged = shard.lock().unwrap();
            for row in staged.drain(..) {
                if row >= capacity {
                    continue;
                }
                let (chunk, word, bit) = self.locate(row);
                *self.chunks[chunk][word].get_mut() &= !bit;
            }
        }
    }

    /// Set or clear every allocated bit.
    pub fn fill(&mut self, value: bool) {
        let fill = if value { u32::MAX } else { 0 };
        for chunk in &mut self.chunks {
            for word in chunk.iter_mut() {
                *word.get_mut() = fill;
            }
        }
    }

    /// Append whole chunks until capacity covers `rows`. New bits are
    /// clear.
    pub fn grow_to_capacity(&mut self, rows: u32) {
        let words_per_chunk = self.rows_per_chunk / WORD_BITS;
        while self.capacity() < rows {
            let words: Vec<AtomicU32> = (0..words_per_chunk).map(|_| AtomicU32::new(0)).collect();
            self.chunks.push(words.into_boxed_slice());
        }
    }

    pub fn shrink_to_capacity(&mut self, rows: u32) {
        let keep = (rows as usize + self.mask) >> self.shift;
        if keep < self.chunks.len() {
            self.chunks.truncate(keep);
        }
    }
}

impl Default for MarkColumn {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnOps for MarkColumn {
    fn type_name(&self) -> &'static str {
        MARK_TYPE_NAME
    }

    fn rows_per_chunk(&self) -> usize {
        self.rows_per_chunk
    }

    fn capacity(&self) -> u32 {
        MarkColumn::capacity(self)
    }

    fn grow_to_capacity(&mut self, rows: u32) {
        MarkColumn::grow_to_capacity(self, rows);
    }

    fn shrink_to_capacity(&mut self, rows: u32) {
        MarkColumn::shrink_to_capacity(self, rows);
    }

    fn clone_empty(&self, rows_per_chunk: usize) -> Box<dyn ColumnOps> {
        Box::new(MarkColumn::with_rows_per_chunk(rows_per_chunk))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
