// column.rs - chunked typed storage and its type-erased surface

use crate::chunk::Chunk;
use std::any::Any;
use thiserror::Error;

/// Default rows per chunk when no configuration is supplied.
pub const DEFAULT_ROWS_PER_CHUNK: usize = 4096;

/// Errors from direct column access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColumnError {
    #[error("index {index} is outside the allocated capacity {capacity}")]
    OutOfCapacity { index: u32, capacity: u32 },
}

/// Element types storable in a column.
///
/// `TYPE_NAME` is the stable identifier used as the registry key and as
/// the contract between the module defining an attribute and any module
/// locating or re-creating it by name (file importers, serializers).
/// Two modules agreeing on a name must agree on the element type.
pub trait Element: Default + Send + Sync + 'static {
    const TYPE_NAME: &'static str;
}

/// Implement [`Element`] for a type under a stable name.
///
/// # Example
/// ```ignore
/// #[derive(Default, Clone, Copy)]
/// struct Rgba([f32; 4]);
///
/// impl_element!(Rgba, "Rgba");
/// ```
#[macro_export]
macro_rules! impl_element {
    ($ty:ty, $name:expr) => {
        impl $crate::column::Element for $ty {
            const TYPE_NAME: &'static str = $name;
        }
    };
}

impl_element!(i8, "i8");
impl_element!(i16, "i16");
impl_element!(i32, "i32");
impl_element!(i64, "i64");
impl_element!(u8, "u8");
impl_element!(u16, "u16");
impl_element!(u32, "u32");
impl_element!(u64, "u64");
impl_element!(f32, "f32");
impl_element!(f64, "f64");

impl_element!(glam::Vec2, "Vec2f");
impl_element!(glam::Vec3, "Vec3f");
impl_element!(glam::Vec4, "Vec4f");
impl_element!(glam::DVec2, "Vec2d");
impl_element!(glam::DVec3, "Vec3d");
impl_element!(glam::DVec4, "Vec4d");
impl_element!(glam::IVec2, "Vec2i");
impl_element!(glam::IVec3, "Vec3i");
impl_element!(glam::IVec4, "Vec4i");

/// Dynamically growing sequence of chunks of one element type,
/// addressed by a flat row index.
///
/// Growth appends whole chunks and never relocates existing rows, so
/// references handed out for one row stay valid across growth of
/// others. Access past the allocated capacity is an error, not silent
/// growth; growing is driven by the owning store.
pub struct Column<T> {
    rows_per_chunk: usize,
    shift: u32,
    mask: usize,
    chunks: Vec<Chunk<T>>,
}

impl<T: Element> Column<T> {
    pub fn new() -> Self {
        Self::with_rows_per_chunk(DEFAULT_ROWS_PER_CHUNK)
    }

    /// `rows_per_chunk` must be a non-zero power of two.
    pub fn with_rows_per_chunk(rows_per_chunk: usize) -> Self {
        assert!(rows_per_chunk.is_power_of_two() && rows_per_chunk > 0);
        Self {
            rows_per_chunk,
            shift: rows_per_chunk.trailing_zeros(),
            mask: rows_per_chunk - 1,
            chunks: Vec::new(),
        }
    }

    #[inline]
    fn chunk_of(&self, row: u32) -> usize {
        row as usize >> self.shift
    }

    #[inline]
    fn local_of(&self, row: u32) -> usize {
        row as usize & self.mask
    }

    #[inline]
    pub fn rows_per_chunk(&self) -> usize {
        self.rows_per_chunk
    }

    /// Allocated capacity in rows (chunk count times chunk size).
    #[inline]
    pub fn capacity(&self) -> u32 {
        (self.chunks.len() << self.shift) as u32
    }

    pub fn get(&self, row: u32) -> Result<&T, ColumnError> {
        if row >= self.capacity() {
            return Err(ColumnError::OutOfCapacity {
                index: row,
                capacity: self.capacity(),
            });
        }
        Ok(self.chunks[self.chunk_of(row)].get(self.local_of(row)))
    }

    pub fn get_mut(&mut self, row: u32) -> Result<&mut T, ColumnError> {
        if row >= self.capacity() {
            return Err(ColumnError::OutOfCapacity {
                index: row,
                capacity: self.capacity(),
            });
        }
        let (chunk, local) = (self.chunk_of(row), self.local_of(row));
        Ok(self.chunks[chunk].get_mut(local))
    }

    pub fn set(&mut self, row: u32, value: T) -> Result<(), ColumnError> {
        *self.get_mut(row)? = value;
        Ok(())
    }

    /// Unchecked read for proven-safe inner loops.
    ///
    /// # Safety
    /// `row` must be less than `capacity()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, row: u32) -> &T {
        self.chunks
            .get_unchecked(self.chunk_of(row))
            .get_unchecked(self.local_of(row))
    }

    /// Unchecked write access for proven-safe inner loops.
    ///
    /// # Safety
    /// `row` must be less than `capacity()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, row: u32) -> &mut T {
        let (chunk, local) = (self.chunk_of(row), self.local_of(row));
        self.chunks.get_unchecked_mut(chunk).get_unchecked_mut(local)
    }

    /// Append whole chunks until capacity covers `rows`. Never shrinks.
    pub fn grow_to_capacity(&mut self, rows: u32) {
        while self.capacity() < rows {
            self.chunks.push(Chunk::filled(self.rows_per_chunk));
        }
    }

    /// Drop whole trailing chunks while keeping capacity at or above
    /// `rows`. Separate from growth: a column never shrinks on its own.
    pub fn shrink_to_capacity(&mut self, rows: u32) {
        let keep = (rows as usize + self.mask) >> self.shift;
        if keep < self.chunks.len() {
            self.chunks.truncate(keep);
        }
    }

    /// Per-chunk slice views.
    pub fn chunks(&self) -> impl Iterator<Item = &[T]> {
        self.chunks.iter().map(Chunk::as_slice)
    }

    /// Mutable per-chunk slice views. Disjoint-row parallel writes are
    /// expressed as parallel iteration over these slices.
    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.chunks.iter_mut().map(Chunk::as_mut_slice)
    }
}

impl<T: Element> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased column surface: everything the store and the type
/// registry need without knowing the element type.
pub trait ColumnOps: Send + Sync {
    /// Stable identifier of the element type.
    fn type_name(&self) -> &'static str;

    fn rows_per_chunk(&self) -> usize;

    fn capacity(&self) -> u32;

    fn grow_to_capacity(&mut self, rows: u32);

    fn shrink_to_capacity(&mut self, rows: u32);

    /// Manufacture a new, empty column of the same element type.
    fn clone_empty(&self, rows_per_chunk: usize) -> Box<dyn ColumnOps>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Element> ColumnOps for Column<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn rows_per_chunk(&self) -> usize {
        self.rows_per_chunk
    }

    fn capacity(&self) -> u32 {
        Column::capacity(self)
    }

    fn grow_to_capacity(&mut self, rows: u32) {
        Column::grow_to_capacity(self, rows);
    }

    fn shrink_to_capacity(&mut self, rows: u32) {
        Column::shrink_to_capacity(self, rows);
    }

    fn clone_empty(&self, rows_per_chunk: usize) -> Box<dyn ColumnOps> {
        Box::new(Column::<T>::with_rows_per_chunk(rows_per_chunk))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
