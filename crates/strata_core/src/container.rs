// container.rs - the coordinated row/column store

use crate::boolean::MarkColumn;
use crate::column::{Column, ColumnOps, Element};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::registry::TypeRegistry;
use crate::rowset::{RowSet, RowSetIter};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::marker::PhantomData;

/// Typed handle to an attribute, returned by
/// [`AttributeStore::add_attribute`]. Stays valid until the attribute
/// is removed; access through a removed handle is an error.
pub struct AttrHandle<T> {
    slot: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for AttrHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttrHandle<T> {}

impl<T> std::fmt::Debug for AttrHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttrHandle").field("slot", &self.slot).finish()
    }
}

/// Handle to a bit-packed marker attribute.
#[derive(Debug, Clone, Copy)]
pub struct MarkHandle {
    slot: usize,
}

/// Generation-tagged row reference.
///
/// A plain `u32` row index silently reads reused data if held across a
/// remove/insert cycle; a `RowRef` resolved through
/// [`AttributeStore::resolve`] detects that instead. Format mirrors an
/// entity handle: `[32-bit row | 32-bit generation]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RowRef {
    row: u32,
    generation: u32,
}

impl RowRef {
    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.row as u64)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            row: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

struct Slot {
    name: String,
    // None once the attribute is removed; the slot index stays
    // allocated so older handles resolve to an error, not a neighbor.
    column: Option<Box<dyn ColumnOps>>,
}

/// Named, typed columns over one shared row space.
///
/// Rows are created by [`insert_lines`](Self::insert_lines) and freed
/// by [`remove_line`](Self::remove_line); freed rows are reused
/// smallest-index-first before the row range grows. Every column is
/// kept grown to the store's row capacity, so an occupied row has an
/// allocated slot in every column. Removal leaves column contents
/// stale: reading a row that was freed and reused yields whatever was
/// last written there, which is why reused rows count as unspecified
/// until rewritten.
///
/// Structural operations take `&mut self`; element reads and marker
/// operations on existing rows go through `&self` and may run from
/// several threads at once.
pub struct AttributeStore {
    rows_per_chunk: usize,
    slots: Vec<Slot>,
    by_name: HashMap<String, usize>,
    occupied: RowSet,
    free: BinaryHeap<Reverse<u32>>,
    generations: Vec<u32>,
    rows_end: u32,
    capacity: u32,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        assert!(config.rows_per_chunk.is_power_of_two() && config.rows_per_chunk >= 32);
        Self {
            rows_per_chunk: config.rows_per_chunk,
            slots: Vec::new(),
            by_name: HashMap::new(),
            occupied: RowSet::new(),
            free: BinaryHeap::new(),
            generations: Vec::new(),
            rows_end: 0,
            capacity: 0,
        }
    }

    fn ensure_name_free(&self, name: &str) -> Result<(), StoreError> {
        if self.by_name.contains_key(name) {
            return Err(StoreError::DuplicateAttributeName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn push_column(&mut self, name: &str, column: Box<dyn ColumnOps>) -> usize {
        let slot = self.slots.len();
        self.slots.push(Slot {
            name: name.to_string(),
            column: Some(column),
        });
        self.by_name.insert(name.to_string(), slot);
        slot
    }

    /// Add a typed attribute. The new column is back-filled to the
    /// store's current row capacity.
    pub fn add_attribute<T: Element>(&mut self, name: &str) -> Result<AttrHandle<T>, StoreError> {
        self.ensure_name_free(name)?;
        let mut column = Column::<T>::with_rows_per_chunk(self.rows_per_chunk);
        column.grow_to_capacity(self.capacity);
        let slot = self.push_column(name, Box::new(column));
        Ok(AttrHandle {
            slot,
            _marker: PhantomData,
        })
    }

    /// Add a bit-packed marker attribute.
    pub fn add_marker_attribute(&mut self, name: &str) -> Result<MarkHandle, StoreError> {
        self.ensure_name_free(name)?;
        let mut column = MarkColumn::with_rows_per_chunk(self.rows_per_chunk);
        column.grow_to_capacity(self.capacity);
        let slot = self.push_column(name, Box::new(column));
        Ok(MarkHandle { slot })
    }

    /// Add an attribute whose element type is named at run time, e.g.
    /// by a file importer. The column is manufactured by `registry`;
    /// typed access goes through [`attribute`](Self::attribute) once
    /// the caller knows the type.
    pub fn add_registered(
        &mut self,
        registry: &TypeRegistry,
        type_name: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        self.ensure_name_free(name)?;
        let mut column = registry.create(type_name, self.rows_per_chunk)?;
        column.grow_to_capacity(self.capacity);
        self.push_column(name, column);
        Ok(())
    }

    /// Drop the named attribute. Its slot is tombstoned, so stale
    /// handles error rather than alias a later attribute.
    pub fn remove_attribute(&mut self, name: &str) -> Result<(), StoreError> {
        let slot = self
            .by_name
            .remove(name)
            .ok_or_else(|| StoreError::UnknownAttribute {
                name: name.to_string(),
            })?;
        self.slots[slot].column = None;
        Ok(())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Names of the live attributes, in insertion order.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.column.is_some())
            .map(|slot| slot.name.as_str())
            .collect()
    }

    fn live_column(&self, slot: usize) -> Result<(&str, &dyn ColumnOps), StoreError> {
        match self.slots.get(slot) {
            Some(Slot {
                name,
                column: Some(column),
            }) => Ok((name, column.as_ref())),
            Some(Slot { name, column: None }) => Err(StoreError::UnknownAttribute {
                name: name.clone(),
            }),
            None => Err(StoreError::UnknownAttribute {
                name: format!("#{slot}"),
            }),
        }
    }

    fn live_column_mut(&mut self, slot: usize) -> Result<(&str, &mut dyn ColumnOps), StoreError> {
        match self.slots.get_mut(slot) {
            Some(Slot {
                name,
                column: Some(column),
            }) => Ok((name, column.as_mut())),
            Some(Slot { name, column: None }) => Err(StoreError::UnknownAttribute {
                name: name.clone(),
            }),
            None => Err(StoreError::UnknownAttribute {
                name: format!("#{slot}"),
            }),
        }
    }

    /// Look up a typed handle by attribute name.
    pub fn attribute<T: Element>(&self, name: &str) -> Result<AttrHandle<T>, StoreError> {
        let &slot = self
            .by_name
            .get(name)
            .ok_or_else(|| StoreError::UnknownAttribute {
                name: name.to_string(),
            })?;
        let (_, column) = self.live_column(slot)?;
        if column.as_any().downcast_ref::<Column<T>>().is_none() {
            return Err(StoreError::TypeMismatch {
                name: name.to_string(),
                expected: column.type_name(),
                requested: T::TYPE_NAME,
            });
        }
        Ok(AttrHandle {
            slot,
            _marker: PhantomData,
        })
    }

    /// Look up a marker handle by attribute name.
    pub fn marker_attribute(&self, name: &str) -> Result<MarkHandle, StoreError> {
        let &slot = self
            .by_name
            .get(name)
            .ok_or_else(|| StoreError::UnknownAttribute {
                name: name.to_string(),
            })?;
        let (_, column) = self.live_column(slot)?;
        if column.as_any().downcast_ref::<MarkColumn>().is_none() {
            return Err(StoreError::TypeMismatch {
                name: name.to_string(),
                expected: column.type_name(),
                requested: crate::boolean::MARK_TYPE_NAME,
            });
        }
        Ok(MarkHandle { slot })
    }

    pub fn column<T: Element>(&self, handle: AttrHandle<T>) -> Result<&Column<T>, StoreError> {
        let (name, column) = self.live_column(handle.slot)?;
        column
            .as_any()
            .downcast_ref::<Column<T>>()
            .ok_or_else(|| StoreError::TypeMismatch {
                name: name.to_string(),
                expected: column.type_name(),
                requested: T::TYPE_NAME,
            })
    }

    pub fn column_mut<T: Element>(
        &mut self,
        handle: AttrHandle<T>,
    ) -> Result<&mut Column<T>, StoreError> {
        let (name, column) = self.live_column_mut(handle.slot)?;
        let expected = column.type_name();
        let name = name.to_string();
        column
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .ok_or(StoreError::TypeMismatch {
                name,
                expected,
                requested: T::TYPE_NAME,
            })
    }

    pub fn mark_column(&self, handle: MarkHandle) -> Result<&MarkColumn, StoreError> {
        let (name, column) = self.live_column(handle.slot)?;
        column
            .as_any()
            .downcast_ref::<MarkColumn>()
            .ok_or_else(|| StoreError::TypeMismatch {
                name: name.to_string(),
                expected: column.type_name(),
                requested: crate::boolean::MARK_TYPE_NAME,
            })
    }

    pub fn mark_column_mut(&mut self, handle: MarkHandle) -> Result<&mut MarkColumn, StoreError> {
        let (name, column) = self.live_column_mut(handle.slot)?;
        let expected = column.type_name();
        let name = name.to_string();
        column
            .as_any_mut()
            .downcast_mut::<MarkColumn>()
            .ok_or(StoreError::TypeMismatch {
                name,
                expected,
                requested: crate::boolean::MARK_TYPE_NAME,
            })
    }

    #[inline]
    fn ensure_occupied(&self, row: u32) -> Result<(), StoreError> {
        if !self.occupied.contains(row) {
            return Err(StoreError::RowNotOccupied { row });
        }
        Ok(())
    }

    /// Occupancy-checked element read.
    pub fn value<T: Element>(&self, handle: AttrHandle<T>, row: u32) -> Result<&T, StoreError> {
        self.ensure_occupied(row)?;
        Ok(self.column(handle)?.get(row)?)
    }

    /// Occupancy-checked element write.
    pub fn set_value<T: Element>(
        &mut self,
        handle: AttrHandle<T>,
        row: u32,
        value: T,
    ) -> Result<(), StoreError> {
        self.ensure_occupied(row)?;
        self.column_mut(handle)?.set(row, value)?;
        Ok(())
    }

    fn grow_to(&mut self, rows: u32) {
        if rows <= self.capacity {
            return;
        }
        tracing::debug!(from = self.capacity, to = rows, "growing store row capacity");
        self.capacity = rows;
        for slot in &mut self.slots {
            if let Some(column) = slot.column.as_mut() {
                column.grow_to_capacity(rows);
                assert!(
                    column.capacity() >= rows,
                    "column `{}` is shorter than the store row capacity",
                    slot.name
                );
            }
        }
    }

    /// Create `count` logical rows and return their indices.
    ///
    /// Freed rows are reused smallest-index-first; once the free set is
    /// exhausted, every column grows to cover the extended row range
    /// before the new rows are reported occupied. Reused rows carry
    /// whatever was last written in each column until rewritten.
    pub fn insert_lines(&mut self, count: u32) -> Vec<u32> {
        let mut rows = Vec::with_capacity(count as usize);
        while (rows.len() as u32) < count {
            match self.free.pop() {
                Some(Reverse(row)) => rows.push(row),
                None => break,
            }
        }
        let fresh = count - rows.len() as u32;
        if fresh > 0 {
            let new_end = self.rows_end + fresh;
            self.grow_to(new_end);
            rows.extend(self.rows_end..new_end);
            self.rows_end = new_end;
            if self.generations.len() < new_end as usize {
                self.generations.resize(new_end as usize, 0);
            }
        }
        for &row in &rows {
            self.occupied.insert(row);
        }
        rows
    }

    /// Create one logical row.
    pub fn insert_line(&mut self) -> u32 {
        self.insert_lines(1)[0]
    }

    /// Free an occupied row. Column contents at `row` are left stale;
    /// the index becomes reusable and drops out of iteration.
    pub fn remove_line(&mut self, row: u32) -> Result<(), StoreError> {
        if !self.occupied.remove(row) {
            return Err(StoreError::RowNotOccupied { row });
        }
        self.free.push(Reverse(row));
        self.generations[row as usize] = self.generations[row as usize].wrapping_add(1);
        Ok(())
    }

    /// Free every row. Columns and their capacity are kept.
    pub fn clear_rows(&mut self) {
        for generation in &mut self.generations {
            *generation = generation.wrapping_add(1);
        }
        self.occupied.clear();
        self.free.clear();
        self.rows_end = 0;
    }

    /// Number of occupied rows.
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Row capacity every column is grown to.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Occupied fraction of the assigned row range; 1.0 when dense.
    pub fn fragmentation(&self) -> f32 {
        if self.rows_end == 0 {
            1.0
        } else {
            self.occupied.len() as f32 / self.rows_end as f32
        }
    }

    /// First occupied row, or [`end`](Self::end) when the store is
    /// empty.
    pub fn begin(&self) -> u32 {
        self.occupied.next_occupied_from(0).unwrap_or(self.rows_end)
    }

    /// One past the highest assigned row; the iteration sentinel.
    pub fn end(&self) -> u32 {
        self.rows_end
    }

    /// Next occupied row after `row`, or [`end`](Self::end). Holes are
    /// skipped a whole bitmap word at a time.
    pub fn next_after(&self, row: u32) -> u32 {
        self.occupied
            .next_occupied_from(row + 1)
            .unwrap_or(self.rows_end)
    }

    /// Forward iterator over occupied rows in strictly increasing
    /// order.
    pub fn rows(&self) -> RowSetIter<'_> {
        self.occupied.iter()
    }

    /// Generation-tagged reference to an occupied row.
    pub fn row_ref(&self, row: u32) -> Result<RowRef, StoreError> {
        self.ensure_occupied(row)?;
        Ok(RowRef {
            row,
            generation: self.generations[row as usize],
        })
    }

    /// Resolve a [`RowRef`] back to its index, detecting references
    /// that outlived a free or a free-then-reuse of their row.
    pub fn resolve(&self, row_ref: RowRef) -> Result<u32, StoreError> {
        let current = self.generations.get(row_ref.row as usize).copied();
        if !self.occupied.contains(row_ref.row) || current != Some(row_ref.generation) {
            return Err(StoreError::StaleRowRef { row: row_ref.row });
        }
        Ok(row_ref.row)
    }

    /// Optional compaction: release trailing chunks beyond the
    /// assigned row range.
    pub fn shrink_to_fit(&mut self) {
        if self.capacity == self.rows_end {
            return;
        }
        tracing::debug!(from = self.capacity, to = self.rows_end, "shrinking store row capacity");
        self.capacity = self.rows_end;
        for slot in &mut self.slots {
            if let Some(column) = slot.column.as_mut() {
                column.shrink_to_capacity(self.rows_end);
            }
        }
    }
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_store() -> AttributeStore {
        AttributeStore::with_config(StoreConfig { rows_per_chunk: 64 })
    }

    #[test]
    fn insert_returns_previously_free_rows() {
        let mut store = small_store();
        assert!(!store.occupied.contains(0));
        let rows = store.insert_lines(1);
        assert_eq!(rows, vec![0]);
        assert!(store.occupied.contains(0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn smallest_free_index_is_reused_first() {
        let mut store = small_store();
        store.insert_lines(5);
        store.remove_line(3).unwrap();
        store.remove_line(1).unwrap();
        assert_eq!(store.insert_lines(1), vec![1]);
        assert_eq!(store.insert_lines(1), vec![3]);
        // free set exhausted, range extends
        assert_eq!(store.insert_lines(1), vec![5]);
    }

    #[test]
    fn added_columns_are_back_filled() {
        let mut store = small_store();
        store.insert_lines(3);
        let x = store.add_attribute::<i32>("x").unwrap();
        // slots exist for every occupied row without further growth
        for row in 0..3 {
            store.set_value(x, row, row as i32 * 10).unwrap();
        }
        assert_eq!(*store.value(x, 2).unwrap(), 20);
    }

    #[test]
    fn duplicate_names_are_rejected_without_side_effects() {
        let mut store = small_store();
        store.add_attribute::<i32>("x").unwrap();
        assert_eq!(
            store.add_attribute::<f32>("x").err(),
            Some(StoreError::DuplicateAttributeName {
                name: "x".to_string()
            })
        );
        assert_eq!(store.attribute_names(), vec!["x"]);
    }

    #[test]
    fn removed_attribute_errors_by_name_and_by_handle() {
        let mut store = small_store();
        let x = store.add_attribute::<i32>("x").unwrap();
        store.remove_attribute("x").unwrap();
        assert!(!store.has_attribute("x"));
        assert_eq!(
            store.column(x).err(),
            Some(StoreError::UnknownAttribute {
                name: "x".to_string()
            })
        );
        assert!(store.attribute::<i32>("x").is_err());
        assert!(store.remove_attribute("x").is_err());
    }

    #[test]
    fn removed_name_does_not_alias_a_later_attribute() {
        let mut store = small_store();
        let x = store.add_attribute::<i32>("x").unwrap();
        store.remove_attribute("x").unwrap();
        store.add_attribute::<i32>("y").unwrap();
        // the old handle still refers to the tombstoned slot
        assert!(store.column(x).is_err());
    }

    #[test]
    fn type_mismatch_is_detected_on_lookup() {
        let mut store = small_store();
        store.add_attribute::<i32>("x").unwrap();
        assert_eq!(
            store.attribute::<f32>("x").err(),
            Some(StoreError::TypeMismatch {
                name: "x".to_string(),
                expected: "i32",
                requested: "f32",
            })
        );
    }

    #[test]
    fn element_access_requires_an_occupied_row() {
        let mut store = small_store();
        let x = store.add_attribute::<i32>("x").unwrap();
        store.insert_lines(2);
        store.remove_line(1).unwrap();
        assert_eq!(
            store.value(x, 1).err(),
            Some(StoreError::RowNotOccupied { row: 1 })
        );
        assert_eq!(
            store.set_value(x, 7, 0).err(),
            Some(StoreError::RowNotOccupied { row: 7 })
        );
        assert_eq!(
            store.remove_line(1).err(),
            Some(StoreError::RowNotOccupied { row: 1 })
        );
    }

    #[test]
    fn documented_reuse_scenario() {
        let mut store = small_store();
        assert_eq!(store.insert_lines(3), vec![0, 1, 2]);
        let x = store.add_attribute::<i32>("x").unwrap();
        store.set_value(x, 1, 7).unwrap();
        store.remove_line(1).unwrap();
        assert_eq!(store.insert_lines(1), vec![1]);
        // contents at the reused row are unspecified but addressable
        assert!(store.value(x, 1).is_ok());
        store.set_value(x, 1, 8).unwrap();
        assert_eq!(*store.value(x, 1).unwrap(), 8);
    }

    #[test]
    fn iteration_visits_exactly_the_occupied_rows() {
        let mut store = small_store();
        store.insert_lines(10);
        for row in [1, 3, 8] {
            store.remove_line(row).unwrap();
        }
        let visited: Vec<u32> = store.rows().collect();
        assert_eq!(visited, vec![0, 2, 4, 5, 6, 7, 9]);

        // cursor form agrees with the iterator
        let mut cursor = Vec::new();
        let mut i = store.begin();
        while i != store.end() {
            cursor.push(i);
            i = store.next_after(i);
        }
        assert_eq!(cursor, visited);
    }

    #[test]
    fn iteration_skips_sparse_ranges_spanning_chunks() {
        let mut store = small_store();
        store.insert_lines(64 * 5);
        for row in 0..64 * 5 {
            if row != 2 && row != 300 {
                store.remove_line(row).unwrap();
            }
        }
        let visited: Vec<u32> = store.rows().collect();
        assert_eq!(visited, vec![2, 300]);
        assert_eq!(store.begin(), 2);
        assert_eq!(store.next_after(2), 300);
        assert_eq!(store.next_after(300), store.end());
    }

    #[test]
    fn empty_store_iterates_nothing() {
        let store = small_store();
        assert_eq!(store.begin(), store.end());
        assert_eq!(store.rows().count(), 0);
    }

    #[test]
    fn columns_grow_together_on_range_extension() {
        let mut store = small_store();
        let x = store.add_attribute::<i32>("x").unwrap();
        let m = store.add_marker_attribute("seen").unwrap();
        let rows = store.insert_lines(100);
        assert_eq!(rows.len(), 100);
        assert!(store.capacity() >= 100);
        assert!(store.column(x).unwrap().capacity() >= 100);
        assert!(store.mark_column(m).unwrap().capacity() >= 100);
    }

    #[test]
    fn registry_manufactured_attribute_is_typed_later() {
        let registry = TypeRegistry::new();
        registry.register_builtins();
        let mut store = small_store();
        store.insert_lines(4);
        store
            .add_registered(&registry, "Vec3f", "position")
            .unwrap();
        let position = store.attribute::<glam::Vec3>("position").unwrap();
        store
            .set_value(position, 2, glam::Vec3::new(1.0, 2.0, 3.0))
            .unwrap();
        assert_eq!(*store.value(position, 2).unwrap(), glam::Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(
            store.add_registered(&registry, "NoSuchType", "q").err(),
            Some(StoreError::Registry(
                crate::registry::RegistryError::UnknownType {
                    name: "NoSuchType".to_string()
                }
            ))
        );
        // the failed add left no attribute behind
        assert!(!store.has_attribute("q"));
    }

    #[test]
    fn marker_attributes_mark_and_sweep() {
        let mut store = small_store();
        let seen = store.add_marker_attribute("seen").unwrap();
        store.insert_lines(128);
        for row in store.rows().collect::<Vec<_>>() {
            store.mark_column(seen).unwrap().set_true(row).unwrap();
        }
        let marks = store.mark_column(seen).unwrap();
        for row in store.rows() {
            if row % 2 == 0 {
                marks.set_false_dirty(row).unwrap();
            }
        }
        store.mark_column_mut(seen).unwrap().cleanup();
        let marks = store.mark_column(seen).unwrap();
        for row in store.rows() {
            assert_eq!(marks.get(row).unwrap(), row % 2 == 1);
        }
        // name lookup agrees with the handle
        assert!(store.marker_attribute("seen").is_ok());
        assert!(store.marker_attribute("missing").is_err());
    }

    #[test]
    fn stale_row_ref_is_detected_after_free_and_after_reuse() {
        let mut store = small_store();
        store.insert_lines(3);
        let r = store.row_ref(1).unwrap();
        assert_eq!(store.resolve(r).unwrap(), 1);

        store.remove_line(1).unwrap();
        assert_eq!(
            store.resolve(r).err(),
            Some(StoreError::StaleRowRef { row: 1 })
        );

        // reuse gives row 1 a new generation
        assert_eq!(store.insert_lines(1), vec![1]);
        assert_eq!(
            store.resolve(r).err(),
            Some(StoreError::StaleRowRef { row: 1 })
        );
        let fresh = store.row_ref(1).unwrap();
        assert_eq!(store.resolve(fresh).unwrap(), 1);
        assert_ne!(r, fresh);
        assert_eq!(RowRef::from_bits(fresh.to_bits()), fresh);
    }

    #[test]
    fn clear_rows_keeps_columns_and_invalidates_refs() {
        let mut store = small_store();
        let x = store.add_attribute::<i32>("x").unwrap();
        store.insert_lines(10);
        let r = store.row_ref(4).unwrap();
        store.clear_rows();
        assert!(store.is_empty());
        assert_eq!(store.begin(), store.end());
        assert!(store.has_attribute("x"));
        assert!(store.resolve(r).is_err());

        // fresh rows start from 0 again and stay distinguishable
        assert_eq!(store.insert_lines(2), vec![0, 1]);
        assert!(store.resolve(r).is_err());
        store.set_value(x, 0, 5).unwrap();
    }

    #[test]
    fn shrink_to_fit_releases_trailing_chunks() {
        let mut store = small_store();
        let x = store.add_attribute::<i32>("x").unwrap();
        store.insert_lines(64 * 4);
        store.clear_rows();
        store.shrink_to_fit();
        assert_eq!(store.capacity(), 0);
        assert_eq!(store.column(x).unwrap().capacity(), 0);
    }

    #[test]
    fn fragmentation_tracks_holes() {
        let mut store = small_store();
        assert_eq!(store.fragmentation(), 1.0);
        store.insert_lines(8);
        assert_eq!(store.fragmentation(), 1.0);
        for row in 0..4 {
            store.remove_line(row).unwrap();
        }
        assert_eq!(store.fragmentation(), 0.5);
    }

    #[test]
    fn insertion_order_of_names_is_preserved() {
        let mut store = small_store();
        store.add_attribute::<i32>("a").unwrap();
        store.add_attribute::<f32>("b").unwrap();
        store.add_marker_attribute("c").unwrap();
        store.remove_attribute("b").unwrap();
        store.add_attribute::<u8>("d").unwrap();
        assert_eq!(store.attribute_names(), vec!["a", "c", "d"]);
    }
}
