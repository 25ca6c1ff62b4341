// registry.rs - runtime type registration
//
// Columns are manufactured from a name when the concrete element type
// is only known at run time, e.g. a file importer declaring an
// attribute by its recorded type string.

use crate::boolean::MarkColumn;
use crate::column::{Column, ColumnOps, Element};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("type `{name}` is not registered")]
    UnknownType { name: String },
}

/// Map from a type name to a prototype column it can clone.
///
/// Registration is first-writer-wins: once a name is taken, later
/// registrations under the same name are no-ops. This holds under
/// racing registration from multiple modules and is part of the tested
/// contract, so independently initialized plugins can all register
/// their types without coordinating.
pub struct TypeRegistry {
    prototypes: RwLock<HashMap<String, Box<dyn ColumnOps>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            prototypes: RwLock::new(HashMap::new()),
        }
    }

    /// Register `prototype` under `name`. No-op if `name` is taken.
    pub fn register(&self, name: &str, prototype: Box<dyn ColumnOps>) {
        let mut map = self.prototypes.write().unwrap();
        map.entry(name.to_string()).or_insert(prototype);
    }

    /// Register the column type for `T` under `T::TYPE_NAME`.
    pub fn register_element<T: Element>(&self) {
        self.register(T::TYPE_NAME, Box::new(Column::<T>::new()));
    }

    /// Register the primitive and vector element types plus the packed
    /// marker column.
    pub fn register_builtins(&self) {
        self.register_element::<i8>();
        self.register_element::<i16>();
        self.register_element::<i32>();
        self.register_element::<i64>();
        self.register_element::<u8>();
        self.register_element::<u16>();
        self.register_element::<u32>();
        self.register_element::<u64>();
        self.register_element::<f32>();
        self.register_element::<f64>();
        self.register_element::<glam::Vec2>();
        self.register_element::<glam::Vec3>();
        self.register_element::<glam::Vec4>();
        self.register_element::<glam::DVec2>();
        self.register_element::<glam::DVec3>();
        self.register_element::<glam::DVec4>();
        self.register_element::<glam::IVec2>();
        self.register_element::<glam::IVec3>();
        self.register_element::<glam::IVec4>();
        self.register(crate::boolean::MARK_TYPE_NAME, Box::new(MarkColumn::new()));
    }

    /// Manufacture a new, empty column of the type registered under
    /// `name`. Unknown names are reported and returned as an error the
    /// caller decides how to handle.
    pub fn create(
        &self,
        name: &str,
        rows_per_chunk: usize,
    ) -> Result<Box<dyn ColumnOps>, RegistryError> {
        let map = self.prototypes.read().unwrap();
        match map.get(name) {
            Some(prototype) => Ok(prototype.clone_empty(rows_per_chunk)),
            None => {
                tracing::warn!(type_name = name, "type not registered, cannot create column");
                Err(RegistryError::UnknownType {
                    name: name.to_string(),
                })
            }
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.prototypes.read().unwrap().contains_key(name)
    }

    /// Drop every registered prototype. Safe to call more than once;
    /// later calls observe an empty registry and do nothing.
    pub fn teardown(&self) {
        self.prototypes.write().unwrap().clear();
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide registry, builtins pre-registered.
static GLOBAL: Lazy<TypeRegistry> = Lazy::new(|| {
    let registry = TypeRegistry::new();
    registry.register_builtins();
    registry
});

/// The process-wide default registry.
pub fn global() -> &'static TypeRegistry {
    &GLOBAL
}
