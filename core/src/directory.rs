use crate::reflect::{TypeDescriptor, Typed};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

lazy_static::lazy_static! {
    static ref DIRECTORY: Arc<RwLock<TypeDirectory>> = Default::default();
}

/// Resolves type tags to constructible type descriptors.
///
/// Read-only while a call runs; unknown names resolve to nothing and the
/// rehydrator falls back to generic records.
#[derive(Debug, Default, Clone)]
pub struct TypeDirectory {
    types: HashMap<&'static str, &'static TypeDescriptor>,
}

impl TypeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T>(mut self) -> Self
    where
        T: Typed,
    {
        self.register::<T>();
        self
    }

    pub fn register<T>(&mut self)
    where
        T: Typed,
    {
        self.register_descriptor(T::descriptor());
    }

    pub fn register_descriptor(&mut self, descriptor: &'static TypeDescriptor) {
        self.types.insert(descriptor.name, descriptor);
    }

    pub fn unregister<T>(&mut self)
    where
        T: Typed,
    {
        self.types.remove(T::descriptor().name);
    }

    pub fn resolve(&self, name: &str) -> Option<&'static TypeDescriptor> {
        self.types.get(name).copied()
    }

    pub fn is_registered<T>(&self) -> bool
    where
        T: Typed,
    {
        self.types.contains_key(T::descriptor().name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registers type in the process-wide directory used by facade calls.
    pub fn register_global<T>()
    where
        T: Typed,
    {
        DIRECTORY
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register::<T>();
    }

    pub fn unregister_global<T>()
    where
        T: Typed,
    {
        DIRECTORY
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister::<T>();
    }

    /// Copy of the process-wide directory. Calls work on a snapshot so hooks
    /// are free to register types meanwhile.
    pub fn global() -> Self {
        DIRECTORY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Registers type in the process-wide directory.
pub fn register<T>()
where
    T: Typed,
{
    TypeDirectory::register_global::<T>();
}
