// Core Layer: Handle table
//
// The host engine answers `spbla_Matrix_New` with an opaque pointer, as the
// native library does, but never dereferences what it receives back. The
// pointer value is a key into this table, so a freed or foreign pointer is
// reported as `InvalidArgument` instead of being followed.

use crate::core::error::{Result, SpblaError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Table<T> {
    // Key 0 is never issued, it reads back as a null pointer
    next_key: usize,
    entries: HashMap<usize, Arc<T>>,
}

/// Keyed store of engine-side objects
///
/// Keys are issued in increasing order and never reused, so a stale key
/// cannot alias an object created after it was freed.
pub struct HandleRegistry<T> {
    table: Mutex<Table<T>>,
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Table {
                next_key: 1,
                entries: HashMap::new(),
            }),
        }
    }

    fn table(&self) -> MutexGuard<'_, Table<T>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `object` under a fresh non-zero key
    pub fn insert(&self, object: T) -> usize {
        let mut table = self.table();
        let key = table.next_key;
        table.next_key += 1;
        table.entries.insert(key, Arc::new(object));
        key
    }

    /// Shared reference to the object under `key`
    pub fn get(&self, key: usize) -> Result<Arc<T>> {
        self.table()
            .entries
            .get(&key)
            .cloned()
            .ok_or(SpblaError::InvalidArgument)
    }

    /// Take the object under `key` out of the table
    ///
    /// Callers still holding an `Arc` from `get` keep it alive until they
    /// drop it.
    pub fn remove(&self, key: usize) -> Result<Arc<T>> {
        self.table()
            .entries
            .remove(&key)
            .ok_or(SpblaError::InvalidArgument)
    }

    /// Drop every stored object, returning how many were live
    pub fn clear(&self) -> usize {
        let mut table = self.table();
        let live = table.entries.len();
        table.entries.clear();
        live
    }

    pub fn contains(&self, key: usize) -> bool {
        self.table().entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().entries.is_empty()
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let matrices = HandleRegistry::<(usize, usize)>::new();

        let key = matrices.insert((3, 4));
        assert_ne!(key, 0);
        assert_eq!(*matrices.get(key).unwrap(), (3, 4));
        assert!(matrices.contains(key));

        assert_eq!(*matrices.remove(key).unwrap(), (3, 4));
        assert_eq!(matrices.get(key).unwrap_err(), SpblaError::InvalidArgument);
        assert_eq!(matrices.remove(key).unwrap_err(), SpblaError::InvalidArgument);
    }

    #[test]
    fn test_null_key_is_never_issued() {
        let matrices = HandleRegistry::<u8>::new();
        matrices.insert(1);

        assert!(!matrices.contains(0));
        assert_eq!(matrices.get(0).unwrap_err(), SpblaError::InvalidArgument);
    }

    #[test]
    fn test_keys_are_not_reused() {
        let matrices = HandleRegistry::<&str>::new();

        let first = matrices.insert("edges");
        matrices.remove(first).unwrap();
        let second = matrices.insert("labels");
        assert_ne!(first, second);
        assert!(!matrices.contains(first));
    }

    #[test]
    fn test_removed_object_outlives_outstanding_reference() {
        let matrices = HandleRegistry::<Vec<u32>>::new();
        let key = matrices.insert(vec![1, 2]);

        let held = matrices.get(key).unwrap();
        matrices.remove(key).unwrap();
        assert_eq!(*held, vec![1, 2]);
    }

    #[test]
    fn test_clear_reports_live_objects() {
        let matrices = HandleRegistry::<Vec<u32>>::new();
        matrices.insert(vec![1]);
        matrices.insert(vec![2, 3]);

        assert_eq!(matrices.len(), 2);
        assert_eq!(matrices.clear(), 2);
        assert!(matrices.is_empty());
        assert_eq!(matrices.clear(), 0);
    }
}
