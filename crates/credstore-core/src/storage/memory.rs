use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use super::backend::{AccessMode, BackendError, LocationHandle, StorageBackend, StorageLocation};

type Fields = BTreeMap<String, String>;
type Locations = HashMap<StorageLocation, Fields>;

/// Map-backed storage for tests and smoke runs. Clones share state, so a
/// test can hand one clone to a store and inspect raw fields through another.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Locations>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the raw fields stored at a location.
    pub fn fields(&self, location: &StorageLocation) -> Option<Fields> {
        lock(&self.inner).ok()?.get(location).cloned()
    }

    /// Write a raw field, creating the location if needed.
    pub fn set_raw_field(
        &self,
        location: &StorageLocation,
        name: &str,
        value: &str,
    ) -> Result<(), BackendError> {
        lock(&self.inner)?
            .entry(location.clone())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Delete a location and its fields (idempotent).
    pub fn remove(&self, location: &StorageLocation) -> Result<(), BackendError> {
        lock(&self.inner)?.remove(location);
        Ok(())
    }
}

impl StorageBackend for InMemoryBackend {
    type Handle = InMemoryHandle;

    fn exists(&self, location: &StorageLocation) -> Result<bool, BackendError> {
        Ok(lock(&self.inner)?.contains_key(location))
    }

    fn create(&self, location: &StorageLocation) -> Result<(), BackendError> {
        lock(&self.inner)?.entry(location.clone()).or_default();
        Ok(())
    }

    fn open(
        &self,
        location: &StorageLocation,
        mode: AccessMode,
    ) -> Result<Option<InMemoryHandle>, BackendError> {
        if !self.exists(location)? {
            return Ok(None);
        }
        Ok(Some(InMemoryHandle {
            inner: Arc::clone(&self.inner),
            location: location.clone(),
            mode,
        }))
    }
}

#[derive(Debug)]
pub struct InMemoryHandle {
    inner: Arc<Mutex<Locations>>,
    location: StorageLocation,
    mode: AccessMode,
}

impl LocationHandle for InMemoryHandle {
    fn get_field(&self, name: &str) -> Result<Option<String>, BackendError> {
        let map = lock(&self.inner)?;
        Ok(map
            .get(&self.location)
            .and_then(|fields| fields.get(name))
            .cloned())
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), BackendError> {
        if self.mode == AccessMode::Read {
            return Err(BackendError::ReadOnly {
                location: self.location.to_string(),
            });
        }
        let mut map = lock(&self.inner)?;
        let fields = map
            .get_mut(&self.location)
            .ok_or_else(|| BackendError::Storage {
                reason: format!("location removed while open: {}", self.location),
            })?;
        fields.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

fn lock(inner: &Mutex<Locations>) -> Result<MutexGuard<'_, Locations>, BackendError> {
    inner.lock().map_err(|err| BackendError::Storage {
        reason: format!("lock poisoned: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_returns_none_until_created() {
        let backend = InMemoryBackend::new();
        let location = StorageLocation::new("a/b");

        assert!(backend
            .open(&location, AccessMode::Read)
            .expect("open should succeed")
            .is_none());

        backend.create(&location).expect("create should succeed");
        backend
            .create(&location)
            .expect("create again should still succeed");
        assert!(backend.exists(&location).expect("exists"));
    }

    #[test]
    fn read_handle_rejects_writes() {
        let backend = InMemoryBackend::new();
        let location = StorageLocation::new("a");
        backend.create(&location).expect("create");

        let mut handle = backend
            .open(&location, AccessMode::Read)
            .expect("open")
            .expect("location exists");
        let err = handle
            .set_field("k", "v")
            .expect_err("read handle must not write");
        assert!(matches!(err, BackendError::ReadOnly { .. }));
    }

    #[test]
    fn write_handle_round_trips_fields() {
        let backend = InMemoryBackend::new();
        let location = StorageLocation::new("a");
        backend.create(&location).expect("create");

        let mut handle = backend
            .open(&location, AccessMode::Write)
            .expect("open")
            .expect("location exists");
        handle.set_field("k", "v").expect("set");
        assert_eq!(handle.get_field("k").expect("get").as_deref(), Some("v"));
        assert_eq!(handle.get_field("missing").expect("get"), None);

        backend.remove(&location).expect("remove");
        let err = handle
            .set_field("k", "v2")
            .expect_err("location is gone");
        assert!(matches!(err, BackendError::Storage { .. }));
    }
}
