use std::fmt;

use thiserror::Error;

/// Location used when the caller does not name one.
pub const DEFAULT_LOCATION: &str = "Software/SnowCode/S3BuildPublisher";

/// Errors produced by storage backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The location cannot be represented by this backend.
    #[error("invalid storage location: {location}")]
    InvalidLocation { location: String },
    /// A write was attempted through a read-only handle.
    #[error("location is open read-only: {location}")]
    ReadOnly { location: String },
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

/// Hierarchical path naming where a record's fields live.
///
/// Accepts `/` or `\` as separators; empty segments are dropped, so
/// `"a//b/"` and `"a\\b"` name the same location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageLocation {
    segments: Vec<String>,
}

impl StorageLocation {
    pub fn new(path: &str) -> Self {
        let segments = path
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl Default for StorageLocation {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION)
    }
}

impl From<&str> for StorageLocation {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// An open location. Dropping the handle closes it.
pub trait LocationHandle {
    /// Read a field; `None` when the field was never written.
    fn get_field(&self, name: &str) -> Result<Option<String>, BackendError>;

    /// Write a field, replacing any previous value.
    fn set_field(&mut self, name: &str, value: &str) -> Result<(), BackendError>;
}

/// Contract for the persistence subsystem behind a credential store.
pub trait StorageBackend {
    type Handle: LocationHandle;

    fn exists(&self, location: &StorageLocation) -> Result<bool, BackendError>;

    /// Create the location if it is absent (idempotent).
    fn create(&self, location: &StorageLocation) -> Result<(), BackendError>;

    /// Open an existing location; `None` when it does not exist.
    fn open(
        &self,
        location: &StorageLocation,
        mode: AccessMode,
    ) -> Result<Option<Self::Handle>, BackendError>;
}
